// src/error.rs
//
// Error types shared by the prediction pipeline, the worker and the GUI.
//

use std::path::PathBuf;

use thiserror::Error;

/// Problems with the sequence typed or pasted by the user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("Please enter an RNA sequence.")]
    Empty,
}

/// Everything that can stop a prediction run.
#[derive(Error, Debug)]
pub enum PredictError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error("could not start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {status}: {stderr}")]
    ToolFailed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("cannot parse {what} from tool output: {detail}")]
    Parse { what: &'static str, detail: String },

    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot load image {path:?}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("could not start prediction worker: {0}")]
    WorkerSpawn(#[source] std::io::Error),

    #[error("a prediction is already running")]
    WorkerBusy,

    #[error("prediction worker is not running")]
    WorkerGone,

    #[error("window error: {0}")]
    Gui(String),
}

impl PredictError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PredictError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result alias for pipeline operations
pub type PredictResult<T> = Result<T, PredictError>;
