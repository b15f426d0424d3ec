// src/tools.rs
//
// Child-process plumbing for the external folding tools (RNAfold, RNAsubopt,
// RNAplot, and the optional PostScript rasterizer). Every tool receives its
// input on stdin; we capture stdout/stderr as text and leave the policy for
// failed runs to the caller.
//

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::{PredictError, PredictResult};

/// An executable plus the fixed flags it is always called with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl ToolSpec {
    pub fn new(program: impl Into<String>, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// Same tool with `extra` appended after the configured flags.
    pub fn with_args<I, S>(&self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut spec = self.clone();
        spec.args.extend(extra.into_iter().map(Into::into));
        spec
    }

    /// Replace `{name}` placeholders in the arguments.
    pub fn substitute(&self, vars: &[(&str, &str)]) -> Self {
        let args = self
            .args
            .iter()
            .map(|arg| {
                vars.iter().fold(arg.clone(), |acc, (name, value)| {
                    acc.replace(&format!("{{{}}}", name), value)
                })
            })
            .collect();
        Self {
            program: self.program.clone(),
            args,
        }
    }

    /// Human-readable command line, used in logs and error messages.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Resolve the program on `PATH` (or as given, if it is a path).
    pub fn locate(&self) -> Option<PathBuf> {
        which::which(&self.program).ok()
    }
}

/// What a finished tool run left behind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
    pub status: String,
}

/// Seam between the pipeline and real processes.
pub trait ToolRunner: Send {
    fn run(&self, tool: &ToolSpec, input: &str) -> PredictResult<ToolOutput>;

    /// Directory the tools run in; fixed-name files land here.
    fn work_dir(&self) -> &Path;
}

/// Runs tools as real child processes inside a working directory.
#[derive(Debug, Clone)]
pub struct SystemRunner {
    work_dir: PathBuf,
}

impl SystemRunner {
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
        }
    }
}

impl ToolRunner for SystemRunner {
    fn run(&self, tool: &ToolSpec, input: &str) -> PredictResult<ToolOutput> {
        debug!("Running `{}` in {:?}", tool.command_line(), self.work_dir);

        let mut child = Command::new(&tool.program)
            .args(&tool.args)
            .current_dir(&self.work_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| PredictError::Spawn {
                program: tool.program.clone(),
                source,
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            // A tool that exits without draining stdin closes the pipe on us.
            match stdin.write_all(input.as_bytes()) {
                Err(e) if e.kind() != ErrorKind::BrokenPipe => {
                    return Err(PredictError::io(&self.work_dir, e));
                }
                _ => {}
            }
        }

        let output = child
            .wait_with_output()
            .map_err(|e| PredictError::io(&self.work_dir, e))?;

        let result = ToolOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            success: output.status.success(),
            status: output.status.to_string(),
        };

        if !result.success {
            warn!("Error running command: {}", tool.command_line());
            warn!("{}", result.stderr.trim_end());
        }
        Ok(result)
    }

    fn work_dir(&self) -> &Path {
        &self.work_dir
    }
}
