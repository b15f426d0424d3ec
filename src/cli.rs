// src/cli.rs

use std::path::PathBuf;

use clap::Parser;

use crate::config::AppConfig;

/// RNA Secondary Structure Prediction Command-Line Arguments
#[derive(Parser, Debug)]
#[command(
    name = "rnafold-viewer",
    version,
    about = "Predict RNA secondary structure with RNAfold/RNAsubopt/RNAplot and show the result."
)]
pub struct Cli {
    // ----------------------
    // Configuration
    // ----------------------
    /// TOML configuration file (tools, file names, display size)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory for the plot input file and drawings
    #[arg(long)]
    pub work_dir: Option<PathBuf>,

    /// Energy window above the MFE for suboptimal structures (kcal/mol)
    #[arg(long)]
    pub energy_window: Option<f64>,

    /// Fail when a tool exits with a non-zero status instead of warning
    #[arg(long, default_value_t = false)]
    pub strict: bool,

    /// Keep the PostScript drawing and skip PNG conversion
    #[arg(long, default_value_t = false)]
    pub no_rasterize: bool,

    // ----------------------
    // Headless Mode
    // ----------------------
    /// Print the report to stdout instead of opening a window
    #[arg(long, default_value_t = false)]
    pub no_gui: bool,

    /// Sequence to fold with --no-gui (read from stdin when omitted)
    #[arg(long)]
    pub sequence: Option<String>,

    /// Write a JSON run record to this path (--no-gui)
    #[arg(long)]
    pub json: Option<PathBuf>,

    /// Write the suboptimal structures as CSV to this path (--no-gui)
    #[arg(long)]
    pub subopt_csv: Option<PathBuf>,

    // ----------------------
    // Misc / Debug
    // ----------------------
    /// Enable debug logging
    #[arg(long, default_value_t = false)]
    pub debug: bool,
}

impl Cli {
    /// Command-line values take precedence over the config file.
    pub fn apply(&self, cfg: &mut AppConfig) {
        if let Some(dir) = &self.work_dir {
            cfg.files.work_dir = dir.clone();
        }
        if let Some(window) = self.energy_window {
            cfg.prediction.energy_window = window;
        }
        if self.strict {
            cfg.tools.strict = true;
        }
        if self.no_rasterize {
            cfg.tools.rasterize.enabled = false;
        }
    }
}

/// Helper to parse arguments from CLI.
pub fn parse_cli() -> Cli {
    Cli::parse()
}
