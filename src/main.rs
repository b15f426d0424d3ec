// src/main.rs
//
// Entry point of the RNA structure viewer.
// Usage examples:
//    cargo run --                                   # open the window
//    cargo run -- --config viewer.toml --debug
//    cargo run -- --no-gui --sequence GGGAAACCCAUCC \
//      --energy-window 3 \
//      --json run.json \
//      --subopt-csv subopts.csv
//
// RNAfold, RNAsubopt and RNAplot (ViennaRNA) must be on PATH; Ghostscript
// (`gs`) converts the PostScript drawing to PNG unless --no-rasterize is given.

mod app;
mod cli;
mod config;
mod error;
mod headless;
mod image_view;
mod parse;
mod plot;
mod predict;
mod report;
mod structure;
mod tools;
mod worker;

use std::process::ExitCode;

use env_logger::Env;
use log::{debug, error};

use crate::cli::parse_cli;
use crate::config::AppConfig;

fn main() -> ExitCode {
    // 1) Parse CLI
    let args = parse_cli();

    // 2) Initialize logging. If `--debug`, set RUST_LOG=debug, else default to info.
    let log_level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();
    debug!("Debug mode enabled");

    // 3) Configuration file, then command-line overrides
    let cfg = match AppConfig::load(args.config.as_deref()) {
        Ok(mut cfg) => {
            args.apply(&mut cfg);
            cfg
        }
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = cfg.validate() {
        error!("{}", e);
        return ExitCode::FAILURE;
    }

    // 4) Window or one-shot run
    let outcome = if args.no_gui {
        headless::run(&args, &cfg)
    } else {
        app::run(cfg)
    };
    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
