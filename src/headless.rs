// src/headless.rs
//
// `--no-gui`: run the same pipeline once, print the report to stdout and
// optionally write the JSON run record and the suboptimal CSV.
//

use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};

use crate::cli::Cli;
use crate::config::AppConfig;
use crate::error::{PredictError, PredictResult};
use crate::predict::{Prediction, Predictor};
use crate::report::{build_run_record, format_report, save_run_record, save_subopts_csv};
use crate::tools::ToolRunner;

/// Optional files written after a headless run.
#[derive(Debug, Clone, Default)]
pub struct Exports {
    pub json: Option<PathBuf>,
    pub subopt_csv: Option<PathBuf>,
}

pub fn run(cli: &Cli, cfg: &AppConfig) -> PredictResult<()> {
    let input = match &cli.sequence {
        Some(seq) => seq.clone(),
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| PredictError::io("<stdin>", e))?;
            buf
        }
    };

    let predictor = Predictor::from_config(cfg)?;
    debug!("Working directory: {:?}", predictor.work_dir());
    let missing = predictor.missing_tools();
    if !missing.is_empty() {
        warn!("Not found on PATH: {}", missing.join(", "));
    }

    let exports = Exports {
        json: cli.json.clone(),
        subopt_csv: cli.subopt_csv.clone(),
    };
    let stdout = io::stdout();
    execute(&predictor, &input, cfg, &exports, &mut stdout.lock())?;
    Ok(())
}

/// Predict, print the report to `out`, and write the requested exports.
pub fn execute<R: ToolRunner>(
    predictor: &Predictor<R>,
    input: &str,
    cfg: &AppConfig,
    exports: &Exports,
    out: &mut dyn Write,
) -> PredictResult<Prediction> {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner} {msg} [{elapsed}]") {
        pb.set_style(style);
    }
    pb.set_message("Running folding tools");
    pb.enable_steady_tick(Duration::from_millis(100));
    let result = predictor.predict(input);
    pb.finish_and_clear();
    let prediction = result?;

    let stdout_err = |e| PredictError::io("<stdout>", e);
    write!(out, "{}", format_report(&prediction)).map_err(stdout_err)?;
    if let Some(path) = &prediction.image {
        writeln!(out, "\nStructure image: {}", path.display()).map_err(stdout_err)?;
    } else if let Some(path) = &prediction.drawing {
        writeln!(out, "\nStructure drawing: {}", path.display()).map_err(stdout_err)?;
    }

    if let Some(path) = &exports.json {
        save_run_record(path, &build_run_record(&prediction, cfg))?;
        info!("Run record saved to {:?}", path);
    }
    if let Some(path) = &exports.subopt_csv {
        save_subopts_csv(path, &prediction)?;
        info!("Suboptimal structures saved to {:?}", path);
    }
    Ok(prediction)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::tools::{SystemRunner, ToolSpec};
    use std::fs;

    fn scripted_config() -> AppConfig {
        let mut cfg = AppConfig::default();
        cfg.tools.fold = ToolSpec::new(
            "sh",
            &["-c", "cat >/dev/null; printf '%s\\n' 'GCAU' '((..)) (-1.20)'"],
        );
        cfg.tools.subopt = ToolSpec::new(
            "sh",
            &["-c", "cat >/dev/null; printf '%s\\n' '((..)) -1.20' '((.).) -0.50' 'malformed'"],
        );
        cfg.tools.plot = ToolSpec::new("sh", &["-c", "cat > rna.ps"]);
        cfg.tools.rasterize.enabled = false;
        cfg
    }

    #[test]
    fn prints_report_and_writes_exports() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = scripted_config();
        let predictor = Predictor::new(SystemRunner::new(dir.path()), &cfg);
        let exports = Exports {
            json: Some(dir.path().join("run.json")),
            subopt_csv: Some(dir.path().join("subopts.csv")),
        };
        let mut out = Vec::new();

        let p = execute(&predictor, "GCAU\n", &cfg, &exports, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Predicted Secondary Structure: ((..))\n"));
        assert!(text.contains("Structure: ((.).), Energy: -0.50 kcal/mol\n"));
        assert!(text.contains("Structure image: "));
        assert_eq!(p.subopts.len(), 2);

        let record: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join("run.json")).unwrap())
                .unwrap();
        assert_eq!(record["result"]["fold"]["mfe"], -1.2);
        let csv = fs::read_to_string(dir.path().join("subopts.csv")).unwrap();
        assert_eq!(csv.lines().count(), 4);
    }

    #[test]
    fn empty_input_fails_before_any_tool() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = scripted_config();
        let predictor = Predictor::new(SystemRunner::new(dir.path()), &cfg);
        let mut out = Vec::new();

        let err = execute(&predictor, "\n", &cfg, &Exports::default(), &mut out).unwrap_err();
        assert!(matches!(err, PredictError::Input(_)));
        assert!(out.is_empty());
        assert!(!dir.path().join("rna_plot_input.txt").exists());
    }
}
