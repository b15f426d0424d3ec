// src/report.rs
//
// Presenting a finished prediction: the text shown in the result box, a JSON
// run record, and a CSV export of the suboptimal structures.
//

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::Local;
use serde::Serialize;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::{PredictError, PredictResult};
use crate::predict::Prediction;

/// Text for the read-only result box.
pub fn format_report(p: &Prediction) -> String {
    let mut out = String::new();
    out.push_str(&format!("Predicted Secondary Structure: {}\n", p.fold.structure));
    out.push_str(&format!(
        "Minimum Free Energy (MFE): {:.2} kcal/mol\n\n",
        p.fold.mfe
    ));
    out.push_str(&format!(
        "Suboptimal Structures within {} kcal/mol:\n",
        p.energy_window
    ));
    for s in &p.subopts {
        out.push_str(&format!(
            "Structure: {}, Energy: {:.2} kcal/mol\n",
            s.structure, s.energy
        ));
    }
    out
}

/// Build a metadata object for one run
pub fn build_run_record(p: &Prediction, cfg: &AppConfig) -> serde_json::Value {
    let run_id = Uuid::new_v4();
    serde_json::json!({
        "run_id": run_id.to_string(),
        "timestamp": Local::now().to_rfc3339(),
        "parameters": {
            "fold": cfg.tools.fold.command_line(),
            "subopt": cfg.tools.subopt.command_line(),
            "plot": cfg.tools.plot.command_line(),
            "rasterize": cfg.tools.rasterize.tool().map(|t| t.command_line()),
            "strict": cfg.tools.strict,
            "energy_window": cfg.prediction.energy_window,
            "work_dir": cfg.files.work_dir,
        },
        "result": p,
    })
}

pub fn save_run_record(path: &Path, record: &serde_json::Value) -> PredictResult<()> {
    let f = File::create(path).map_err(|e| PredictError::io(path, e))?;
    let mut writer = BufWriter::new(f);
    serde_json::to_writer_pretty(&mut writer, record)
        .map_err(|e| PredictError::io(path, e.into()))?;
    writer.flush().map_err(|e| PredictError::io(path, e))
}

#[derive(Debug, Serialize)]
struct SuboptRow<'a> {
    rank: usize,
    structure: &'a str,
    energy: f64,
    /// energy above the MFE
    delta: f64,
}

/// Save the suboptimal list as CSV with the sequence and MFE in a comment line
pub fn save_subopts_csv(path: &Path, p: &Prediction) -> PredictResult<()> {
    let file = File::create(path).map_err(|e| PredictError::io(path, e))?;
    let mut writer = BufWriter::new(file);

    writeln!(
        writer,
        "# sequence: {} mfe: {:.2} structure: {}",
        p.sequence, p.fold.mfe, p.fold.structure
    )
    .map_err(|e| PredictError::io(path, e))?;

    let mut wtr = csv::Writer::from_writer(writer);
    for (i, s) in p.subopts.iter().enumerate() {
        wtr.serialize(SuboptRow {
            rank: i + 1,
            structure: &s.structure,
            energy: s.energy,
            delta: s.energy - p.fold.mfe,
        })
        .map_err(|e| PredictError::io(path, e.into()))?;
    }
    wtr.flush().map_err(|e| PredictError::io(path, e))?;
    Ok(())
}
