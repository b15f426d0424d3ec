// src/plot.rs
//
// Structure drawing via the external plot tool. RNAplot reads a sequence and a
// dot-bracket structure on stdin and always writes its drawing to a fixed name
// (`rna.ps`) in the working directory; we move that file to the name the rest
// of the program looks for, and optionally rasterize it for display.
//

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::error::{PredictError, PredictResult};
use crate::tools::{ToolOutput, ToolRunner, ToolSpec};

/// Whether a plotting step left a file behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlotOutcome {
    Rendered(PathBuf),
    /// The tool ran but its expected output file never appeared.
    Missing(PathBuf),
}

/// Result of one plotting step together with the raw tool output.
#[derive(Debug, Clone)]
pub struct PlotRun {
    pub outcome: PlotOutcome,
    pub output: ToolOutput,
}

/// File names used by [`plot_structure`], relative to the runner's work dir.
#[derive(Debug, Clone)]
pub struct PlotFiles<'a> {
    pub input: &'a Path,
    pub tool_output: &'a Path,
    pub renamed: &'a Path,
}

/// Move `from` to `to` if it exists. Returns whether anything was moved.
pub fn rename_if_exists(from: &Path, to: &Path) -> PredictResult<bool> {
    match fs::rename(from, to) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(PredictError::io(from, e)),
    }
}

fn remove_stale(path: &Path) -> PredictResult<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != ErrorKind::NotFound => Err(PredictError::io(path, e)),
        _ => Ok(()),
    }
}

/// Write the two-line plot input, run the plot tool on it and move its output.
pub fn plot_structure<R: ToolRunner + ?Sized>(
    runner: &R,
    tool: &ToolSpec,
    sequence: &str,
    structure: &str,
    files: &PlotFiles<'_>,
) -> PredictResult<PlotRun> {
    let work_dir = runner.work_dir();
    let input_path = work_dir.join(files.input);
    let input = format!("{}\n{}\n", sequence, structure);
    fs::write(&input_path, &input).map_err(|e| PredictError::io(&input_path, e))?;
    debug!("Plot input written to {:?}", input_path);

    let output = runner.run(tool, &input)?;

    let produced = work_dir.join(files.tool_output);
    let target = work_dir.join(files.renamed);
    let outcome = if rename_if_exists(&produced, &target)? {
        debug!("Moved {:?} to {:?}", produced, target);
        PlotOutcome::Rendered(target)
    } else {
        warn!("{} produced no {:?}", tool.program, produced);
        PlotOutcome::Missing(produced)
    };
    Ok(PlotRun { outcome, output })
}

/// Convert a drawing to a raster image with `tool`, whose `{input}` and
/// `{output}` placeholders receive the two paths.
pub fn rasterize<R: ToolRunner + ?Sized>(
    runner: &R,
    tool: &ToolSpec,
    drawing: &Path,
    image: &Path,
) -> PredictResult<PlotRun> {
    let target = runner.work_dir().join(image);
    // An old image must not be mistaken for this run's result.
    remove_stale(&target)?;

    let input = drawing.to_string_lossy().into_owned();
    let output_path = target.to_string_lossy().into_owned();
    let tool = tool.substitute(&[("input", input.as_str()), ("output", output_path.as_str())]);
    let output = runner.run(&tool, "")?;

    let outcome = if target.exists() {
        PlotOutcome::Rendered(target)
    } else {
        warn!("{} produced no {:?}", tool.program, target);
        PlotOutcome::Missing(target)
    };
    Ok(PlotRun { outcome, output })
}
