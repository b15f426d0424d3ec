// src/predict.rs
//
// The prediction pipeline: fold → suboptimal enumeration → plot → rasterize.
// Tool failures are permissive by default (logged and attached to the result
// as warnings, processing continues on whatever stdout was captured); with
// `strict` a non-zero exit aborts the run.
//

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::Serialize;

use crate::config::{AppConfig, FilesConfig, ToolsConfig};
use crate::error::{InputError, PredictError, PredictResult};
use crate::parse::{parse_fold_output, parse_subopt_output, FoldResult, Suboptimal};
use crate::plot::{plot_structure, rasterize, PlotFiles, PlotOutcome};
use crate::structure::PairTable;
use crate::tools::{SystemRunner, ToolOutput, ToolRunner, ToolSpec};

/// Turn pasted text into a bare sequence: drop FASTA header lines and all
/// whitespace. Nothing else is checked.
pub fn normalize_sequence(raw: &str) -> Result<String, InputError> {
    let sequence: String = raw
        .lines()
        .filter(|line| !line.trim_start().starts_with('>'))
        .flat_map(str::chars)
        .filter(|c| !c.is_whitespace())
        .collect();
    if sequence.is_empty() {
        Err(InputError::Empty)
    } else {
        Ok(sequence)
    }
}

/// Everything one run produced.
#[derive(Debug, Clone, Serialize)]
pub struct Prediction {
    pub sequence: String,
    pub fold: FoldResult,
    /// `None` when the structure could not be decoded.
    pub base_pairs: Option<usize>,
    pub energy_window: f64,
    pub subopts: Vec<Suboptimal>,
    /// Plot tool output after renaming.
    pub drawing: Option<PathBuf>,
    /// File to show in the image area.
    pub image: Option<PathBuf>,
    pub warnings: Vec<String>,
}

/// Runs the external tools for one sequence at a time.
pub struct Predictor<R: ToolRunner = SystemRunner> {
    runner: R,
    tools: ToolsConfig,
    files: FilesConfig,
    energy_window: f64,
}

impl Predictor<SystemRunner> {
    /// Build a predictor running real processes in the configured work dir,
    /// creating the directory if needed.
    pub fn from_config(cfg: &AppConfig) -> PredictResult<Self> {
        let dir = &cfg.files.work_dir;
        fs::create_dir_all(dir).map_err(|e| PredictError::io(dir, e))?;
        // Absolute, so paths handed to the rasterizer stay valid inside it.
        let dir = dir.canonicalize().map_err(|e| PredictError::io(dir, e))?;
        Ok(Self::new(SystemRunner::new(dir), cfg))
    }
}

impl<R: ToolRunner> Predictor<R> {
    pub fn new(runner: R, cfg: &AppConfig) -> Self {
        Self {
            runner,
            tools: cfg.tools.clone(),
            files: cfg.files.clone(),
            energy_window: cfg.prediction.energy_window,
        }
    }

    pub fn work_dir(&self) -> &Path {
        self.runner.work_dir()
    }

    /// Tools that cannot be found on `PATH`.
    pub fn missing_tools(&self) -> Vec<String> {
        let mut tools = vec![&self.tools.fold, &self.tools.subopt, &self.tools.plot];
        let rasterizer = self.tools.rasterize.tool();
        tools.extend(rasterizer.as_ref());
        tools
            .into_iter()
            .filter(|t| t.locate().is_none())
            .map(|t| t.program.clone())
            .collect()
    }

    /// Apply the failure policy to a finished tool run.
    fn check(
        &self,
        tool: &ToolSpec,
        output: &ToolOutput,
        warnings: &mut Vec<String>,
    ) -> PredictResult<()> {
        if output.success {
            return Ok(());
        }
        if self.tools.strict {
            return Err(PredictError::ToolFailed {
                command: tool.command_line(),
                status: output.status.clone(),
                stderr: output.stderr.trim().to_string(),
            });
        }
        warnings.push(format!("`{}` exited with {}", tool.command_line(), output.status));
        Ok(())
    }

    fn invoke(
        &self,
        tool: &ToolSpec,
        input: &str,
        warnings: &mut Vec<String>,
    ) -> PredictResult<ToolOutput> {
        let output = self.runner.run(tool, input)?;
        self.check(tool, &output, warnings)?;
        Ok(output)
    }

    /// Run the whole pipeline on raw user input.
    pub fn predict(&self, raw: &str) -> PredictResult<Prediction> {
        let sequence = normalize_sequence(raw)?;
        let stdin = format!("{}\n", sequence);
        let mut warnings = Vec::new();
        info!("Predicting structure for {} nt", sequence.chars().count());

        // 1) MFE structure
        let fold_out = self.invoke(&self.tools.fold, &stdin, &mut warnings)?;
        let fold = parse_fold_output(&fold_out.stdout, &sequence)?;
        if fold.structure.is_empty() {
            warnings.push(format!("{} returned no structure", self.tools.fold.program));
        }
        let base_pairs = match PairTable::from_dot_bracket(&fold.structure) {
            Ok(pt) => {
                if !pt.is_empty() && pt.len() != sequence.chars().count() {
                    warnings.push(format!(
                        "structure length {} differs from sequence length {}",
                        pt.len(),
                        sequence.chars().count()
                    ));
                }
                Some(pt.pair_count())
            }
            Err(e) => {
                debug!("Structure not decodable: {}", e);
                None
            }
        };

        // 2) suboptimal structures within the energy window
        let subopt = self
            .tools
            .subopt
            .with_args(["-e".to_string(), self.energy_window.to_string()]);
        let subopt_out = self.invoke(&subopt, &stdin, &mut warnings)?;
        let subopts = parse_subopt_output(&subopt_out.stdout);
        debug!("{} suboptimal structures", subopts.len());

        // 3) drawing, then an image we can display
        let (drawing, image) = if fold.structure.is_empty() {
            (None, None)
        } else {
            self.draw(&sequence, &fold.structure, &mut warnings)?
        };

        for w in &warnings {
            warn!("{}", w);
        }
        Ok(Prediction {
            sequence,
            fold,
            base_pairs,
            energy_window: self.energy_window,
            subopts,
            drawing,
            image,
            warnings,
        })
    }

    fn draw(
        &self,
        sequence: &str,
        structure: &str,
        warnings: &mut Vec<String>,
    ) -> PredictResult<(Option<PathBuf>, Option<PathBuf>)> {
        let files = PlotFiles {
            input: &self.files.plot_input,
            tool_output: &self.files.plot_output,
            renamed: &self.files.plot_renamed,
        };
        let plot = plot_structure(&self.runner, &self.tools.plot, sequence, structure, &files)?;
        self.check(&self.tools.plot, &plot.output, warnings)?;
        let drawing = match plot.outcome {
            PlotOutcome::Rendered(path) => path,
            PlotOutcome::Missing(path) => {
                warnings.push(format!(
                    "{} did not produce {}",
                    self.tools.plot.program,
                    path.display()
                ));
                return Ok((None, None));
            }
        };

        let Some(tool) = self.tools.rasterize.tool() else {
            return Ok((Some(drawing.clone()), Some(drawing)));
        };
        let raster = match rasterize(&self.runner, &tool, &drawing, &self.files.image) {
            Ok(raster) => raster,
            // Rasterizing is optional; keep the results and the drawing.
            Err(PredictError::Spawn { program, source }) => {
                warnings.push(format!(
                    "{} not available ({}), image not rasterized",
                    program, source
                ));
                return Ok((Some(drawing), None));
            }
            Err(e) => return Err(e),
        };
        self.check(&tool, &raster.output, warnings)?;
        let image = match raster.outcome {
            PlotOutcome::Rendered(path) => Some(path),
            PlotOutcome::Missing(path) => {
                warnings.push(format!("{} did not produce {}", tool.program, path.display()));
                None
            }
        };
        Ok((Some(drawing), image))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Canned tool outputs keyed by program name.
    struct FakeRunner {
        dir: tempfile::TempDir,
        outputs: HashMap<String, ToolOutput>,
        /// program → file it "writes" into the work dir
        creates: HashMap<String, String>,
        calls: Mutex<Vec<String>>,
        /// programs that fail to start
        absent: Vec<String>,
    }

    impl FakeRunner {
        fn new() -> Self {
            Self {
                dir: tempfile::tempdir().unwrap(),
                outputs: HashMap::new(),
                creates: HashMap::new(),
                calls: Mutex::new(Vec::new()),
                absent: Vec::new(),
            }
        }

        fn respond(mut self, program: &str, stdout: &str, success: bool) -> Self {
            self.outputs.insert(
                program.to_string(),
                ToolOutput {
                    stdout: stdout.to_string(),
                    stderr: if success { String::new() } else { "failed".into() },
                    success,
                    status: if success { "exit status: 0" } else { "exit status: 1" }.into(),
                },
            );
            self
        }

        fn creating(mut self, program: &str, file: &str) -> Self {
            self.creates.insert(program.to_string(), file.to_string());
            self
        }

        fn without(mut self, program: &str) -> Self {
            self.absent.push(program.to_string());
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl ToolRunner for FakeRunner {
        fn run(&self, tool: &ToolSpec, _input: &str) -> PredictResult<ToolOutput> {
            self.calls.lock().unwrap().push(tool.command_line());
            if self.absent.contains(&tool.program) {
                return Err(PredictError::Spawn {
                    program: tool.program.clone(),
                    source: std::io::ErrorKind::NotFound.into(),
                });
            }
            if let Some(file) = self.creates.get(&tool.program) {
                fs::write(self.dir.path().join(file), "%!PS-Adobe-3.0 EPSF-3.0").unwrap();
            }
            Ok(self.outputs.get(&tool.program).cloned().unwrap_or(ToolOutput {
                success: true,
                status: "exit status: 0".into(),
                ..ToolOutput::default()
            }))
        }

        fn work_dir(&self) -> &Path {
            self.dir.path()
        }
    }

    fn config(rasterize: bool, strict: bool) -> AppConfig {
        let mut cfg = AppConfig::default();
        cfg.tools.rasterize.enabled = rasterize;
        cfg.tools.strict = strict;
        cfg
    }

    fn vienna_runner() -> FakeRunner {
        FakeRunner::new()
            .respond("RNAfold", "GGGAAACCC\n(((...))) ( -1.20)\n", true)
            .respond(
                "RNAsubopt",
                "GGGAAACCC  -1.20   5.00\n(((...)))  -1.20\n.........   0.00\nbroken line here\n",
                true,
            )
            .creating("RNAplot", "rna.ps")
    }

    #[test]
    fn normalize_trims_and_strips_header() {
        assert_eq!(normalize_sequence("  GCAU \n").unwrap(), "GCAU");
        assert_eq!(
            normalize_sequence(">my rna\nGGGAA\nACCC\n").unwrap(),
            "GGGAAACCC"
        );
        assert_eq!(normalize_sequence(" \n\t"), Err(InputError::Empty));
        assert_eq!(normalize_sequence(">header only\n"), Err(InputError::Empty));
    }

    #[test]
    fn normalize_drops_every_header_line() {
        assert_eq!(normalize_sequence(">a\nGG\n>b\nCC").unwrap(), "GGCC");
        assert_eq!(normalize_sequence("GG\n  >b\nCC\n").unwrap(), "GGCC");
    }

    #[test]
    fn empty_sequence_runs_no_tools() {
        let predictor = Predictor::new(vienna_runner(), &config(false, false));
        let err = predictor.predict("   \n").unwrap_err();
        assert!(matches!(err, PredictError::Input(InputError::Empty)));
        assert!(predictor.runner.calls().is_empty());
    }

    #[test]
    fn full_pipeline_collects_results() {
        let predictor = Predictor::new(vienna_runner(), &config(false, false));
        let p = predictor.predict("GGGAAACCC").unwrap();

        assert_eq!(p.fold.structure, "(((...)))");
        assert_relative_eq!(p.fold.mfe, -1.20);
        assert_eq!(p.base_pairs, Some(3));
        assert_eq!(p.subopts.len(), 2);
        assert_eq!(p.subopts[1].structure, ".........");
        let drawing = predictor.work_dir().join("rna_structure.ps");
        assert_eq!(p.drawing.as_deref(), Some(drawing.as_path()));
        assert_eq!(p.image.as_deref(), Some(drawing.as_path()));
        assert!(p.warnings.is_empty());
        assert_eq!(
            predictor.runner.calls(),
            vec!["RNAfold --noPS", "RNAsubopt -e 5", "RNAplot"]
        );
        assert_eq!(
            fs::read_to_string(predictor.work_dir().join("rna_plot_input.txt")).unwrap(),
            "GGGAAACCC\n(((...)))\n"
        );
    }

    #[test]
    fn energy_window_is_passed_to_subopt() {
        let mut cfg = config(false, false);
        cfg.prediction.energy_window = 2.5;
        let predictor = Predictor::new(vienna_runner(), &cfg);
        predictor.predict("GGGAAACCC").unwrap();
        assert!(predictor.runner.calls().contains(&"RNAsubopt -e 2.5".to_string()));
    }

    #[test]
    fn failed_fold_degrades_with_warning() {
        let runner = vienna_runner().respond("RNAfold", "", false);
        let predictor = Predictor::new(runner, &config(false, false));
        let p = predictor.predict("GGGAAACCC").unwrap();

        assert_eq!(p.fold, FoldResult::default());
        assert_eq!(p.drawing, None);
        assert_eq!(p.image, None);
        assert_eq!(p.warnings.len(), 2);
        assert!(p.warnings[0].contains("RNAfold --noPS"));
        // no structure, nothing to plot
        assert!(!predictor.runner.calls().iter().any(|c| c == "RNAplot"));
    }

    #[test]
    fn strict_mode_turns_exit_status_into_error() {
        let runner = vienna_runner().respond("RNAsubopt", "", false);
        let predictor = Predictor::new(runner, &config(false, true));
        let err = predictor.predict("GGGAAACCC").unwrap_err();
        match err {
            PredictError::ToolFailed { command, stderr, .. } => {
                assert_eq!(command, "RNAsubopt -e 5");
                assert_eq!(stderr, "failed");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_plot_output_is_a_warning() {
        let runner = FakeRunner::new()
            .respond("RNAfold", "GGGAAACCC\n(((...))) ( -1.20)\n", true)
            .respond("RNAsubopt", "", true);
        let predictor = Predictor::new(runner, &config(false, false));
        let p = predictor.predict("GGGAAACCC").unwrap();

        assert_eq!(p.image, None);
        assert_eq!(p.warnings.len(), 1);
        assert!(p.warnings[0].contains("rna.ps"));
        assert!(!predictor.work_dir().join("rna_structure.ps").exists());
    }

    #[test]
    fn rasterizer_output_becomes_the_image() {
        let runner = vienna_runner().creating("gs", "rna_structure.png");
        let predictor = Predictor::new(runner, &config(true, false));
        let p = predictor.predict("GGGAAACCC").unwrap();

        let image = predictor.work_dir().join("rna_structure.png");
        assert_eq!(p.image.as_deref(), Some(image.as_path()));
        assert!(p.drawing.is_some());
        assert_eq!(predictor.runner.calls().len(), 4);
    }

    #[test]
    fn rasterizer_without_output_leaves_drawing_only() {
        let predictor = Predictor::new(vienna_runner(), &config(true, false));
        let p = predictor.predict("GGGAAACCC").unwrap();

        assert!(p.drawing.is_some());
        assert_eq!(p.image, None);
        assert!(p.warnings[0].starts_with("gs did not produce"));
    }

    #[test]
    fn missing_rasterizer_keeps_results() {
        let runner = vienna_runner().without("gs");
        let predictor = Predictor::new(runner, &config(true, false));
        let p = predictor.predict("GGGAAACCC").unwrap();

        assert_eq!(p.fold.structure, "(((...)))");
        assert_relative_eq!(p.fold.mfe, -1.20);
        assert_eq!(p.subopts.len(), 2);
        let drawing = predictor.work_dir().join("rna_structure.ps");
        assert_eq!(p.drawing.as_deref(), Some(drawing.as_path()));
        assert_eq!(p.image, None);
        assert_eq!(p.warnings.len(), 1);
        assert!(p.warnings[0].starts_with("gs not available"));
    }

    #[test]
    fn missing_fold_tool_is_still_an_error() {
        let runner = vienna_runner().without("RNAfold");
        let predictor = Predictor::new(runner, &config(true, false));
        let err = predictor.predict("GGGAAACCC").unwrap_err();
        assert!(matches!(err, PredictError::Spawn { ref program, .. } if program == "RNAfold"));
    }
}
