// src/config.rs
//
// Tool names, file names and display sizes. Everything has a default, so the
// TOML file is optional and may set any subset of keys; command-line flags are
// applied on top in `main`.
//

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PredictError, PredictResult};
use crate::tools::ToolSpec;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Treat a non-zero exit status as a failed run instead of a warning.
    #[serde(default)]
    pub strict: bool,
    #[serde(default = "ToolsConfig::default_fold")]
    pub fold: ToolSpec,
    #[serde(default = "ToolsConfig::default_subopt")]
    pub subopt: ToolSpec,
    #[serde(default = "ToolsConfig::default_plot")]
    pub plot: ToolSpec,
    #[serde(default)]
    pub rasterize: RasterizeConfig,
}

impl ToolsConfig {
    fn default_fold() -> ToolSpec {
        ToolSpec::new("RNAfold", &["--noPS"])
    }
    fn default_subopt() -> ToolSpec {
        ToolSpec::new("RNAsubopt", &[])
    }
    fn default_plot() -> ToolSpec {
        ToolSpec::new("RNAplot", &[])
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            strict: false,
            fold: Self::default_fold(),
            subopt: Self::default_subopt(),
            plot: Self::default_plot(),
            rasterize: RasterizeConfig::default(),
        }
    }
}

/// PostScript → PNG conversion. `{input}` and `{output}` are substituted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RasterizeConfig {
    #[serde(default = "RasterizeConfig::default_enabled")]
    pub enabled: bool,
    #[serde(default = "RasterizeConfig::default_program")]
    pub program: String,
    #[serde(default = "RasterizeConfig::default_args")]
    pub args: Vec<String>,
}

impl RasterizeConfig {
    fn default_enabled() -> bool {
        true
    }
    fn default_program() -> String {
        "gs".to_string()
    }
    fn default_args() -> Vec<String> {
        [
            "-q",
            "-dSAFER",
            "-dBATCH",
            "-dNOPAUSE",
            "-dEPSCrop",
            "-sDEVICE=png16m",
            "-r150",
            "-sOutputFile={output}",
            "{input}",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    pub fn tool(&self) -> Option<ToolSpec> {
        self.enabled.then(|| ToolSpec {
            program: self.program.clone(),
            args: self.args.clone(),
        })
    }
}

impl Default for RasterizeConfig {
    fn default() -> Self {
        Self {
            enabled: Self::default_enabled(),
            program: Self::default_program(),
            args: Self::default_args(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionConfig {
    /// Energy window above the MFE for suboptimal structures, kcal/mol.
    #[serde(default = "PredictionConfig::default_energy_window")]
    pub energy_window: f64,
}

impl PredictionConfig {
    fn default_energy_window() -> f64 {
        5.0
    }
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            energy_window: Self::default_energy_window(),
        }
    }
}

/// Fixed-name files; relative names are resolved against `work_dir`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilesConfig {
    #[serde(default = "FilesConfig::default_work_dir")]
    pub work_dir: PathBuf,
    #[serde(default = "FilesConfig::default_plot_input")]
    pub plot_input: PathBuf,
    /// Name the plot tool writes its drawing to.
    #[serde(default = "FilesConfig::default_plot_output")]
    pub plot_output: PathBuf,
    /// Where the plot tool's drawing is moved after each run.
    #[serde(default = "FilesConfig::default_plot_renamed")]
    pub plot_renamed: PathBuf,
    /// Raster image shown in the window when rasterization is enabled.
    #[serde(default = "FilesConfig::default_image")]
    pub image: PathBuf,
}

impl FilesConfig {
    fn default_work_dir() -> PathBuf {
        PathBuf::from(".")
    }
    fn default_plot_input() -> PathBuf {
        PathBuf::from("rna_plot_input.txt")
    }
    fn default_plot_output() -> PathBuf {
        PathBuf::from("rna.ps")
    }
    fn default_plot_renamed() -> PathBuf {
        PathBuf::from("rna_structure.ps")
    }
    fn default_image() -> PathBuf {
        PathBuf::from("rna_structure.png")
    }
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            work_dir: Self::default_work_dir(),
            plot_input: Self::default_plot_input(),
            plot_output: Self::default_plot_output(),
            plot_renamed: Self::default_plot_renamed(),
            image: Self::default_image(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "DisplayConfig::default_image_width")]
    pub image_width: u32,
    #[serde(default = "DisplayConfig::default_image_height")]
    pub image_height: u32,
    #[serde(default = "DisplayConfig::default_window_width")]
    pub window_width: f32,
    #[serde(default = "DisplayConfig::default_window_height")]
    pub window_height: f32,
}

impl DisplayConfig {
    fn default_image_width() -> u32 {
        400
    }
    fn default_image_height() -> u32 {
        300
    }
    fn default_window_width() -> f32 {
        800.0
    }
    fn default_window_height() -> f32 {
        600.0
    }

    pub fn image_size(&self) -> [u32; 2] {
        [self.image_width, self.image_height]
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            image_width: Self::default_image_width(),
            image_height: Self::default_image_height(),
            window_width: Self::default_window_width(),
            window_height: Self::default_window_height(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub tools: ToolsConfig,
    #[serde(default)]
    pub prediction: PredictionConfig,
    #[serde(default)]
    pub files: FilesConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

impl AppConfig {
    /// Read a TOML file, or fall back to defaults when no path is given.
    pub fn load(path: Option<&Path>) -> PredictResult<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(path).map_err(|e| PredictError::io(path, e))?;
        let cfg: AppConfig = toml::from_str(&text)
            .map_err(|e| PredictError::Config(format!("{}: {}", path.display(), e)))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> PredictResult<()> {
        let w = self.prediction.energy_window;
        if !w.is_finite() || w < 0.0 {
            return Err(PredictError::Config(format!(
                "energy_window must be a non-negative number, got {}",
                w
            )));
        }
        if self.display.image_width == 0 || self.display.image_height == 0 {
            return Err(PredictError::Config(
                "image_width and image_height must be positive".to_string(),
            ));
        }
        let (ww, wh) = (self.display.window_width, self.display.window_height);
        if !(ww.is_finite() && wh.is_finite() && ww > 0.0 && wh > 0.0) {
            return Err(PredictError::Config(format!(
                "window size must be positive, got {}x{}",
                ww, wh
            )));
        }
        let rasterizer = self.tools.rasterize.tool();
        let tools = [&self.tools.fold, &self.tools.subopt, &self.tools.plot]
            .into_iter()
            .chain(rasterizer.as_ref());
        for tool in tools {
            if tool.program.trim().is_empty() {
                return Err(PredictError::Config("tool program must not be empty".into()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_vienna_invocations() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.tools.fold.command_line(), "RNAfold --noPS");
        assert_eq!(cfg.tools.subopt.program, "RNAsubopt");
        assert_eq!(cfg.tools.plot.program, "RNAplot");
        assert_eq!(cfg.prediction.energy_window, 5.0);
        assert_eq!(cfg.files.plot_input, PathBuf::from("rna_plot_input.txt"));
        assert_eq!(cfg.files.plot_output, PathBuf::from("rna.ps"));
        assert_eq!(cfg.display.image_size(), [400, 300]);
        assert!(!cfg.tools.strict);
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("viewer.toml");
        fs::write(
            &path,
            r#"
[tools]
strict = true

[tools.fold]
program = "/opt/vienna/bin/RNAfold"
args = ["--noPS", "-T", "25"]

[tools.rasterize]
enabled = false

[prediction]
energy_window = 2.5
"#,
        )
        .unwrap();

        let cfg = AppConfig::load(Some(&path)).unwrap();
        assert!(cfg.tools.strict);
        assert_eq!(cfg.tools.fold.command_line(), "/opt/vienna/bin/RNAfold --noPS -T 25");
        assert_eq!(cfg.tools.subopt.program, "RNAsubopt");
        assert!(cfg.tools.rasterize.tool().is_none());
        assert_eq!(cfg.prediction.energy_window, 2.5);
        assert_eq!(cfg.files.image, PathBuf::from("rna_structure.png"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = AppConfig::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, PredictError::Io { .. }));
    }

    #[test]
    fn negative_energy_window_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "[prediction]\nenergy_window = -1.0\n").unwrap();
        let err = AppConfig::load(Some(&path)).unwrap_err();
        assert!(matches!(err, PredictError::Config(_)));
    }

    #[test]
    fn enabled_rasterizer_needs_a_program() {
        let mut cfg = AppConfig::default();
        cfg.tools.rasterize.program = " ".into();
        assert!(matches!(cfg.validate(), Err(PredictError::Config(_))));

        cfg.tools.rasterize.enabled = false;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn bad_window_size_is_rejected() {
        let mut cfg = AppConfig::default();
        cfg.display.window_width = 0.0;
        assert!(matches!(cfg.validate(), Err(PredictError::Config(_))));

        cfg.display.window_width = 800.0;
        cfg.display.window_height = f32::NAN;
        assert!(matches!(cfg.validate(), Err(PredictError::Config(_))));
    }

    #[test]
    fn rasterize_placeholders_survive_round_trip() {
        let cfg = AppConfig::default();
        let text = toml::to_string_pretty(&cfg).unwrap();
        let back: AppConfig = toml::from_str(&text).unwrap();
        let tool = back.tools.rasterize.tool().unwrap();
        assert!(tool.args.iter().any(|a| a == "{input}"));
    }
}
