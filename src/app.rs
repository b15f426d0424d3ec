// src/app.rs
//
// The window: sequence input, Predict button, read-only result text and the
// structure image. Predictions run on the worker thread; `update` drains its
// events every frame and the worker wakes us up with `request_repaint`.
//

use std::path::Path;

use egui::{Align2, Button, ColorImage, ScrollArea, TextEdit, TextStyle, TextureHandle, TextureOptions};
use log::{debug, error, info};

use crate::config::{AppConfig, DisplayConfig};
use crate::error::{PredictError, PredictResult};
use crate::image_view::load_display_image;
use crate::predict::{normalize_sequence, Prediction, Predictor};
use crate::report::format_report;
use crate::worker::{PredictionWorker, WorkerEvent};

pub const WINDOW_TITLE: &str = "RNA Secondary Structure Prediction";

/// Everything the window shows, independent of the rendering backend.
#[derive(Default)]
pub struct AppState {
    pub sequence: String,
    pub report: String,
    pub status: String,
    /// Message for the modal error dialog.
    pub dialog: Option<String>,
    /// Job currently running on the worker.
    pub pending: Option<u64>,
    pub image: Option<TextureHandle>,
    /// Shown in the image area when the last image could not be loaded.
    pub image_note: Option<String>,
}

impl AppState {
    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    /// Validate the input for a new run. On failure the error dialog is set
    /// and `None` returned.
    pub fn take_request(&mut self) -> Option<String> {
        if self.is_busy() {
            return None;
        }
        match normalize_sequence(&self.sequence) {
            Ok(seq) => Some(seq),
            Err(e) => {
                self.dialog = Some(e.to_string());
                None
            }
        }
    }

    /// Record a finished run; returns the image to display, if one was made.
    pub fn finish(&mut self, result: PredictResult<Prediction>) -> Option<std::path::PathBuf> {
        self.pending = None;
        match result {
            Ok(p) => {
                self.report = format_report(&p);
                self.status = summary(&p);
                p.image
            }
            Err(e) => {
                error!("Prediction failed: {}", e);
                self.status = "Prediction failed.".to_string();
                self.dialog = Some(e.to_string());
                None
            }
        }
    }
}

fn summary(p: &Prediction) -> String {
    let mut parts = vec![format!("{} nt", p.sequence.chars().count())];
    if let Some(n) = p.base_pairs {
        parts.push(format!("{} base pairs", n));
    }
    parts.push(format!("{} suboptimal structures", p.subopts.len()));
    let mut text = parts.join(", ");
    if !p.warnings.is_empty() {
        text.push_str(" | ");
        text.push_str(&p.warnings.join("; "));
    }
    text
}

pub struct App {
    state: AppState,
    worker: PredictionWorker,
    display: DisplayConfig,
}

impl App {
    pub fn new(cc: &eframe::CreationContext<'_>, cfg: AppConfig) -> PredictResult<Self> {
        let predictor = Predictor::from_config(&cfg)?;
        info!("Working directory: {:?}", predictor.work_dir());
        let missing = predictor.missing_tools();
        let status = if missing.is_empty() {
            "Ready.".to_string()
        } else {
            format!("Not found on PATH: {}", missing.join(", "))
        };
        info!("{}", status);

        let ctx = cc.egui_ctx.clone();
        let worker = PredictionWorker::spawn(predictor, move || ctx.request_repaint())?;

        Ok(Self {
            state: AppState {
                status,
                ..AppState::default()
            },
            worker,
            display: cfg.display,
        })
    }

    fn on_predict_click(&mut self) {
        let Some(sequence) = self.state.take_request() else {
            return;
        };
        match self.worker.submit(sequence) {
            Ok(id) => {
                self.state.pending = Some(id);
                self.state.status = "Running folding tools...".to_string();
            }
            Err(e) => self.state.dialog = Some(e.to_string()),
        }
    }

    fn drain_events(&mut self, ctx: &egui::Context) {
        loop {
            match self.worker.poll() {
                Ok(Some(WorkerEvent::Finished { id, result })) => {
                    if self.state.pending != Some(id) {
                        debug!("Ignoring result of job {}", id);
                        continue;
                    }
                    if let Some(path) = self.state.finish(result) {
                        self.show_image(ctx, &path);
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    self.state.pending = None;
                    self.state.dialog = Some(e.to_string());
                    break;
                }
            }
        }
    }

    fn show_image(&mut self, ctx: &egui::Context, path: &Path) {
        match load_display_image(path, self.display.image_size()) {
            Ok(img) => {
                let color = ColorImage::from_rgba_unmultiplied(img.size, &img.rgba);
                if let Some(tex) = self.state.image.as_mut() {
                    tex.set(color, TextureOptions::LINEAR);
                } else {
                    self.state.image =
                        Some(ctx.load_texture("rna_structure", color, TextureOptions::LINEAR));
                }
                self.state.image_note = None;
            }
            Err(e) => {
                error!("{}", e);
                self.state.image_note = Some(e.to_string());
            }
        }
    }

    fn error_dialog(&mut self, ctx: &egui::Context) {
        let Some(message) = self.state.dialog.clone() else {
            return;
        };
        egui::Window::new("Error")
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(message);
                ui.add_space(8.0);
                if ui.button("OK").clicked() {
                    self.state.dialog = None;
                }
            });
    }

    fn form(&mut self, ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            ui.add_space(10.0);
            ui.label("Enter RNA Sequence:");
        });
        ui.add(
            TextEdit::multiline(&mut self.state.sequence)
                .desired_rows(5)
                .desired_width(f32::INFINITY)
                .font(TextStyle::Monospace),
        );

        ui.add_space(10.0);
        ui.horizontal(|ui| {
            let button = Button::new("Predict Structure");
            if ui.add_enabled(!self.state.is_busy(), button).clicked() {
                self.on_predict_click();
            }
            if self.state.is_busy() {
                ui.spinner();
            }
            ui.label(&self.state.status);
        });

        ui.add_space(10.0);
        ui.push_id("result_text", |ui| {
            ScrollArea::vertical().max_height(220.0).show(ui, |ui| {
                let mut text = self.state.report.as_str();
                ui.add(
                    TextEdit::multiline(&mut text)
                        .desired_rows(10)
                        .desired_width(f32::INFINITY)
                        .font(TextStyle::Monospace),
                );
            });
        });

        ui.add_space(10.0);
        ui.vertical_centered(|ui| {
            if let Some(note) = &self.state.image_note {
                let color = ui.visuals().error_fg_color;
                ui.colored_label(color, note);
            }
            if let Some(tex) = &self.state.image {
                ui.image((tex.id(), tex.size_vec2()));
            }
        });
    }
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_events(ctx);

        egui::CentralPanel::default().show(ctx, |ui| {
            let enabled = self.state.dialog.is_none();
            ui.add_enabled_ui(enabled, |ui| {
                ScrollArea::vertical().show(ui, |ui| self.form(ui));
            });
        });

        self.error_dialog(ctx);
    }
}

/// Open the window and block until it is closed.
pub fn run(cfg: AppConfig) -> Result<(), PredictError> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(WINDOW_TITLE)
            .with_inner_size([cfg.display.window_width, cfg.display.window_height]),
        ..Default::default()
    };

    eframe::run_native(
        WINDOW_TITLE,
        options,
        Box::new(move |cc| Ok(Box::new(App::new(cc, cfg)?))),
    )
    .map_err(|e| PredictError::Gui(e.to_string()))
}
