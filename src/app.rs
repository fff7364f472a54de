use std::collections::BTreeMap;
use std::time::Duration;

use eframe::egui;

use exoscope::config::{Config, DEFAULT_PAGE_SIZE};
use exoscope::state::AppState;

use crate::ui::{hyperparams, panels, results, table};

/// Presentation-only state. Nothing here affects what the core sends.
#[derive(Debug, Default)]
pub struct ViewState {
    pub page: usize,
    pub page_size: usize,
    pub hyperparams_open: bool,
    /// Text buffers of the hyperparameter editor, keyed by parameter name.
    pub hyperparam_text: BTreeMap<String, String>,
    pub new_param_name: String,
    pub hyperparam_error: Option<String>,
}

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct ExoscopeApp {
    pub state: AppState,
    pub view: ViewState,
}

impl ExoscopeApp {
    pub fn new(config: &Config) -> Self {
        let mut state = AppState::new(config);
        // The built-in catalog stays in place if the service is down.
        if let Err(e) = state.refresh_presets() {
            log::warn!("Preset catalog not requested: {e}");
        }
        Self {
            state,
            view: ViewState {
                page_size: DEFAULT_PAGE_SIZE,
                ..ViewState::default()
            },
        }
    }
}

impl eframe::App for ExoscopeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.state.poll_jobs() > 0 {
            ctx.request_repaint();
        }
        if self.state.is_busy() {
            ctx.request_repaint_after(Duration::from_millis(100));
        }

        // ---- Top panel: model, datasets, actions ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state, &mut self.view);
        });

        // ---- Bottom panel: error slots ----
        if !self.state.errors().is_empty() {
            egui::TopBottomPanel::bottom("errors").show(ctx, |ui| {
                panels::error_bar(ui, &mut self.state);
            });
        }

        // ---- Left side panel: manual entry ----
        egui::SidePanel::left("entry_panel")
            .default_width(280.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Right side panel: analysis result ----
        egui::SidePanel::right("result_panel")
            .default_width(340.0)
            .resizable(true)
            .show(ctx, |ui| {
                results::result_panel(ui, &self.state);
            });

        // ---- Central panel: dataset table ----
        egui::CentralPanel::default().show(ctx, |ui| {
            table::dataset_table(ui, &mut self.state, &mut self.view);
        });

        hyperparams::editor_window(ctx, &mut self.state, &mut self.view);
    }
}
