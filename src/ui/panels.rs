use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use exoscope::data::schema::ModelId;
use exoscope::state::{AppState, Flow};

use crate::app::ViewState;

// ---------------------------------------------------------------------------
// Left side panel – manual observation entry
// ---------------------------------------------------------------------------

/// Render the manual entry form for the active model.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    let profile = state.profile();
    ui.heading(format!("New {} observation", profile.id.display_name()));
    ui.separator();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .max_height(ui.available_height() - 64.0)
        .show(ui, |ui: &mut Ui| {
            egui::Grid::new("entry_form")
                .num_columns(2)
                .striped(true)
                .show(ui, |ui: &mut Ui| {
                    for field in profile.fields() {
                        let mut label = RichText::new(&field.label);
                        if field.required {
                            label = label.strong();
                        }
                        ui.label(label).on_hover_text(&field.key);

                        let mut value = state.form().number(&field.key).unwrap_or(0.0);
                        let drag = egui::DragValue::new(&mut value).speed(field.step);
                        if ui.add(drag).changed() {
                            state.set_form_value(&field.key, &value.to_string());
                        }
                        ui.end_row();
                    }
                });
        });

    ui.separator();
    ui.horizontal(|ui: &mut Ui| {
        if ui.button("Add observation").clicked() {
            if let Err(e) = state.submit_form() {
                log::warn!("Observation rejected: {e}");
            }
        }
        if ui.button("Reset").clicked() {
            state.reset_form();
        }
    });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState, view: &mut ViewState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Import CSV…").clicked() {
                open_csv_dialog(state);
                ui.close_menu();
            }
            if ui.button("Clear dataset").clicked() {
                state.clear_dataset();
                view.page = 0;
                ui.close_menu();
            }
            if ui.button("Reset everything").clicked() {
                state.reset_all();
                view.page = 0;
                ui.close_menu();
            }
        });

        ui.menu_button("Datasets", |ui: &mut Ui| {
            let presets = state.presets().to_vec();
            for preset in &presets {
                let selected = state.selected_preset() == Some(preset.id.as_str());
                let button = ui
                    .selectable_label(selected, &preset.name)
                    .on_hover_text(&preset.description);
                if button.clicked() {
                    if let Err(e) = state.load_preset(&preset.id) {
                        log::warn!("Preset {} not loaded: {e}", preset.id);
                    }
                    view.page = 0;
                    ui.close_menu();
                }
            }
            ui.separator();
            if ui.button("Refresh list").clicked() {
                if let Err(e) = state.refresh_presets() {
                    log::debug!("{e}");
                }
                ui.close_menu();
            }
        });

        ui.separator();

        let mut model = state.active_model();
        egui::ComboBox::from_id_salt("model")
            .selected_text(model.display_name())
            .show_ui(ui, |ui: &mut Ui| {
                for id in ModelId::ALL {
                    ui.selectable_value(&mut model, id, id.display_name());
                }
            });
        if model != state.active_model() {
            state.set_active_model(model);
        }

        ui.separator();

        let single = ui.add_enabled(
            state.dataset().selection().is_some()
                && !state.flow(Flow::AnalyzeSingle).is_pending(),
            egui::Button::new("Analyze selected"),
        );
        if single.clicked() {
            if let Err(e) = state.analyze_single() {
                log::warn!("{e}");
            }
        }

        let batch = ui.add_enabled(
            !state.dataset().is_empty() && !state.flow(Flow::AnalyzeBatch).is_pending(),
            egui::Button::new("Analyze dataset"),
        );
        if batch.clicked() {
            if let Err(e) = state.analyze_batch() {
                log::warn!("{e}");
            }
        }

        if ui.button("Hyperparameters…").clicked() {
            crate::ui::hyperparams::open(state, view);
        }

        ui.separator();

        let pending: Vec<String> = Flow::ALL
            .iter()
            .filter(|&&f| state.flow(f).is_pending())
            .map(|f| f.to_string())
            .collect();
        if !pending.is_empty() {
            ui.spinner();
            ui.label(pending.join(", "));
        }
    });
}

/// One line per failed flow, with a button to dismiss them all.
pub fn error_bar(ui: &mut Ui, state: &mut AppState) {
    let errors: Vec<String> = state
        .errors()
        .into_iter()
        .map(|(source, msg)| format!("{source}: {msg}"))
        .collect();
    ui.horizontal(|ui: &mut Ui| {
        ui.vertical(|ui: &mut Ui| {
            for line in &errors {
                ui.label(RichText::new(line).color(Color32::RED));
            }
        });
        if ui.small_button("Dismiss").clicked() {
            state.clear_errors();
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_csv_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Import observations")
        .add_filter("CSV", &["csv"])
        .pick_file();

    if let Some(path) = file {
        if let Err(e) = state.import_csv(path) {
            log::warn!("{e}");
        }
    }
}
