use std::collections::BTreeMap;

use eframe::egui::{self, Color32, RichText, Ui};

use exoscope::hyperparams::{default_hyperparameters, HyperparameterSet, ParamValue};
use exoscope::state::AppState;

use crate::app::ViewState;

/// Start an edit session from the committed set.
pub fn open(state: &mut AppState, view: &mut ViewState) {
    view.hyperparam_text = text_buffers(state.hyperparams_mut().begin_edit());
    view.new_param_name.clear();
    view.hyperparam_error = None;
    view.hyperparams_open = true;
}

fn text_buffers(set: &HyperparameterSet) -> BTreeMap<String, String> {
    set.iter()
        .map(|(name, value)| (name.clone(), value.to_string()))
        .collect()
}

fn close(state: &mut AppState, view: &mut ViewState) {
    state.hyperparams_mut().discard();
    view.hyperparams_open = false;
    view.hyperparam_error = None;
}

/// Parse every buffer; the first unparsable one is reported by name.
fn parse_draft(view: &ViewState) -> Result<HyperparameterSet, String> {
    view.hyperparam_text
        .iter()
        .map(|(name, text)| {
            ParamValue::parse(text)
                .map(|value| (name.clone(), value))
                .ok_or_else(|| format!("{name}: expected a number or a comma-separated list"))
        })
        .collect()
}

enum Action {
    Apply,
    Reset,
    Cancel,
}

/// Window editing a staged copy of the hyperparameters. Requests keep using
/// the committed set until "Apply".
pub fn editor_window(ctx: &egui::Context, state: &mut AppState, view: &mut ViewState) {
    if !view.hyperparams_open {
        return;
    }

    let mut window_open = true;
    let mut action = None;
    egui::Window::new("Hyperparameters")
        .collapsible(false)
        .resizable(true)
        .default_width(360.0)
        .open(&mut window_open)
        .show(ctx, |ui: &mut Ui| {
            ui.label("Single values are fixed; comma-separated lists are searched.");
            ui.separator();

            let mut remove = None;
            egui::Grid::new("hyperparam_grid")
                .num_columns(3)
                .striped(true)
                .show(ui, |ui: &mut Ui| {
                    for (name, text) in view.hyperparam_text.iter_mut() {
                        ui.label(name.as_str());
                        let valid = ParamValue::parse(text).is_some();
                        let edit = egui::TextEdit::singleline(text).desired_width(160.0);
                        let edit = if valid {
                            edit
                        } else {
                            edit.text_color(Color32::RED)
                        };
                        ui.add(edit);
                        if ui.small_button("✖").clicked() {
                            remove = Some(name.clone());
                        }
                        ui.end_row();
                    }
                });
            if let Some(name) = remove {
                view.hyperparam_text.remove(&name);
            }

            ui.horizontal(|ui: &mut Ui| {
                ui.add(
                    egui::TextEdit::singleline(&mut view.new_param_name)
                        .hint_text("parameter name")
                        .desired_width(160.0),
                );
                let name = view.new_param_name.trim().to_string();
                let can_add = !name.is_empty() && !view.hyperparam_text.contains_key(&name);
                if ui.add_enabled(can_add, egui::Button::new("Add")).clicked() {
                    view.hyperparam_text.insert(name, "0".to_string());
                    view.new_param_name.clear();
                }
            });

            if let Some(err) = &view.hyperparam_error {
                ui.label(RichText::new(err).color(Color32::RED));
            }

            ui.separator();
            ui.horizontal(|ui: &mut Ui| {
                if ui.button("Apply").clicked() {
                    action = Some(Action::Apply);
                }
                if ui.button("Defaults").clicked() {
                    action = Some(Action::Reset);
                }
                if ui.button("Cancel").clicked() {
                    action = Some(Action::Cancel);
                }
            });
        });

    if !window_open {
        close(state, view);
        return;
    }

    handle_action(state, view, action);
}

fn handle_action(state: &mut AppState, view: &mut ViewState, action: Option<Action>) {
    match action {
        Some(Action::Apply) => match parse_draft(view) {
            Ok(draft) => {
                state.hyperparams_mut().commit(draft);
                view.hyperparams_open = false;
                view.hyperparam_error = None;
            }
            Err(e) => view.hyperparam_error = Some(e),
        },
        // Defaults only refill the editor; Apply still commits.
        Some(Action::Reset) => {
            view.hyperparam_text = text_buffers(&default_hyperparameters());
            view.hyperparam_error = None;
        }
        Some(Action::Cancel) => close(state, view),
        None => {
            // Keep the staged copy in step with the text buffers.
            if let Ok(draft) = parse_draft(view) {
                state.hyperparams_mut().stage_edit(draft);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exoscope::config::Config;

    fn editing() -> (AppState, ViewState) {
        let mut state = AppState::new(&Config::default());
        let mut draft = default_hyperparameters();
        draft.insert("learning_rate".into(), ParamValue::Scalar(0.3));
        state.hyperparams_mut().commit(draft);
        let mut view = ViewState::default();
        open(&mut state, &mut view);
        (state, view)
    }

    #[test]
    fn defaults_then_cancel_keeps_committed_set() {
        let (mut state, mut view) = editing();
        let committed = state.hyperparams().current().clone();

        handle_action(&mut state, &mut view, Some(Action::Reset));
        assert_eq!(view.hyperparam_text["learning_rate"], "0.01, 0.05, 0.1");
        assert_eq!(state.hyperparams().current(), &committed);

        handle_action(&mut state, &mut view, Some(Action::Cancel));
        assert_eq!(state.hyperparams().current(), &committed);
        assert!(!view.hyperparams_open);
    }

    #[test]
    fn defaults_then_apply_commits_defaults() {
        let (mut state, mut view) = editing();
        handle_action(&mut state, &mut view, Some(Action::Reset));
        handle_action(&mut state, &mut view, Some(Action::Apply));
        assert_eq!(state.hyperparams().current(), &default_hyperparameters());
        assert!(!view.hyperparams_open);
    }

    #[test]
    fn invalid_buffer_blocks_apply() {
        let (mut state, mut view) = editing();
        view.hyperparam_text.insert("num_leaves".into(), "many".into());
        handle_action(&mut state, &mut view, Some(Action::Apply));
        assert!(view.hyperparam_error.as_deref().unwrap().starts_with("num_leaves"));
        assert_eq!(
            state.hyperparams().current()["learning_rate"],
            ParamValue::Scalar(0.3)
        );
    }
}
