use eframe::egui::{self, RichText, Ui};
use egui_extras::{Column, TableBuilder};

use exoscope::data::paging;
use exoscope::data::store::{CLASSIFICATION_KEY, CONFIDENCE_KEY};
use exoscope::projection::Classification;
use exoscope::state::AppState;

use crate::app::ViewState;
use crate::color;

enum RowAction {
    Select(usize),
    Deselect,
    Remove(usize),
}

// ---------------------------------------------------------------------------
// Dataset table (central panel)
// ---------------------------------------------------------------------------

/// Render one page of the working dataset.
pub fn dataset_table(ui: &mut Ui, state: &mut AppState, view: &mut ViewState) {
    let len = state.dataset().len();
    if len == 0 {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Load a dataset, import a CSV or add an observation");
        });
        return;
    }

    view.page = paging::clamp_page(len, view.page_size, view.page);
    let pages = paging::page_count(len, view.page_size);
    let range = paging::page_range(len, view.page_size, view.page);

    ui.horizontal(|ui: &mut Ui| {
        ui.label(format!("{len} observations"));
        ui.separator();
        if ui
            .add_enabled(view.page > 0, egui::Button::new("◀"))
            .clicked()
        {
            view.page -= 1;
        }
        ui.label(format!("Page {} / {pages}", view.page + 1));
        if ui
            .add_enabled(view.page + 1 < pages, egui::Button::new("▶"))
            .clicked()
        {
            view.page += 1;
        }
    });
    ui.separator();

    let profile = state.profile();
    let selection = state.dataset().selection();
    let mut action = None;

    egui::ScrollArea::horizontal().show(ui, |ui: &mut Ui| {
        let mut builder = TableBuilder::new(ui)
            .striped(true)
            .column(Column::auto())
            .column(Column::auto().at_least(110.0))
            .column(Column::auto());
        for _ in profile.fields() {
            builder = builder.column(Column::auto().at_least(60.0));
        }
        builder = builder.column(Column::auto());

        builder
            .header(20.0, |mut header| {
                header.col(|ui| {
                    ui.strong("#");
                });
                header.col(|ui| {
                    ui.strong("Class");
                });
                header.col(|ui| {
                    ui.strong("Confidence");
                });
                for field in profile.fields() {
                    header.col(|ui| {
                        ui.strong(&field.label).on_hover_text(&field.key);
                    });
                }
                header.col(|_| {});
            })
            .body(|mut body| {
                for index in range.clone() {
                    let Some(obs) = state.dataset().get(index) else {
                        continue;
                    };
                    body.row(18.0, |mut row| {
                        let is_selected = selection == Some(index);
                        row.col(|ui| {
                            if ui.selectable_label(is_selected, index.to_string()).clicked() {
                                action = Some(if is_selected {
                                    RowAction::Deselect
                                } else {
                                    RowAction::Select(index)
                                });
                            }
                        });
                        row.col(|ui| {
                            let class = obs
                                .get(CLASSIFICATION_KEY)
                                .and_then(Classification::from_value);
                            let text = class.map(|c| c.label()).unwrap_or("—");
                            ui.label(
                                RichText::new(text).color(color::class_color_or_default(class)),
                            );
                        });
                        row.col(|ui| {
                            if let Some(c) = obs.number(CONFIDENCE_KEY) {
                                ui.label(
                                    RichText::new(format!("{:.0}%", c * 100.0))
                                        .color(color::confidence_color(c)),
                                );
                            }
                        });
                        for field in profile.fields() {
                            row.col(|ui| {
                                ui.label(
                                    obs.get(&field.key).map(|v| v.to_string()).unwrap_or_default(),
                                );
                            });
                        }
                        row.col(|ui| {
                            if ui.small_button("✖").on_hover_text("Remove").clicked() {
                                action = Some(RowAction::Remove(index));
                            }
                        });
                    });
                }
            });
    });

    let result = match action {
        Some(RowAction::Select(index)) => state.select_observation(index),
        Some(RowAction::Deselect) => {
            state.deselect_observation();
            Ok(())
        }
        Some(RowAction::Remove(index)) => state.remove_observation(index).map(|_| ()),
        None => Ok(()),
    };
    if let Err(e) = result {
        log::warn!("{e}");
    }
}
