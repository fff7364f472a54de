use eframe::egui::{self, RichText, Ui};
use egui_plot::{Bar, BarChart, Legend, Plot};

use exoscope::projection::{self, BatchView, Classification, ResultView, SingleView};
use exoscope::state::AppState;

use crate::color;

/// Feature attributions shown for a single analysis.
const TOP_FEATURES: usize = 7;

// ---------------------------------------------------------------------------
// Result panel (right side)
// ---------------------------------------------------------------------------

pub fn result_panel(ui: &mut Ui, state: &AppState) {
    ui.heading("Analysis");
    ui.label(format!(
        "Model: {}",
        state.active_model().display_name()
    ));
    ui.separator();

    let Some(result) = state.result() else {
        ui.label("No analysis yet.");
        return;
    };

    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            match projection::project(result, state.dataset().observations()) {
                ResultView::Single(view) => single_view(ui, &view),
                ResultView::Batch(view) => batch_view(ui, &view),
            }
            ui.add_space(8.0);
            ui.horizontal_wrapped(|ui: &mut Ui| {
                for (label, c) in color::legend_entries() {
                    ui.label(RichText::new("■").color(c));
                    ui.label(label);
                }
            });
        });
}

fn single_view(ui: &mut Ui, view: &SingleView) {
    match view.classification {
        Some(class) => {
            ui.label(
                RichText::new(class.label())
                    .heading()
                    .color(color::class_color(class)),
            );
        }
        None => {
            ui.label(RichText::new("Unclassified").heading());
        }
    }
    if let Some(c) = view.confidence {
        ui.label(
            RichText::new(format!("Confidence {:.1}%", c * 100.0)).color(color::confidence_color(c)),
        );
    }
    if !view.explanation.is_empty() {
        ui.add_space(4.0);
        ui.label(&view.explanation);
    }

    if !view.feature_importance.is_empty() {
        ui.add_space(8.0);
        ui.strong("Feature importance");
        for feature in view.feature_importance.iter().take(TOP_FEATURES) {
            ui.horizontal(|ui: &mut Ui| {
                ui.label(&feature.name);
                ui.add(
                    egui::ProgressBar::new(feature.importance as f32)
                        .show_percentage()
                        .desired_width(140.0),
                );
            });
        }
    }

    if !view.probabilities.is_empty() {
        ui.add_space(8.0);
        ui.strong("Class probabilities");
        let bars: Vec<Bar> = view
            .probabilities
            .iter()
            .enumerate()
            .map(|(i, &(class, p))| {
                let bar = Bar::new(i as f64, p).width(0.7);
                match class {
                    Some(class) => bar.name(class.label()).fill(color::class_color(class)),
                    None => bar.name(format!("class {i}")),
                }
            })
            .collect();
        class_chart(ui, "probabilities", bars);
    }
}

fn batch_view(ui: &mut Ui, view: &BatchView) {
    ui.label(RichText::new(format!("{} observations", view.total)).heading());
    for class in Classification::ALL.iter().rev() {
        ui.label(
            RichText::new(format!("{}: {}", class.label(), view.count(*class)))
                .color(color::class_color(*class)),
        );
    }

    ui.add_space(8.0);
    egui::Grid::new("batch_metrics")
        .num_columns(2)
        .show(ui, |ui: &mut Ui| {
            ui.label("Average confidence");
            ui.label(
                view.average_confidence
                    .map(|c| format!("{:.1}%", c * 100.0))
                    .unwrap_or_else(|| "—".to_string()),
            );
            ui.end_row();
            ui.label("High confidence");
            ui.label(view.high_confidence_count.to_string());
            ui.end_row();
            ui.label("Low confidence");
            ui.label(view.low_confidence_count.to_string());
            ui.end_row();
            if let Some(version) = &view.model_version {
                ui.label("Model version");
                ui.label(version);
                ui.end_row();
            }
        });

    ui.add_space(8.0);
    let bars: Vec<Bar> = Classification::ALL
        .iter()
        .map(|&class| {
            Bar::new(class.code() as f64, view.count(class) as f64)
                .width(0.7)
                .name(class.label())
                .fill(color::class_color(class))
        })
        .collect();
    class_chart(ui, "class_counts", bars);
}

fn class_chart(ui: &mut Ui, id: &str, bars: Vec<Bar>) {
    Plot::new(id)
        .legend(Legend::default())
        .height(180.0)
        .allow_drag(false)
        .allow_scroll(false)
        .allow_zoom(false)
        .show_axes([false, true])
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars));
        });
}
