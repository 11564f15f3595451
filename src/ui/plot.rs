use chrono::{Datelike, NaiveDate};
use eframe::egui::Ui;
use egui_plot::{Legend, Line, Plot, Points};

use crate::color::series_colors;
use crate::state::AppState;
use crate::ui::display_label;

// ---------------------------------------------------------------------------
// Date axis mapping
// ---------------------------------------------------------------------------

/// Plot x coordinate of a date: days since 0001-01-01 (CE).
pub fn date_to_plot_x(date: NaiveDate) -> f64 {
    date.num_days_from_ce() as f64
}

/// Axis tick text for a plot x coordinate.
pub fn format_plot_x(x: f64) -> String {
    NaiveDate::from_num_days_from_ce_opt(x.round() as i32)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Time-series plot (central panel)
// ---------------------------------------------------------------------------

/// Render one line+marker trace per filter combination.
pub fn series_plot(ui: &mut Ui, state: &AppState) {
    if state.dataset.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a file to view time series  (File → Open…)");
        });
        return;
    }
    if state.view.series.is_empty() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Nothing selected: pick at least one value in every filter.");
        });
        return;
    }

    let series = &state.view.series;
    let colors = series_colors(series.iter().map(|s| s.label.as_str()));

    Plot::new("series_plot")
        .legend(Legend::default())
        .x_axis_label("Date")
        .y_axis_label(state.metric.clone().unwrap_or_default())
        .x_axis_formatter(|mark, _range| format_plot_x(mark.value))
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for (s, (label, color)) in series.iter().zip(colors) {
                let name = display_label(label);

                // NaN marks a missing value; leave it out of the trace.
                let coords: Vec<[f64; 2]> = s
                    .points()
                    .filter(|(_, y)| y.is_finite())
                    .map(|(d, y)| [date_to_plot_x(d), y])
                    .collect();

                plot_ui.line(
                    Line::new(coords.clone())
                        .name(name)
                        .color(color)
                        .width(1.5),
                );
                plot_ui.points(Points::new(coords).name(name).color(color).radius(3.0));
            }
        });
}
