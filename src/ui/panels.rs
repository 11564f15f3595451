use std::path::Path;

use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::DatePickerButton;

use crate::data::loader::{load_file, LoadOptions};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    let (filterable, metrics) = match &state.dataset {
        Some(ds) => (
            state.catalog.filterable_columns(ds),
            state.catalog.metric_columns(ds),
        ),
        None => {
            ui.label("No dataset loaded.");
            return;
        }
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Metric selector ----
            ui.strong("Metric");
            let current_metric = state.metric.clone().unwrap_or_default();
            egui::ComboBox::from_id_salt("metric")
                .selected_text(&current_metric)
                .show_ui(ui, |ui: &mut Ui| {
                    for m in &metrics {
                        if ui.selectable_label(current_metric == *m, m).clicked() {
                            state.set_metric(m.clone());
                        }
                    }
                });
            ui.separator();

            // ---- Date range and row cap ----
            ui.strong("Date range");
            let mut start = state.window.start;
            let mut end = state.window.end;
            ui.horizontal(|ui: &mut Ui| {
                ui.label("From");
                ui.add(DatePickerButton::new(&mut start).id_salt("start_date"));
            });
            ui.horizontal(|ui: &mut Ui| {
                ui.label("To");
                ui.add(DatePickerButton::new(&mut end).id_salt("end_date"));
            });
            if start != state.window.start || end != state.window.end {
                state.set_window(start, end);
            }

            let mut max_rows = state.max_rows;
            ui.horizontal(|ui: &mut Ui| {
                ui.label("Table rows");
                ui.add(egui::DragValue::new(&mut max_rows).range(1..=10_000));
            });
            if max_rows != state.max_rows {
                state.set_max_rows(max_rows);
            }
            ui.separator();

            // ---- Dimension picker ----
            ui.strong("Filter by");
            egui::ComboBox::from_id_salt("add_dimension")
                .selected_text("Add dimension…")
                .show_ui(ui, |ui: &mut Ui| {
                    for col in &filterable {
                        if state.filter.contains(col) {
                            continue;
                        }
                        if ui.selectable_label(false, col).clicked() {
                            state.add_dimension(col);
                        }
                    }
                });

            // ---- Per-dimension value lists (collapsible) ----
            let names: Vec<String> = state
                .filter
                .dimensions()
                .iter()
                .map(|d| d.name.clone())
                .collect();

            for name in &names {
                let offered = state.dimension_options(name);
                let selected = state
                    .filter
                    .get(name)
                    .map(|d| d.values.clone())
                    .unwrap_or_default();

                // Show count of selected / offered in the header
                let header_text = format!("{name}  ({}/{})", selected.len(), offered.len());

                egui::CollapsingHeader::new(RichText::new(header_text).strong())
                    .id_salt(name)
                    .default_open(true)
                    .show(ui, |ui: &mut Ui| {
                        ui.horizontal(|ui: &mut Ui| {
                            if ui.small_button("All").clicked() {
                                state.select_all(name);
                            }
                            if ui.small_button("None").clicked() {
                                state.select_none(name);
                            }
                            if ui.small_button("Remove").clicked() {
                                state.remove_dimension(name);
                            }
                        });

                        for option in &offered {
                            let mut checked = selected.contains(&option.value);
                            if ui.checkbox(&mut checked, option.label.as_str()).changed() {
                                state.toggle_filter_value(name, &option.value);
                            }
                        }
                    });
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(ds) = &state.dataset {
            ui.label(format!(
                "{} rows loaded, {} combination(s), {} table row(s)",
                ds.len(),
                state.view.combination_count,
                state.view.rows.len()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File loading
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open time-series data")
        .add_filter("Supported files", &["csv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        load_path(state, &path);
    }
}

/// Load `path` into `state`, reporting failures in the status line.
pub fn load_path(state: &mut AppState, path: &Path) {
    let options = LoadOptions::from_config(&state.config.data);
    match load_file(path, &options) {
        Ok(dataset) => {
            log::info!(
                "Loaded {} rows with columns {:?} from {}",
                dataset.len(),
                dataset.columns,
                path.display()
            );
            state.set_dataset(dataset);
        }
        Err(e) => {
            log::error!("Failed to load file: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }
}
