use eframe::egui::{self, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::window::row_entries;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Windowed row table (bottom panel)
// ---------------------------------------------------------------------------

/// Render the capped, date-windowed rows of the current selection.
pub fn data_table(ui: &mut Ui, state: &AppState) {
    let Some(ds) = &state.dataset else {
        return;
    };

    ui.horizontal(|ui: &mut Ui| {
        ui.strong("Rows");
        ui.label(format!(
            "{} shown (max {}), {} to {}",
            state.view.rows.len(),
            state.max_rows,
            state.window.start,
            state.window.end
        ));
    });

    if state.view.rows.is_empty() {
        ui.label("No rows match the current filters and date range.");
        return;
    }

    ScrollArea::horizontal().show(ui, |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
            .column(Column::auto())
            .columns(Column::auto().at_least(60.0), ds.columns.len())
            .header(20.0, |mut header| {
                header.col(|ui| {
                    ui.strong(ds.date_column.as_str());
                });
                for col in &ds.columns {
                    header.col(|ui| {
                        ui.strong(col.as_str());
                    });
                }
            })
            .body(|body| {
                body.rows(18.0, state.view.rows.len(), |mut row| {
                    let record = &ds.records[state.view.rows[row.index()]];
                    row.col(|ui| {
                        ui.label(record.date.to_string());
                    });
                    for (_, value) in row_entries(ds, record) {
                        row.col(|ui| {
                            ui.label(value.to_string());
                        });
                    }
                });
            });
    });
}
