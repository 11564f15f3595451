use chrono::NaiveDate;

use crate::config::DashboardConfig;
use crate::data::dimension::{DimensionCatalog, DimensionOption};
use crate::data::filter::{expand, FilterSpec};
use crate::data::model::{CellValue, Dataset};
use crate::data::series::{extract, Series};
use crate::data::window::{restrict_to_window, select_indices, DateWindow};
use crate::error::EngineError;

// ---------------------------------------------------------------------------
// Derived view
// ---------------------------------------------------------------------------

/// Everything the table and chart render for one selection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct View {
    pub combination_count: usize,
    /// Dataset row indices for the table, already windowed and capped.
    pub rows: Vec<usize>,
    pub series: Vec<Series>,
}

/// Expand the filter once and feed both the table and the chart path.
/// Both honour the date range; only the table is capped.
pub fn compute_view(
    dataset: &Dataset,
    filter: &FilterSpec,
    window: &DateWindow,
    metric: Option<&str>,
    max_rows: usize,
) -> Result<View, EngineError> {
    let combinations = expand(dataset, filter)?;
    let rows = select_indices(dataset, &combinations, window, max_rows);
    let series = match metric {
        Some(m) => extract(dataset, &restrict_to_window(dataset, &combinations, window), m)?,
        None => Vec::new(),
    };
    Ok(View {
        combination_count: combinations.len(),
        rows,
        series,
    })
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: DashboardConfig,

    pub catalog: DimensionCatalog,

    /// Loaded dataset (None until user loads a file).
    pub dataset: Option<Dataset>,

    /// Current filter dimensions and their selected values.
    pub filter: FilterSpec,

    /// Inclusive date range applied to the table and chart.
    pub window: DateWindow,

    /// Metric column charted per combination.
    pub metric: Option<String>,

    /// Row cap for the table.
    pub max_rows: usize,

    /// Result of the last recomputation.
    pub view: View,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(DashboardConfig::default())
    }
}

impl AppState {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            catalog: DimensionCatalog::from_config(&config.dimensions),
            max_rows: config.table.max_rows,
            config,
            dataset: None,
            filter: FilterSpec::new(),
            window: DateWindow::new(NaiveDate::default(), NaiveDate::default()),
            metric: None,
            view: View::default(),
            status_message: None,
        }
    }

    /// Ingest a newly loaded dataset, reset the filter and seed the window.
    pub fn set_dataset(&mut self, dataset: Dataset) {
        self.filter = FilterSpec::new();
        self.metric = self.catalog.metric_columns(&dataset).into_iter().next();
        self.status_message = None;

        let (first, last) = dataset
            .date_bounds()
            .unwrap_or((NaiveDate::default(), NaiveDate::default()));
        self.window = DateWindow::new(first, last);
        self.apply_configured_window();

        self.dataset = Some(dataset);
        self.recompute();
    }

    /// Override the window with `table.start_date` / `table.end_date`.
    fn apply_configured_window(&mut self) {
        let parser = self.config.date_parser();
        let table = &self.config.table;
        let bounds = [
            (table.start_date.as_deref(), &mut self.window.start),
            (table.end_date.as_deref(), &mut self.window.end),
        ];
        for (configured, slot) in bounds {
            let Some(text) = configured else { continue };
            match parser.parse_day(text) {
                Ok(date) => *slot = date,
                Err(e) => {
                    log::warn!("Ignoring configured date: {e}");
                    self.status_message = Some(format!("Config: {e}"));
                }
            }
        }
    }

    /// Recompute table rows and chart series after a selection change.
    pub fn recompute(&mut self) {
        let Some(ds) = &self.dataset else {
            return;
        };
        match compute_view(
            ds,
            &self.filter,
            &self.window,
            self.metric.as_deref(),
            self.max_rows,
        ) {
            Ok(view) => {
                log::debug!(
                    "{} combination(s), {} table row(s), {} series",
                    view.combination_count,
                    view.rows.len(),
                    view.series.len()
                );
                self.view = view;
                if self
                    .status_message
                    .as_deref()
                    .is_some_and(|m| m.starts_with("Error:"))
                {
                    self.status_message = None;
                }
            }
            Err(e) => {
                log::error!("Selection failed: {e}");
                self.view = View::default();
                self.status_message = Some(format!("Error: {e}"));
            }
        }
    }

    /// Values a filter control may offer for `name`.
    pub fn dimension_values(&self, name: &str) -> Vec<CellValue> {
        let Some(ds) = &self.dataset else {
            return Vec::new();
        };
        self.catalog.distinct_values(ds, name).unwrap_or_else(|e| {
            log::warn!("{e}");
            Vec::new()
        })
    }

    /// [`AppState::dimension_values`] labelled for checkboxes.
    pub fn dimension_options(&self, name: &str) -> Vec<DimensionOption> {
        let Some(ds) = &self.dataset else {
            return Vec::new();
        };
        self.catalog.options(ds, name).unwrap_or_else(|e| {
            log::warn!("{e}");
            Vec::new()
        })
    }

    /// Add a filter dimension with nothing selected yet.
    pub fn add_dimension(&mut self, name: &str) {
        if !self.filter.contains(name) {
            self.filter.push_dimension(name, std::iter::empty());
            self.recompute();
        }
    }

    pub fn remove_dimension(&mut self, name: &str) {
        self.filter.remove_dimension(name);
        self.recompute();
    }

    /// Toggle a single value in a dimension's selection.
    pub fn toggle_filter_value(&mut self, name: &str, value: &CellValue) {
        self.filter.toggle_value(name, value);
        self.recompute();
    }

    /// Select all offered values of a dimension.
    pub fn select_all(&mut self, name: &str) {
        let values = self.dimension_values(name);
        self.filter.select_all(name, &values);
        self.recompute();
    }

    /// Deselect all values of a dimension.
    pub fn select_none(&mut self, name: &str) {
        self.filter.select_none(name);
        self.recompute();
    }

    pub fn set_metric(&mut self, metric: String) {
        self.metric = Some(metric);
        self.recompute();
    }

    pub fn set_window(&mut self, start: NaiveDate, end: NaiveDate) {
        self.window = DateWindow::new(start, end);
        self.recompute();
    }

    pub fn set_max_rows(&mut self, max_rows: usize) {
        self.max_rows = max_rows;
        self.recompute();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::fixtures::{day, four_day_dataset};

    fn loaded() -> AppState {
        let mut state = AppState::default();
        state.set_dataset(four_day_dataset());
        state
    }

    #[test]
    fn fresh_dataset_shows_everything() {
        let state = loaded();
        assert_eq!(state.metric.as_deref(), Some("cases"));
        assert_eq!(state.window, DateWindow::new(day("2020-01-01"), day("2020-01-04")));
        assert_eq!(state.view.combination_count, 1);
        assert_eq!(state.view.rows, vec![0, 1, 2, 3]);
        assert_eq!(state.view.series.len(), 1);
        assert_eq!(state.view.series[0].y, vec![10.0, 20.0, 30.0, 40.0]);
    }

    #[test]
    fn new_dimension_starts_empty() {
        let mut state = loaded();
        state.add_dimension("country");
        assert_eq!(state.view, View::default());
        assert!(state.status_message.is_none());
    }

    #[test]
    fn toggling_values_drives_table_and_chart() {
        let mut state = loaded();
        state.add_dimension("country");
        state.toggle_filter_value("country", &"B".into());
        state.set_window(day("2020-01-01"), day("2020-01-03"));

        assert_eq!(state.view.rows, vec![1]);
        assert_eq!(state.view.series[0].label, "B");
        assert_eq!(state.view.series[0].x, vec![day("2020-01-02")]);

        state.select_all("country");
        assert_eq!(state.view.combination_count, 2);
        assert_eq!(state.view.rows, vec![0, 1, 2]);

        state.set_max_rows(2);
        assert_eq!(state.view.rows, vec![0, 1]);

        state.select_none("country");
        assert!(state.view.series.is_empty());
        assert!(state.view.rows.is_empty());
    }

    #[test]
    fn table_and_chart_share_the_window() {
        let ds = four_day_dataset();
        let filter = FilterSpec::new().with("country", ["A", "B"]);
        let window = DateWindow::new(day("2020-01-01"), day("2020-01-03"));
        let view = compute_view(&ds, &filter, &window, Some("cases"), 10).unwrap();

        assert_eq!(view.combination_count, 2);
        assert_eq!(view.rows, vec![0, 1, 2]);
        let a = &view.series[0];
        assert_eq!(a.label, "A");
        assert_eq!(a.x, vec![day("2020-01-01"), day("2020-01-03")]);
        assert_eq!(a.y, vec![10.0, 30.0]);
        let b = &view.series[1];
        assert_eq!(b.label, "B");
        assert_eq!(b.x, vec![day("2020-01-02")]);
        assert_eq!(b.y, vec![20.0]);
    }

    #[test]
    fn chart_is_not_capped_by_the_row_limit() {
        let ds = four_day_dataset();
        let window = DateWindow::new(day("2020-01-01"), day("2020-01-04"));
        let view = compute_view(&ds, &FilterSpec::new(), &window, Some("cases"), 1).unwrap();
        assert_eq!(view.rows, vec![0]);
        assert_eq!(view.series[0].len(), 4);
    }

    #[test]
    fn options_follow_the_loaded_dataset() {
        let state = loaded();
        let labels: Vec<String> = state
            .dimension_options("country")
            .into_iter()
            .map(|o| o.label)
            .collect();
        assert_eq!(labels, ["A", "B"]);
        assert!(AppState::default().dimension_options("country").is_empty());
    }

    #[test]
    fn engine_errors_surface_as_status() {
        let mut state = loaded();
        state.set_metric("country".into());
        assert!(state.view.series.is_empty());
        assert_eq!(
            state.status_message.as_deref(),
            Some("Error: metric column is not numeric: country")
        );

        state.set_metric("cases".into());
        assert!(state.status_message.is_none());
        assert_eq!(state.view.series.len(), 1);
    }

    #[test]
    fn configured_window_overrides_bounds() {
        let mut config = DashboardConfig::default();
        config.table.start_date = Some("2020-01-02T00:00:00".into());
        config.table.end_date = Some("someday".into());
        let mut state = AppState::new(config);
        state.set_dataset(four_day_dataset());

        assert_eq!(state.window.start, day("2020-01-02"));
        assert_eq!(state.window.end, day("2020-01-04"));
        assert!(state
            .status_message
            .as_deref()
            .unwrap_or_default()
            .contains("someday"));
    }
}
