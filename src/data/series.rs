use chrono::NaiveDate;
use log::debug;

use super::filter::Combination;
use super::model::Dataset;
use crate::error::{ConfigurationError, EngineError};

/// A named time series: one per filter combination.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub label: String,
    pub x: Vec<NaiveDate>,
    /// Raw metric values; null cells become `NaN` so `x` and `y` stay aligned.
    pub y: Vec<f64>,
}

impl Series {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// `(x, y)` pairs in date order.
    pub fn points(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.x.iter().copied().zip(self.y.iter().copied())
    }
}

/// Check that `metric` names a numeric column and return its position.
pub fn metric_column(dataset: &Dataset, metric: &str) -> Result<usize, ConfigurationError> {
    let idx = dataset
        .column_index(metric)
        .ok_or_else(|| ConfigurationError::MissingMetric(metric.to_string()))?;
    if !dataset.is_numeric(metric) {
        return Err(ConfigurationError::NonNumericMetric(metric.to_string()));
    }
    Ok(idx)
}

/// One series per combination, in combination order. Combinations whose
/// mask selects nothing still produce an (empty) series. No date window is
/// applied here; narrow the masks with
/// [`restrict_to_window`](super::window::restrict_to_window) first.
pub fn extract(
    dataset: &Dataset,
    combinations: &[Combination],
    metric: &str,
) -> Result<Vec<Series>, EngineError> {
    let col = metric_column(dataset, metric)?;

    let series: Vec<Series> = combinations
        .iter()
        .map(|combo| {
            let (x, y): (Vec<NaiveDate>, Vec<f64>) = combo
                .mask
                .selected_indices()
                .filter_map(|r| dataset.records.get(r))
                .map(|record| (record.date, record.cell(col).as_f64().unwrap_or(f64::NAN)))
                .unzip();
            Series {
                label: combo.label.clone(),
                x,
                y,
            }
        })
        .collect();

    debug!("extracted {} series for metric '{metric}'", series.len());
    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::{expand, FilterSpec};
    use crate::data::model::fixtures::{day, four_day_dataset};
    use crate::data::model::{CellValue, Record};
    use pretty_assertions::assert_eq;

    #[test]
    fn one_series_per_country_over_every_masked_row() {
        let ds = four_day_dataset();
        let combos = expand(&ds, &FilterSpec::new().with("country", ["A", "B"])).unwrap();
        let series = extract(&ds, &combos, "cases").unwrap();

        assert_eq!(
            series,
            vec![
                Series {
                    label: "A".into(),
                    x: vec![day("2020-01-01"), day("2020-01-03")],
                    y: vec![10.0, 30.0],
                },
                Series {
                    label: "B".into(),
                    x: vec![day("2020-01-02"), day("2020-01-04")],
                    y: vec![20.0, 40.0],
                },
            ]
        );
    }

    #[test]
    fn empty_masks_still_emit_series() {
        let ds = four_day_dataset();
        let combos = expand(&ds, &FilterSpec::new().with("country", ["A", "Z"])).unwrap();
        let series = extract(&ds, &combos, "cases").unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series[1].label, "Z");
        assert!(series[1].is_empty());
        assert!(series[1].y.is_empty());
    }

    #[test]
    fn no_combinations_give_no_series() {
        let ds = four_day_dataset();
        let combos = expand(&ds, &FilterSpec::new().with("country", Vec::<CellValue>::new())).unwrap();
        assert!(extract(&ds, &combos, "cases").unwrap().is_empty());
    }

    #[test]
    fn metric_must_exist_and_be_numeric() {
        let ds = four_day_dataset();
        assert_eq!(
            extract(&ds, &[], "deaths"),
            Err(ConfigurationError::MissingMetric("deaths".into()).into())
        );
        assert_eq!(
            extract(&ds, &[], "country"),
            Err(ConfigurationError::NonNumericMetric("country".into()).into())
        );
    }

    #[test]
    fn null_metric_cells_keep_alignment() {
        let records = vec![
            Record { date: day("2020-01-01"), cells: vec!["A".into(), CellValue::Float(1.5)] },
            Record { date: day("2020-01-02"), cells: vec!["A".into(), CellValue::Null] },
        ];
        let ds = Dataset::new("date", vec!["country".into(), "rate".into()], records);
        let combos = expand(&ds, &FilterSpec::new().with("country", ["A"])).unwrap();
        let series = extract(&ds, &combos, "rate").unwrap();

        assert_eq!(series[0].x.len(), series[0].y.len());
        assert_eq!(series[0].y[0], 1.5);
        assert!(series[0].y[1].is_nan());
        assert_eq!(series[0].points().count(), 2);
    }
}
