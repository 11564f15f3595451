use chrono::NaiveDate;
use log::debug;

use super::filter::Combination;
use super::mask::RowMask;
use super::model::{CellValue, Dataset, Record};
use crate::error::{EngineError, ValidationError};

/// Default day format for boundary strings and CSV date cells.
pub const ISO_DAY_FORMAT: &str = "%Y-%m-%d";

// ---------------------------------------------------------------------------
// Date parsing
// ---------------------------------------------------------------------------

/// Parses day-granularity dates with an explicit format instead of ambient
/// locale settings. Anything from the first `T` on is ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateParser {
    format: String,
}

impl Default for DateParser {
    fn default() -> Self {
        Self::new(ISO_DAY_FORMAT)
    }
}

impl DateParser {
    pub fn new(format: impl Into<String>) -> Self {
        DateParser {
            format: format.into(),
        }
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn parse_day(&self, input: &str) -> Result<NaiveDate, ValidationError> {
        let day = input.split('T').next().unwrap_or(input).trim();
        NaiveDate::parse_from_str(day, &self.format).map_err(|_| ValidationError::MalformedDate {
            input: input.to_string(),
            format: self.format.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// Date window
// ---------------------------------------------------------------------------

/// Inclusive `[start, end]` day range. A window with `start > end` is
/// valid and contains nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        DateWindow { start, end }
    }

    /// Build a window from two boundary strings.
    pub fn parse(parser: &DateParser, start: &str, end: &str) -> Result<Self, ValidationError> {
        Ok(DateWindow {
            start: parser.parse_day(start)?,
            end: parser.parse_day(end)?,
        })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Rows of `dataset` whose date key falls inside the window.
    pub fn mask(&self, dataset: &Dataset) -> RowMask {
        RowMask::from_fn(dataset.len(), |r| self.contains(dataset.records[r].date))
    }
}

// ---------------------------------------------------------------------------
// Windowed selection
// ---------------------------------------------------------------------------

/// Indices of rows selected by any combination and inside `window`, in
/// dataset order, capped at the first `max_rows`.
pub fn select_indices(
    dataset: &Dataset,
    combinations: &[Combination],
    window: &DateWindow,
    max_rows: usize,
) -> Vec<usize> {
    let union = RowMask::union(combinations.iter().map(|c| &c.mask), dataset.len());
    let selected: Vec<usize> = union
        .and(&window.mask(dataset))
        .selected_indices()
        .take(max_rows)
        .collect();
    debug!(
        "window {}..={} selected {} row(s) (cap {max_rows})",
        window.start,
        window.end,
        selected.len()
    );
    selected
}

/// Rows selected by any combination and inside `window`, capped at `max_rows`.
pub fn select<'a>(
    dataset: &'a Dataset,
    combinations: &[Combination],
    window: &DateWindow,
    max_rows: usize,
) -> Vec<&'a Record> {
    select_indices(dataset, combinations, window, max_rows)
        .into_iter()
        .map(|i| &dataset.records[i])
        .collect()
}

/// [`select`] with the window given as boundary strings.
pub fn select_between<'a>(
    dataset: &'a Dataset,
    combinations: &[Combination],
    parser: &DateParser,
    start: &str,
    end: &str,
    max_rows: usize,
) -> Result<Vec<&'a Record>, EngineError> {
    let window = DateWindow::parse(parser, start, end)?;
    Ok(select(dataset, combinations, &window, max_rows))
}

/// Narrow every combination's mask to `window`, keeping labels and order.
/// Combinations left with no rows are kept.
pub fn restrict_to_window(
    dataset: &Dataset,
    combinations: &[Combination],
    window: &DateWindow,
) -> Vec<Combination> {
    let in_window = window.mask(dataset);
    combinations
        .iter()
        .map(|c| Combination {
            values: c.values.clone(),
            label: c.label.clone(),
            mask: c.mask.and(&in_window),
        })
        .collect()
}

/// A row as `(column, value)` pairs in column order.
pub fn row_entries<'a>(dataset: &'a Dataset, record: &'a Record) -> Vec<(&'a str, &'a CellValue)> {
    dataset
        .columns
        .iter()
        .enumerate()
        .map(|(i, name)| (name.as_str(), record.cell(i)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::{expand, FilterSpec};
    use crate::data::model::fixtures::{day, four_day_dataset};
    use proptest::prelude::*;

    fn dates(rows: &[&Record]) -> Vec<NaiveDate> {
        rows.iter().map(|r| r.date).collect()
    }

    #[test]
    fn parser_drops_time_suffix() {
        let parser = DateParser::default();
        assert_eq!(parser.parse_day("2020-03-15").unwrap(), day("2020-03-15"));
        assert_eq!(
            parser.parse_day("2020-03-15T18:45:00.000+02:00").unwrap(),
            day("2020-03-15")
        );
    }

    #[test]
    fn parser_rejects_malformed_input() {
        let parser = DateParser::default();
        for bad in ["", "15/03/2020", "2020-13-01", "yesterday"] {
            assert_eq!(
                parser.parse_day(bad),
                Err(ValidationError::MalformedDate {
                    input: bad.to_string(),
                    format: ISO_DAY_FORMAT.to_string(),
                })
            );
        }
    }

    #[test]
    fn parser_honours_configured_format() {
        let parser = DateParser::new("%d/%m/%Y");
        assert_eq!(parser.parse_day("15/03/2020").unwrap(), day("2020-03-15"));
        assert!(parser.parse_day("2020-03-15").is_err());
    }

    #[test]
    fn window_is_inclusive_on_both_ends() {
        let w = DateWindow::new(day("2020-01-01"), day("2020-01-03"));
        assert!(w.contains(day("2020-01-01")));
        assert!(w.contains(day("2020-01-03")));
        assert!(!w.contains(day("2020-01-04")));
    }

    #[test]
    fn selects_union_within_window() {
        let ds = four_day_dataset();
        let combos = expand(&ds, &FilterSpec::new().with("country", ["A", "B"])).unwrap();
        let rows = select_between(
            &ds,
            &combos,
            &DateParser::default(),
            "2020-01-01",
            "2020-01-03",
            10,
        )
        .unwrap();
        assert_eq!(
            dates(&rows),
            vec![day("2020-01-01"), day("2020-01-02"), day("2020-01-03")]
        );
        let first = row_entries(&ds, rows[0]);
        assert_eq!(
            first,
            vec![("country", &CellValue::from("A")), ("cases", &CellValue::Integer(10))]
        );
    }

    #[test]
    fn cap_keeps_the_first_rows() {
        let ds = four_day_dataset();
        let combos = expand(&ds, &FilterSpec::new()).unwrap();
        let window = DateWindow::new(day("2020-01-01"), day("2020-01-04"));
        assert_eq!(select_indices(&ds, &combos, &window, 2), vec![0, 1]);
        assert!(select_indices(&ds, &combos, &window, 0).is_empty());
    }

    #[test]
    fn inverted_window_selects_nothing() {
        let ds = four_day_dataset();
        let combos = expand(&ds, &FilterSpec::new()).unwrap();
        let window = DateWindow::new(day("2020-01-04"), day("2020-01-01"));
        assert!(select(&ds, &combos, &window, 10).is_empty());
    }

    #[test]
    fn no_combinations_select_nothing() {
        let ds = four_day_dataset();
        let combos = expand(&ds, &FilterSpec::new().with("country", Vec::<CellValue>::new())).unwrap();
        assert!(combos.is_empty());
        let window = DateWindow::new(day("2000-01-01"), day("2100-01-01"));
        assert!(select(&ds, &combos, &window, 100).is_empty());
    }

    #[test]
    fn restricting_narrows_masks_and_keeps_empty_combinations() {
        let ds = four_day_dataset();
        let combos = expand(&ds, &FilterSpec::new().with("country", ["A", "B"])).unwrap();
        let window = DateWindow::new(day("2020-01-02"), day("2020-01-02"));
        let narrowed = restrict_to_window(&ds, &combos, &window);

        let labels: Vec<&str> = narrowed.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, ["A", "B"]);
        assert_eq!(narrowed[0].mask, RowMask::none(4));
        assert_eq!(narrowed[1].mask.as_slice(), &[false, true, false, false]);
        assert_eq!(combos[1].mask.as_slice(), &[false, true, false, true]);
    }

    #[test]
    fn malformed_boundary_is_a_validation_error() {
        let ds = four_day_dataset();
        let err = select_between(&ds, &[], &DateParser::default(), "2020-01-01", "soon", 10)
            .unwrap_err();
        assert!(err.is_validation());
    }

    proptest! {
        #[test]
        fn raising_the_cap_only_appends(
            countries in prop::collection::vec(0u8..3, 0..30),
            small in 0usize..30,
            extra in 0usize..30,
        ) {
            let records = countries
                .iter()
                .enumerate()
                .map(|(i, c)| Record {
                    date: day("2020-01-01") + chrono::Days::new(i as u64 / 2),
                    cells: vec![CellValue::Integer(*c as i64)],
                })
                .collect();
            let ds = Dataset::new("date", vec!["country".into()], records);
            let spec = FilterSpec::new().with("country", [CellValue::Integer(0), CellValue::Integer(2)]);
            let combos = expand(&ds, &spec).unwrap();
            let window = DateWindow::new(day("2020-01-02"), day("2020-01-10"));

            let short = select_indices(&ds, &combos, &window, small);
            let long = select_indices(&ds, &combos, &window, small + extra);
            prop_assert!(long.len() >= short.len());
            prop_assert_eq!(&long[..short.len()], &short[..]);
        }
    }
}
