use std::collections::HashSet;
use std::fmt;

use chrono::NaiveDate;

use crate::error::ConfigurationError;

// ---------------------------------------------------------------------------
// CellValue – a single cell in a non-date column
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring common Pandas dtypes.
/// Filter values are collected into ordered sets, so `CellValue` must be `Ord` and `Hash`.
/// Equality, ordering and hashing agree: every NaN is one value and `-0.0 == 0.0`.
#[derive(Debug, Clone)]
pub enum CellValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

// -- Manual Eq/Ord so we can put CellValue in sets --

/// Collapse NaN payloads and signed zero so float cells compare as set members.
fn canonical(f: f64) -> f64 {
    if f.is_nan() {
        f64::NAN
    } else if f == 0.0 {
        0.0
    } else {
        f
    }
}

impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use CellValue::*;
        fn discriminant(v: &CellValue) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                Text(_) => 4,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => canonical(*a).total_cmp(&canonical(*b)),
            (Text(a), Text(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl std::hash::Hash for CellValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            CellValue::Text(s) => s.hash(state),
            CellValue::Integer(i) => i.hash(state),
            CellValue::Float(f) => canonical(*f).to_bits().hash(state),
            CellValue::Bool(b) => b.hash(state),
            CellValue::Null => {}
        }
    }
}

/// Also the label fragment for filter combinations, so `Null` renders empty.
impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => Ok(()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Integer(i)
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        CellValue::Float(v)
    }
}

impl CellValue {
    /// Try to interpret the value as an `f64` for charting.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, CellValue::Integer(_) | CellValue::Float(_))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }
}

// ---------------------------------------------------------------------------
// Record – one row of the table
// ---------------------------------------------------------------------------

/// A single row: its date key plus one cell per dataset column.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub date: NaiveDate,
    /// Same length and order as [`Dataset::columns`].
    pub cells: Vec<CellValue>,
}

static NULL_CELL: CellValue = CellValue::Null;

impl Record {
    /// Cell at column position `idx`; short rows read as `Null`.
    pub fn cell(&self, idx: usize) -> &CellValue {
        self.cells.get(idx).unwrap_or(&NULL_CELL)
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded table
// ---------------------------------------------------------------------------

/// A date-indexed table. Read-only once built; every engine operation
/// borrows it immutably.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Name of the column the date key was read from.
    pub date_column: String,
    /// Ordered list of non-date column names.
    pub columns: Vec<String>,
    /// Rows, ascending by date.
    pub records: Vec<Record>,
}

impl Dataset {
    /// Build a dataset, stable-sorting records by date so rows sharing a
    /// date keep their input order.
    pub fn new(date_column: impl Into<String>, columns: Vec<String>, mut records: Vec<Record>) -> Self {
        records.sort_by_key(|r| r.date);
        Dataset {
            date_column: date_column.into(),
            columns,
            records,
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// A column is numeric when every non-null cell is an integer or float
    /// and at least one such cell exists.
    pub fn is_numeric(&self, column: &str) -> bool {
        let Some(idx) = self.column_index(column) else {
            return false;
        };
        let mut seen_number = false;
        for record in &self.records {
            match record.cell(idx) {
                CellValue::Null => {}
                v if v.is_numeric() => seen_number = true,
                _ => return false,
            }
        }
        seen_number
    }

    /// Columns whose cells are all numeric, in column order.
    pub fn numeric_columns(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| self.is_numeric(c))
            .cloned()
            .collect()
    }

    /// Distinct values of `column` in order of first appearance.
    pub fn distinct_values(&self, column: &str) -> Result<Vec<CellValue>, ConfigurationError> {
        let idx = self
            .column_index(column)
            .ok_or_else(|| ConfigurationError::UnknownDimension(column.to_string()))?;
        let mut seen = HashSet::new();
        let mut values = Vec::new();
        for record in &self.records {
            let value = record.cell(idx);
            if seen.insert(value) {
                values.push(value.clone());
            }
        }
        Ok(values)
    }

    /// Earliest and latest date key.
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.records.first()?;
        let last = self.records.last()?;
        Some((first.date, last.date))
    }
}
