use super::model::{CellValue, Dataset};
use crate::config::DimensionConfig;
use crate::error::ConfigurationError;

/// Name of the metric-column enumeration.
pub const METRICS_DIMENSION: &str = "Metrics";
/// Name of the fixed continent enumeration.
pub const CONTINENTS_DIMENSION: &str = "Continents";

/// How a dimension's admissible values are enumerated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DimensionKind {
    /// The configured metric columns.
    Metrics,
    /// The fixed canonical continent list.
    Continents,
    /// Distinct values scanned from a column.
    Column,
}

/// A `{label, value}` pair for a filter control. Null values get a visible
/// `<null>` label.
#[derive(Debug, Clone, PartialEq)]
pub struct DimensionOption {
    pub label: String,
    pub value: CellValue,
}

impl From<CellValue> for DimensionOption {
    fn from(value: CellValue) -> Self {
        let label = if value.is_null() {
            "<null>".to_string()
        } else {
            value.to_string()
        };
        DimensionOption { label, value }
    }
}

/// Resolves dimension names to their value enumerations.
#[derive(Debug, Clone)]
pub struct DimensionCatalog {
    metrics: Vec<String>,
    continent_column: String,
    continents: Vec<CellValue>,
}

impl Default for DimensionCatalog {
    fn default() -> Self {
        Self::from_config(&DimensionConfig::default())
    }
}

impl DimensionCatalog {
    pub fn from_config(config: &DimensionConfig) -> Self {
        DimensionCatalog {
            metrics: config.metrics.clone(),
            continent_column: config.continent_column.clone(),
            continents: config
                .continents
                .iter()
                .map(|c| CellValue::from(c.as_str()))
                .collect(),
        }
    }

    pub fn kind(&self, name: &str) -> DimensionKind {
        if name == METRICS_DIMENSION {
            DimensionKind::Metrics
        } else if name == CONTINENTS_DIMENSION || name == self.continent_column {
            DimensionKind::Continents
        } else {
            DimensionKind::Column
        }
    }

    /// Metric columns present in `dataset`: the configured list, or every
    /// numeric column when none is configured.
    pub fn metric_columns(&self, dataset: &Dataset) -> Vec<String> {
        if self.metrics.is_empty() {
            dataset.numeric_columns()
        } else {
            self.metrics
                .iter()
                .filter(|m| dataset.column_index(m).is_some())
                .cloned()
                .collect()
        }
    }

    /// Admissible values for `name`.
    pub fn distinct_values(
        &self,
        dataset: &Dataset,
        name: &str,
    ) -> Result<Vec<CellValue>, ConfigurationError> {
        match self.kind(name) {
            DimensionKind::Metrics => Ok(self
                .metric_columns(dataset)
                .into_iter()
                .map(CellValue::from)
                .collect()),
            DimensionKind::Continents => Ok(self.continents.clone()),
            DimensionKind::Column => dataset.distinct_values(name),
        }
    }

    /// [`DimensionCatalog::distinct_values`] shaped for a dropdown.
    pub fn options(
        &self,
        dataset: &Dataset,
        name: &str,
    ) -> Result<Vec<DimensionOption>, ConfigurationError> {
        Ok(self
            .distinct_values(dataset, name)?
            .into_iter()
            .map(DimensionOption::from)
            .collect())
    }

    /// Columns usable as filter axes: everything that is not numeric.
    pub fn filterable_columns(&self, dataset: &Dataset) -> Vec<String> {
        dataset
            .columns
            .iter()
            .filter(|c| !dataset.is_numeric(c))
            .cloned()
            .collect()
    }
}
