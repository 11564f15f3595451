//! Dashboard configuration, read from a JSON file.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::data::window::{DateParser, ISO_DAY_FORMAT};

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "TRENDSLICE_CONFIG";

/// Canonical continent names offered by the `Continents` dimension.
pub const CANONICAL_CONTINENTS: [&str; 7] = [
    "North America",
    "South America",
    "Asia",
    "Australia",
    "Africa",
    "Europe",
    "Antarctica",
];

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DashboardConfig {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub table: TableConfig,
    #[serde(default)]
    pub dimensions: DimensionConfig,
}

/// How the date key is read.
#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_date_column")]
    pub date_column: String,
    #[serde(default = "default_date_format")]
    pub date_format: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            date_column: default_date_column(),
            date_format: default_date_format(),
        }
    }
}

fn default_date_column() -> String {
    "date".to_string()
}

fn default_date_format() -> String {
    ISO_DAY_FORMAT.to_string()
}

/// Table view settings.
#[derive(Debug, Clone, Deserialize)]
pub struct TableConfig {
    #[serde(default = "default_max_rows")]
    pub max_rows: usize,
    /// Initial window start; the dataset's first date when absent.
    #[serde(default)]
    pub start_date: Option<String>,
    /// Initial window end; the dataset's last date when absent.
    #[serde(default)]
    pub end_date: Option<String>,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            max_rows: default_max_rows(),
            start_date: None,
            end_date: None,
        }
    }
}

fn default_max_rows() -> usize {
    20
}

/// Statically enumerated dimensions.
#[derive(Debug, Clone, Deserialize)]
pub struct DimensionConfig {
    /// Metric columns offered for charting. Empty means every numeric column.
    #[serde(default)]
    pub metrics: Vec<String>,
    #[serde(default = "default_continent_column")]
    pub continent_column: String,
    #[serde(default = "default_continents")]
    pub continents: Vec<String>,
}

impl Default for DimensionConfig {
    fn default() -> Self {
        Self {
            metrics: Vec::new(),
            continent_column: default_continent_column(),
            continents: default_continents(),
        }
    }
}

fn default_continent_column() -> String {
    "continent".to_string()
}

fn default_continents() -> Vec<String> {
    CANONICAL_CONTINENTS.iter().map(|c| c.to_string()).collect()
}

impl DashboardConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: DashboardConfig = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load from the file named by `TRENDSLICE_CONFIG`, or use defaults.
    pub fn from_env() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::load(Path::new(&path)),
            None => {
                log::debug!("{CONFIG_ENV} not set, using default configuration");
                Ok(Self::default())
            }
        }
    }

    pub fn date_parser(&self) -> DateParser {
        DateParser::new(self.data.date_format.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_object_gives_defaults() {
        let config: DashboardConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.data.date_column, "date");
        assert_eq!(config.data.date_format, "%Y-%m-%d");
        assert_eq!(config.table.max_rows, 20);
        assert!(config.table.start_date.is_none());
        assert!(config.dimensions.metrics.is_empty());
        assert_eq!(config.dimensions.continent_column, "continent");
        assert_eq!(config.dimensions.continents.len(), 7);
        assert_eq!(config.dimensions.continents[0], "North America");
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config: DashboardConfig = serde_json::from_str(
            r#"{ "table": { "max_rows": 50, "start_date": "2020-03-01" },
                 "dimensions": { "metrics": ["new_cases"] } }"#,
        )
        .unwrap();
        assert_eq!(config.table.max_rows, 50);
        assert_eq!(config.table.start_date.as_deref(), Some("2020-03-01"));
        assert_eq!(config.dimensions.metrics, vec!["new_cases".to_string()]);
        assert_eq!(config.dimensions.continents.len(), 7);
    }

    #[test]
    fn load_reads_file_and_reports_bad_json() {
        let mut good = tempfile::NamedTempFile::new().unwrap();
        write!(good, r#"{{ "data": {{ "date_column": "day" }} }}"#).unwrap();
        let config = DashboardConfig::load(good.path()).unwrap();
        assert_eq!(config.data.date_column, "day");

        let mut bad = tempfile::NamedTempFile::new().unwrap();
        write!(bad, "not json").unwrap();
        let err = DashboardConfig::load(bad.path()).unwrap_err();
        assert!(format!("{err:#}").contains("parsing config"));
    }
}
