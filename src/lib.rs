//! Slice a date-indexed table by combinations of categorical filters and
//! render the subsets as a table and as time-series traces.

pub mod app;
pub mod color;
pub mod config;
pub mod data;
pub mod error;
pub mod state;
pub mod ui;

pub use data::filter::{expand, Combination, FilterSpec};
pub use data::mask::RowMask;
pub use data::model::{CellValue, Dataset, Record};
pub use data::series::{extract, Series};
pub use data::window::{restrict_to_window, select, DateParser, DateWindow};
pub use error::{ConfigurationError, EngineError, ValidationError};
