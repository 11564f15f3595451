//! Data layer: core types, loading, and the filter-combination engine.
//!
//! Architecture:
//! ```text
//!  .csv / .json / .parquet
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  parse file → Dataset (rows sorted by date)
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐      FilterSpec
//!   │  filter   │ ◀──────────────  expand → Vec<Combination { label, mask }>
//!   └──────────┘
//!        │
//!        ├──────────────────────┐
//!        ▼                      ▼
//!   ┌──────────┐          ┌──────────┐
//!   │  window   │ table    │  series   │ chart
//!   └──────────┘          └──────────┘
//! ```
//!
//! The chart path narrows each mask to the date window
//! (`window::restrict_to_window`) before `series::extract`.
//!
//! `dimension` enumerates the values a filter control may offer.

pub mod dimension;
pub mod filter;
pub mod loader;
pub mod mask;
pub mod model;
pub mod series;
pub mod window;
