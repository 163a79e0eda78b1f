//! Well production reporting: load daily production CSVs, clean them,
//! summarise each well, flag day-over-day anomalies and chart the trends.

pub mod anomalies;
pub mod charts;
pub mod cleaner;
pub mod config;
pub mod error;
pub mod inspect;
pub mod kpi;
pub mod loader;
pub mod output;
pub mod pipeline;
pub mod types;
pub mod util;

pub use error::AppError;
