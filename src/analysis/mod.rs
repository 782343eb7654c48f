//! Analysis module - filtering, aggregation, trends and the report runner

pub mod aggregate;
pub mod filter;
pub mod report;
pub mod trend;

use polars::prelude::PolarsError;
use thiserror::Error;

/// Failure inside one of the analysis engines. The report runner catches
/// these per analysis so one failure never aborts the others.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
}

pub use aggregate::{aggregate_by, AggregateRow, AggregateTable, GroupKey};
pub use filter::{filter, filter_by_date};
pub use report::{Report, ReportData, ReportSettings};
pub use trend::{trend, TimeBucket, TrendPoint};
