//! Analysis Session
//! Holds the currently loaded order table together with its provenance.
//! Replaces ambient "last uploaded file" state: the session is passed
//! explicitly to whatever needs the table.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use polars::prelude::*;

use crate::data::loader;

/// The loaded order table plus where it came from.
pub struct Session {
    table: DataFrame,
    source: PathBuf,
}

impl Session {
    pub fn new(table: DataFrame, source: PathBuf) -> Self {
        Self { table, source }
    }

    pub fn table(&self) -> &DataFrame {
        &self.table
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn row_count(&self) -> usize {
        self.table.height()
    }

    /// Distinct store names observed in the table, sorted.
    pub fn store_names(&self) -> Vec<String> {
        unique_strings(&self.table, loader::STORE)
    }

    /// Distinct brand names observed in the table, sorted.
    pub fn brand_names(&self) -> Vec<String> {
        unique_strings(&self.table, loader::BRAND)
    }

    /// Distinct category names observed in the table, sorted.
    pub fn category_names(&self) -> Vec<String> {
        unique_strings(&self.table, loader::CATEGORY)
    }

    /// Earliest and latest order date, for seeding the date range inputs.
    pub fn date_bounds(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let millis = self
            .table
            .column(loader::ORDER_DATE)
            .ok()?
            .cast(&DataType::Int64)
            .ok()?;
        let ca = millis.as_materialized_series().i64().ok()?.clone();

        let start = DateTime::<Utc>::from_timestamp_millis(ca.min()?)?;
        let end = DateTime::<Utc>::from_timestamp_millis(ca.max()?)?;
        Some((start, end))
    }

    /// Default-to-all policy for the store multiselect: an empty selection
    /// resolves to every store present in the data. The filter engine never
    /// applies this itself.
    pub fn resolve_stores(&self, selection: &[String]) -> Vec<String> {
        if selection.is_empty() {
            self.store_names()
        } else {
            selection.to_vec()
        }
    }
}

fn unique_strings(df: &DataFrame, column: &str) -> Vec<String> {
    let Ok(col) = df.column(column) else {
        return Vec::new();
    };

    col.as_materialized_series()
        .unique()
        .ok()
        .map(|unique| {
            let mut values: Vec<String> = unique
                .str()
                .map(|ca| {
                    ca.into_iter()
                        .flatten()
                        .map(|s| s.to_string())
                        .collect()
                })
                .unwrap_or_default();
            values.sort();
            values
        })
        .unwrap_or_default()
}
