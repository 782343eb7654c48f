//! Trend Engine
//! Buckets orders by their UTC timestamp (calendar day, weekday or hour
//! of day) and sums sales, profit and quantity per bucket.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Timelike, Utc};
use polars::prelude::*;
use serde::Serialize;

use crate::analysis::AnalysisError;
use crate::data::loader;

const MILLIS_PER_DAY: i64 = 86_400_000;

const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TimeBucket {
    Daily,
    Weekday,
    Hourly,
}

impl TimeBucket {
    fn key(self, dt: &DateTime<Utc>) -> i64 {
        match self {
            TimeBucket::Daily => dt.timestamp_millis().div_euclid(MILLIS_PER_DAY),
            TimeBucket::Weekday => dt.weekday().num_days_from_monday() as i64,
            TimeBucket::Hourly => dt.hour() as i64,
        }
    }

    fn key_label(self, key: i64) -> String {
        match self {
            TimeBucket::Daily => DateTime::<Utc>::from_timestamp_millis(key * MILLIS_PER_DAY)
                .map(|dt| dt.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            TimeBucket::Weekday => WEEKDAYS[key as usize % WEEKDAYS.len()].to_string(),
            TimeBucket::Hourly => format!("{:02}:00", key),
        }
    }
}

/// Summed measures for one time bucket.
#[derive(Debug, Clone, Serialize)]
pub struct TrendPoint {
    pub label: String,
    pub total_sales: f64,
    pub profit: f64,
    pub total_quantity: f64,
}

#[derive(Default)]
struct Accumulator {
    sales: f64,
    cost: f64,
    quantity: f64,
}

/// Bucket `table` by `bucket`, summing sales/profit/quantity per bucket.
/// Output is ordered by bucket. Rows with a null date are skipped; null
/// measures contribute nothing.
pub fn trend(table: &DataFrame, bucket: TimeBucket) -> Result<Vec<TrendPoint>, AnalysisError> {
    let millis = table.column(loader::ORDER_DATE)?.cast(&DataType::Int64)?;
    let dates = millis.as_materialized_series().i64()?;
    let prices = table
        .column(loader::SELLING_PRICE)?
        .as_materialized_series()
        .f64()?;
    let costs = table
        .column(loader::COST_PRICE)?
        .as_materialized_series()
        .f64()?;
    let quantities = table
        .column(loader::QUANTITY)?
        .as_materialized_series()
        .f64()?;

    let mut buckets: BTreeMap<i64, Accumulator> = BTreeMap::new();

    for i in 0..table.height() {
        let Some(ts) = dates.get(i) else { continue };
        let Some(dt) = DateTime::<Utc>::from_timestamp_millis(ts) else {
            continue;
        };

        let acc = buckets.entry(bucket.key(&dt)).or_default();
        let quantity = quantities.get(i);
        if let (Some(price), Some(qty)) = (prices.get(i), quantity) {
            acc.sales += price * qty;
        }
        if let (Some(cost), Some(qty)) = (costs.get(i), quantity) {
            acc.cost += cost * qty;
        }
        if let Some(qty) = quantity {
            acc.quantity += qty;
        }
    }

    let points = buckets
        .into_iter()
        .map(|(key, acc)| TrendPoint {
            label: bucket.key_label(key),
            total_sales: acc.sales,
            profit: acc.sales - acc.cost,
            total_quantity: acc.quantity,
        })
        .collect();

    Ok(points)
}
