//! Filter Engine
//! Pure row-subset selection over the normalized order table. The engine
//! takes its parameters literally: an empty store set matches nothing,
//! the empty-means-all default lives in `Session::resolve_stores`.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use polars::prelude::*;

use crate::analysis::AnalysisError;
use crate::data::loader;

/// Rows with `start <= orderDate <= end` (inclusive both ends) whose
/// trimmed store name is in `stores`. Zero matches yield an empty table,
/// never an error.
pub fn filter(
    table: &DataFrame,
    stores: &[String],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<DataFrame, AnalysisError> {
    let by_date = date_mask(table, start, end)?;
    let by_store = membership_mask(table, loader::STORE, stores)?;
    Ok(table.filter(&(&by_date & &by_store))?)
}

/// Date predicate only, for views that must not be narrowed by the store
/// selection.
pub fn filter_by_date(
    table: &DataFrame,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<DataFrame, AnalysisError> {
    let mask = date_mask(table, start, end)?;
    Ok(table.filter(&mask)?)
}

/// Rows whose value in `column` is one of `values`. An empty `values`
/// slice means "no restriction" and returns the table unchanged.
pub fn restrict(
    table: &DataFrame,
    column: &str,
    values: &[String],
) -> Result<DataFrame, AnalysisError> {
    if values.is_empty() {
        return Ok(table.clone());
    }

    let mask = membership_mask(table, column, values)?;
    Ok(table.filter(&mask)?)
}

/// Null dates never match.
fn date_mask(
    table: &DataFrame,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<BooleanChunked, AnalysisError> {
    let lo = start.timestamp_millis();
    let hi = end.timestamp_millis();

    let millis = table.column(loader::ORDER_DATE)?.cast(&DataType::Int64)?;
    let mask = millis
        .as_materialized_series()
        .i64()?
        .into_iter()
        .map(|opt| Some(matches!(opt, Some(t) if t >= lo && t <= hi)))
        .collect();

    Ok(mask)
}

fn membership_mask(
    table: &DataFrame,
    column: &str,
    values: &[String],
) -> Result<BooleanChunked, AnalysisError> {
    let wanted: HashSet<&str> = values.iter().map(|v| v.trim()).collect();

    let mask = table
        .column(column)?
        .as_materialized_series()
        .str()?
        .into_iter()
        .map(|opt| Some(matches!(opt, Some(v) if wanted.contains(v))))
        .collect();

    Ok(mask)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const SAMPLE: &str = "\
storeName,brandName,categoryName,orderDate,sellingPrice,costPrice,quantity
Alpha,BrandX,Snacks,2024-03-01 10:30:00,10.0,4.0,3
Beta,BrandY,Drinks,2024-03-05 12:00:00,5.0,2.0,2
Alpha,BrandY,Drinks,2024-03-09 09:00:00,7.0,3.0,1
";

    fn sample_table() -> DataFrame {
        loader::load_bytes(SAMPLE.as_bytes()).unwrap()
    }

    fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_date_range_is_inclusive_both_ends() {
        let table = sample_table();
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 10, 30, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 3, 5, 12, 0, 0).unwrap();

        let stores = vec!["Alpha".to_string(), "Beta".to_string()];
        let out = filter(&table, &stores, start, end).unwrap();
        assert_eq!(out.height(), 2);
    }

    #[test]
    fn test_store_membership_narrows() {
        let table = sample_table();
        let out = filter(
            &table,
            &["Alpha".to_string()],
            utc(2024, 3, 1, 0),
            utc(2024, 3, 31, 0),
        )
        .unwrap();
        assert_eq!(out.height(), 2);
    }

    #[test]
    fn test_empty_store_set_matches_nothing() {
        let table = sample_table();
        let out = filter(&table, &[], utc(2024, 3, 1, 0), utc(2024, 3, 31, 0)).unwrap();
        assert_eq!(out.height(), 0);
    }

    #[test]
    fn test_excluding_range_gives_empty_table_not_error() {
        let table = sample_table();
        let out = filter_by_date(&table, utc(2020, 1, 1, 0), utc(2020, 12, 31, 0)).unwrap();
        assert_eq!(out.height(), 0);
        assert_eq!(out.width(), table.width());
    }

    #[test]
    fn test_filtering_is_idempotent() {
        let table = sample_table();
        let stores = vec!["Alpha".to_string()];
        let start = utc(2024, 3, 1, 0);
        let end = utc(2024, 3, 31, 0);

        let once = filter(&table, &stores, start, end).unwrap();
        let twice = filter(&once, &stores, start, end).unwrap();
        assert!(once.equals_missing(&twice));
    }

    #[test]
    fn test_resolved_empty_selection_equals_explicit_full_list() {
        use crate::data::Session;
        use std::path::PathBuf;

        let session = Session::new(sample_table(), PathBuf::from("sample.csv"));
        let start = utc(2024, 3, 1, 0);
        let end = utc(2024, 3, 31, 0);

        let resolved = filter(
            session.table(),
            &session.resolve_stores(&[]),
            start,
            end,
        )
        .unwrap();
        let explicit = filter(
            session.table(),
            &["Alpha".to_string(), "Beta".to_string()],
            start,
            end,
        )
        .unwrap();

        assert!(resolved.equals_missing(&explicit));
    }

    #[test]
    fn test_restrict_with_empty_values_is_identity() {
        let table = sample_table();
        let out = restrict(&table, loader::BRAND, &[]).unwrap();
        assert_eq!(out.height(), table.height());

        let narrowed = restrict(&table, loader::BRAND, &["BrandY".to_string()]).unwrap();
        assert_eq!(narrowed.height(), 2);
    }
}
