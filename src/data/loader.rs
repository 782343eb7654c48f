//! CSV Data Loader Module
//! Loads a sales export with Polars and normalizes it into the typed
//! order table the analysis engines operate on.

use std::io::Cursor;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use log::info;
use polars::prelude::*;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to read tabular data: {0}")]
    Csv(#[from] PolarsError),
    #[error("Missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),
}

/// Canonical column names of the normalized order table.
pub const STORE: &str = "storeName";
pub const BRAND: &str = "brandName";
pub const CATEGORY: &str = "categoryName";
pub const ORDER_DATE: &str = "orderDate";
pub const SELLING_PRICE: &str = "sellingPrice";
pub const COST_PRICE: &str = "costPrice";
pub const QUANTITY: &str = "quantity";

const REQUIRED_COLUMNS: [&str; 7] = [
    STORE,
    BRAND,
    CATEGORY,
    ORDER_DATE,
    SELLING_PRICE,
    COST_PRICE,
    QUANTITY,
];

const CATEGORICAL_COLUMNS: [&str; 3] = [STORE, BRAND, CATEGORY];
const MEASURE_COLUMNS: [&str; 3] = [SELLING_PRICE, COST_PRICE, QUANTITY];

/// Dtype of the normalized `orderDate` column: UTC milliseconds.
pub fn order_date_dtype() -> DataType {
    DataType::Datetime(TimeUnit::Milliseconds, Some("UTC".into()))
}

/// Load a CSV file from disk and normalize it.
pub fn load_csv(path: &Path) -> Result<DataFrame, LoadError> {
    let df = LazyCsvReader::new(path)
        .with_infer_schema_length(Some(10000))
        .with_ignore_errors(true)
        .finish()?
        .collect()?;

    let table = normalize(df)?;
    info!("loaded {} orders from {}", table.height(), path.display());
    Ok(table)
}

/// Load a CSV document from an in-memory buffer and normalize it.
pub fn load_bytes(bytes: &[u8]) -> Result<DataFrame, LoadError> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(10000))
        .with_ignore_errors(true)
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()?;

    normalize(df)
}

/// Normalize a raw frame into the canonical order table:
/// canonical headers only, trimmed categoricals, UTC datetimes,
/// numeric measures with unparseable values left null.
fn normalize(df: DataFrame) -> Result<DataFrame, LoadError> {
    let df = select_required_columns(df)?;

    let mut columns: Vec<Column> = Vec::with_capacity(REQUIRED_COLUMNS.len());

    for name in CATEGORICAL_COLUMNS {
        columns.push(trimmed_string_column(&df, name)?);
    }
    columns.push(order_date_column(&df)?);
    for name in MEASURE_COLUMNS {
        columns.push(df.column(name)?.cast(&DataType::Float64)?);
    }

    Ok(DataFrame::new(columns)?)
}

/// Match headers case- and whitespace-insensitively, rename them to the
/// canonical form and drop everything else.
fn select_required_columns(df: DataFrame) -> Result<DataFrame, LoadError> {
    let headers: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();

    let mut selected: Vec<Expr> = Vec::with_capacity(REQUIRED_COLUMNS.len());
    let mut missing: Vec<String> = Vec::new();

    for required in REQUIRED_COLUMNS {
        let wanted = fold_header(required);
        match headers.iter().find(|h| fold_header(h) == wanted) {
            Some(actual) => selected.push(col(actual.as_str()).alias(required)),
            None => missing.push(required.to_string()),
        }
    }

    if !missing.is_empty() {
        return Err(LoadError::MissingColumns(missing));
    }

    Ok(df.lazy().select(selected).collect()?)
}

fn fold_header(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
}

fn trimmed_string_column(df: &DataFrame, name: &str) -> Result<Column, LoadError> {
    let series = df.column(name)?.cast(&DataType::String)?;
    let values: Vec<Option<String>> = series
        .as_materialized_series()
        .str()?
        .into_iter()
        .map(|opt| opt.map(|s| s.trim().to_string()))
        .collect();

    Ok(Column::new(name.into(), values))
}

/// Parse `orderDate` into Datetime(ms, UTC). String columns are parsed
/// value by value; numeric columns are taken as epoch milliseconds.
/// Unparseable values become null.
fn order_date_column(df: &DataFrame) -> Result<Column, LoadError> {
    let series = df.column(ORDER_DATE)?;

    let millis: Vec<Option<i64>> = match series.dtype() {
        DataType::String => series
            .as_materialized_series()
            .str()?
            .into_iter()
            .map(|opt| opt.and_then(parse_timestamp_millis))
            .collect(),
        _ => series
            .cast(&DataType::Int64)?
            .as_materialized_series()
            .i64()?
            .into_iter()
            .collect(),
    };

    Ok(Column::new(ORDER_DATE.into(), millis).cast(&order_date_dtype())?)
}

/// Accepts RFC 3339 timestamps as well as the date/datetime formats seen
/// in store exports. Naive values are taken as UTC.
fn parse_timestamp_millis(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc).timestamp_millis());
    }

    // Space-separated timestamps with an offset, as pandas exports them.
    const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%:z"];
    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(raw, format) {
            return Some(dt.with_timezone(&Utc).timestamp_millis());
        }
    }

    const NAIVE_FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%d/%m/%Y %H:%M:%S",
        "%d/%m/%Y %H:%M",
    ];
    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt.and_utc().timestamp_millis());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%d/%m/%Y"))
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
storeName,brandName,categoryName,orderDate,sellingPrice,costPrice,quantity
Alpha , BrandX ,Snacks,2024-03-01 10:30:00,10.0,4.0,3
Beta,BrandY,Drinks,2024-03-02,5.5,2.5,2
Alpha,BrandX,Snacks,2024-03-03T08:00:00,8.0,3.0,N/A
";

    #[test]
    fn test_load_and_normalize() {
        let table = load_bytes(SAMPLE.as_bytes()).unwrap();

        assert_eq!(table.height(), 3);
        assert_eq!(table.width(), 7);
        assert_eq!(
            table.column(ORDER_DATE).unwrap().dtype(),
            &order_date_dtype()
        );
        assert_eq!(table.column(QUANTITY).unwrap().dtype(), &DataType::Float64);
    }

    #[test]
    fn test_categoricals_are_trimmed() {
        let table = load_bytes(SAMPLE.as_bytes()).unwrap();
        let stores = table.column(STORE).unwrap().as_materialized_series();
        assert_eq!(stores.str().unwrap().get(0), Some("Alpha"));

        let brands = table.column(BRAND).unwrap().as_materialized_series();
        assert_eq!(brands.str().unwrap().get(0), Some("BrandX"));
    }

    #[test]
    fn test_non_numeric_quantity_becomes_null() {
        let table = load_bytes(SAMPLE.as_bytes()).unwrap();
        let qty = table.column(QUANTITY).unwrap().as_materialized_series();
        let qty = qty.f64().unwrap();

        assert_eq!(qty.get(0), Some(3.0));
        assert_eq!(qty.get(2), None);
    }

    #[test]
    fn test_headers_matched_case_and_space_insensitively() {
        let csv = "\
Store Name,BRANDNAME,categoryname, OrderDate ,SellingPrice,costprice,Quantity
Alpha,BrandX,Snacks,2024-03-01,10.0,4.0,1
";
        let table = load_bytes(csv.as_bytes()).unwrap();
        let names: Vec<String> = table
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(names, REQUIRED_COLUMNS.to_vec());
    }

    #[test]
    fn test_missing_columns_rejected() {
        let csv = "storeName,orderDate\nAlpha,2024-03-01\n";
        match load_bytes(csv.as_bytes()) {
            Err(LoadError::MissingColumns(missing)) => {
                assert!(missing.contains(&BRAND.to_string()));
                assert!(missing.contains(&QUANTITY.to_string()));
            }
            other => panic!("expected MissingColumns, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_offset_timestamps_are_converted_to_utc() {
        let with_offset = parse_timestamp_millis("2024-03-01 12:00:00+02:00").unwrap();
        let naive_utc = parse_timestamp_millis("2024-03-01 10:00:00").unwrap();
        assert_eq!(with_offset, naive_utc);
    }

    #[test]
    fn test_unparseable_date_becomes_null() {
        let csv = "\
storeName,brandName,categoryName,orderDate,sellingPrice,costPrice,quantity
Alpha,BrandX,Snacks,not-a-date,10.0,4.0,1
";
        let table = load_bytes(csv.as_bytes()).unwrap();
        let dates = table
            .column(ORDER_DATE)
            .unwrap()
            .cast(&DataType::Int64)
            .unwrap();
        assert_eq!(dates.as_materialized_series().i64().unwrap().get(0), None);
    }
}
