//! Aggregation Engine
//! Groups the order table by a categorical key and sums the derived
//! measures. Stateless: every call is a full pass over the rows it is
//! given.

use polars::prelude::*;
use serde::Serialize;

use crate::analysis::{filter, AnalysisError};
use crate::data::loader;

const TOTAL_SALES: &str = "total_sales";
const TOTAL_COST: &str = "total_cost";
const TOTAL_QUANTITY: &str = "total_quantity";
const PROFIT: &str = "profit";
const PROFIT_MARGIN: &str = "profit_margin";

/// Categorical column used to bucket rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GroupKey {
    Store,
    Brand,
    Category,
}

impl GroupKey {
    pub fn column(self) -> &'static str {
        match self {
            GroupKey::Store => loader::STORE,
            GroupKey::Brand => loader::BRAND,
            GroupKey::Category => loader::CATEGORY,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            GroupKey::Store => "Store",
            GroupKey::Brand => "Brand",
            GroupKey::Category => "Category",
        }
    }
}

/// Summed measures for one distinct key value.
#[derive(Debug, Clone, Serialize)]
pub struct AggregateRow {
    pub key: String,
    pub total_sales: f64,
    pub total_cost: f64,
    pub total_quantity: f64,
    pub profit: f64,
    pub profit_margin: f64,
}

/// One row per distinct key value. Row order is unspecified; consumers
/// sort for display.
#[derive(Debug, Clone, Serialize)]
pub struct AggregateTable {
    pub group_key: GroupKey,
    pub rows: Vec<AggregateRow>,
}

impl AggregateTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows ordered by total sales, largest first.
    pub fn rows_by_sales(&self) -> Vec<AggregateRow> {
        let mut rows = self.rows.clone();
        rows.sort_by(|a, b| {
            b.total_sales
                .partial_cmp(&a.total_sales)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        rows
    }
}

/// Group `table` by `key` and sum the derived measures per group.
///
/// A non-empty `subset` restricts the rows to those key values before
/// aggregating; an empty subset means every value observed in the data.
/// Missing (null) measures contribute nothing to the sums. Profit margin
/// is `profit / total_sales * 100`, reported as `0.0` when a group has no
/// sales so the ratio never reaches presentation as infinity or NaN.
pub fn aggregate_by(
    table: &DataFrame,
    key: GroupKey,
    subset: &[String],
) -> Result<AggregateTable, AnalysisError> {
    let restricted = filter::restrict(table, key.column(), subset)?;

    let grouped = restricted
        .lazy()
        .filter(col(key.column()).is_not_null())
        .group_by([col(key.column())])
        .agg([
            (col(loader::SELLING_PRICE) * col(loader::QUANTITY))
                .sum()
                .alias(TOTAL_SALES),
            (col(loader::COST_PRICE) * col(loader::QUANTITY))
                .sum()
                .alias(TOTAL_COST),
            col(loader::QUANTITY).sum().alias(TOTAL_QUANTITY),
        ])
        .with_column((col(TOTAL_SALES) - col(TOTAL_COST)).alias(PROFIT))
        .with_column(
            when(col(TOTAL_SALES).neq(lit(0.0)))
                .then(col(PROFIT) / col(TOTAL_SALES) * lit(100.0))
                .otherwise(lit(0.0))
                .alias(PROFIT_MARGIN),
        )
        .collect()?;

    let rows = materialize_rows(&grouped, key)?;
    Ok(AggregateTable {
        group_key: key,
        rows,
    })
}

fn materialize_rows(grouped: &DataFrame, key: GroupKey) -> Result<Vec<AggregateRow>, AnalysisError> {
    let keys = grouped.column(key.column())?.as_materialized_series().str()?;
    let sales = grouped.column(TOTAL_SALES)?.as_materialized_series().f64()?;
    let cost = grouped.column(TOTAL_COST)?.as_materialized_series().f64()?;
    let quantity = grouped
        .column(TOTAL_QUANTITY)?
        .as_materialized_series()
        .f64()?;
    let profit = grouped.column(PROFIT)?.as_materialized_series().f64()?;
    let margin = grouped
        .column(PROFIT_MARGIN)?
        .as_materialized_series()
        .f64()?;

    let mut rows = Vec::with_capacity(grouped.height());
    for i in 0..grouped.height() {
        let Some(key) = keys.get(i) else { continue };
        rows.push(AggregateRow {
            key: key.to_string(),
            total_sales: sales.get(i).unwrap_or(0.0),
            total_cost: cost.get(i).unwrap_or(0.0),
            total_quantity: quantity.get(i).unwrap_or(0.0),
            profit: profit.get(i).unwrap_or(0.0),
            profit_margin: margin.get(i).unwrap_or(0.0),
        });
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const SAMPLE: &str = "\
storeName,brandName,categoryName,orderDate,sellingPrice,costPrice,quantity
A,X,Snacks,2024-03-01 10:00:00,10.0,4.0,3
A,Y,Drinks,2024-03-01 11:00:00,5.0,2.0,2
B,X,Snacks,2024-03-02 09:00:00,2.0,1.0,N/A
";

    fn sample_table() -> DataFrame {
        loader::load_bytes(SAMPLE.as_bytes()).unwrap()
    }

    fn sorted_rows(table: &AggregateTable) -> Vec<AggregateRow> {
        let mut rows = table.rows.clone();
        rows.sort_by(|a, b| a.key.cmp(&b.key));
        rows
    }

    #[test]
    fn test_brand_aggregation_matches_hand_computed_sums() {
        let out = aggregate_by(&sample_table(), GroupKey::Brand, &[]).unwrap();
        let rows = sorted_rows(&out);
        assert_eq!(rows.len(), 2);

        // X: 10*3 = 30 sales, 4*3 = 12 cost (the N/A-quantity row adds nothing)
        assert_eq!(rows[0].key, "X");
        assert_relative_eq!(rows[0].total_sales, 30.0);
        assert_relative_eq!(rows[0].total_cost, 12.0);
        assert_relative_eq!(rows[0].profit, 18.0);
        assert_relative_eq!(rows[0].profit_margin, 60.0);

        assert_eq!(rows[1].key, "Y");
        assert_relative_eq!(rows[1].total_sales, 10.0);
        assert_relative_eq!(rows[1].total_cost, 4.0);
        assert_relative_eq!(rows[1].profit, 6.0);
    }

    #[test]
    fn test_group_keys_are_exactly_the_distinct_values() {
        let out = aggregate_by(&sample_table(), GroupKey::Store, &[]).unwrap();
        let mut keys: Vec<String> = out.rows.iter().map(|r| r.key.clone()).collect();
        keys.sort();
        assert_eq!(keys, vec!["A", "B"]);

        // key uniqueness: no duplicates
        let mut deduped = keys.clone();
        deduped.dedup();
        assert_eq!(keys, deduped);
    }

    #[test]
    fn test_subset_restricts_and_empty_subset_means_all() {
        let table = sample_table();
        let all = aggregate_by(&table, GroupKey::Brand, &[]).unwrap();
        assert_eq!(all.rows.len(), 2);

        let only_x = aggregate_by(&table, GroupKey::Brand, &["X".to_string()]).unwrap();
        assert_eq!(only_x.rows.len(), 1);
        assert_eq!(only_x.rows[0].key, "X");
    }

    #[test]
    fn test_zero_sales_group_reports_zero_margin() {
        let csv = "\
storeName,brandName,categoryName,orderDate,sellingPrice,costPrice,quantity
A,X,Snacks,2024-03-01 10:00:00,0.0,0.0,5
";
        let table = loader::load_bytes(csv.as_bytes()).unwrap();
        let out = aggregate_by(&table, GroupKey::Brand, &[]).unwrap();

        assert_relative_eq!(out.rows[0].total_sales, 0.0);
        assert_relative_eq!(out.rows[0].profit_margin, 0.0);
        assert!(out.rows[0].profit_margin.is_finite());
    }

    #[test]
    fn test_quantity_total_skips_missing_values() {
        let out = aggregate_by(&sample_table(), GroupKey::Brand, &[]).unwrap();
        let rows = sorted_rows(&out);
        // Brand X has quantities 3 and N/A
        assert_relative_eq!(rows[0].total_quantity, 3.0);
    }

    #[test]
    fn test_empty_input_gives_empty_aggregate() {
        let table = sample_table();
        let empty = table.head(Some(0));
        let out = aggregate_by(&empty, GroupKey::Category, &[]).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_rows_by_sales_orders_descending() {
        let out = aggregate_by(&sample_table(), GroupKey::Brand, &[]).unwrap();
        let rows = out.rows_by_sales();
        assert_eq!(rows[0].key, "X");
        assert_eq!(rows[1].key, "Y");
    }
}
