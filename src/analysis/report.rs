//! Report Runner
//! Runs the dashboard's fixed set of analyses over one filtered view of
//! the order table. Analyses are independent: each one's failure is
//! captured in its own report and never aborts the siblings.

use chrono::{DateTime, Utc};
use log::warn;
use polars::prelude::*;
use rayon::prelude::*;
use serde::Serialize;

use crate::analysis::{
    aggregate_by, filter, trend, AggregateTable, AnalysisError, GroupKey, TimeBucket, TrendPoint,
};
use crate::data::loader;

/// Resolved analysis parameters. `stores` is the resolved store selection
/// (the Session has already applied the empty-means-all default); the
/// brand/category subsets are comparison filters where empty means "no
/// restriction".
#[derive(Debug, Clone)]
pub struct ReportSettings {
    pub stores: Vec<String>,
    pub brands: Vec<String>,
    pub categories: Vec<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub enum ReportData {
    Aggregate(AggregateTable),
    Trend {
        bucket: TimeBucket,
        points: Vec<TrendPoint>,
    },
}

impl ReportData {
    pub fn is_empty(&self) -> bool {
        match self {
            ReportData::Aggregate(table) => table.is_empty(),
            ReportData::Trend { points, .. } => points.is_empty(),
        }
    }
}

/// Outcome of one analysis: its data, or the error that analysis hit.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub title: String,
    pub outcome: Result<ReportData, String>,
}

#[derive(Clone, Copy)]
enum Analysis {
    StorePerformance,
    BrandPerformance,
    CategoryBreakdown,
    ProfitByCategory,
    Trend(TimeBucket),
}

const ANALYSES: [(&str, Analysis); 7] = [
    ("Store performance", Analysis::StorePerformance),
    ("Brand performance", Analysis::BrandPerformance),
    ("Category breakdown", Analysis::CategoryBreakdown),
    ("Profit by category", Analysis::ProfitByCategory),
    ("Daily sales", Analysis::Trend(TimeBucket::Daily)),
    ("Sales by weekday", Analysis::Trend(TimeBucket::Weekday)),
    ("Sales by hour", Analysis::Trend(TimeBucket::Hourly)),
];

/// Run every analysis over `table` with the given settings.
pub fn run(table: &DataFrame, settings: &ReportSettings) -> Vec<Report> {
    // The two base views are shared by all analyses; a failure here is
    // reported by every card rather than aborting the run.
    let date_view = filter::filter_by_date(table, settings.start, settings.end);
    let store_view = filter::filter(table, &settings.stores, settings.start, settings.end);

    ANALYSES
        .par_iter()
        .map(|(title, analysis)| {
            let outcome = run_one(*analysis, &date_view, &store_view, settings);
            if let Err(err) = &outcome {
                warn!("analysis '{}' failed: {}", title, err);
            }
            Report {
                title: title.to_string(),
                outcome,
            }
        })
        .collect()
}

fn run_one(
    analysis: Analysis,
    date_view: &Result<DataFrame, AnalysisError>,
    store_view: &Result<DataFrame, AnalysisError>,
    settings: &ReportSettings,
) -> Result<ReportData, String> {
    let filtered = || store_view.as_ref().map_err(|e| e.to_string());

    match analysis {
        // Store comparison must not be narrowed by the store selection.
        Analysis::StorePerformance => {
            let view = date_view.as_ref().map_err(|e| e.to_string())?;
            aggregate(view, GroupKey::Store, &[])
        }
        Analysis::BrandPerformance => {
            aggregate(filtered()?, GroupKey::Brand, &settings.brands)
        }
        Analysis::CategoryBreakdown => {
            let view = filter::restrict(filtered()?, loader::CATEGORY, &settings.categories)
                .map_err(|e| e.to_string())?;
            aggregate(&view, GroupKey::Store, &[])
        }
        Analysis::ProfitByCategory => {
            aggregate(filtered()?, GroupKey::Category, &settings.categories)
        }
        Analysis::Trend(bucket) => {
            let points = trend(filtered()?, bucket).map_err(|e| e.to_string())?;
            Ok(ReportData::Trend { bucket, points })
        }
    }
}

fn aggregate(table: &DataFrame, key: GroupKey, subset: &[String]) -> Result<ReportData, String> {
    aggregate_by(table, key, subset)
        .map(ReportData::Aggregate)
        .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const SAMPLE: &str = "\
storeName,brandName,categoryName,orderDate,sellingPrice,costPrice,quantity
Alpha,X,Snacks,2024-03-01 10:00:00,10.0,4.0,3
Beta,Y,Drinks,2024-03-02 12:00:00,5.0,2.0,2
Beta,X,Snacks,2024-03-03 15:00:00,8.0,3.0,1
";

    fn sample_settings() -> ReportSettings {
        ReportSettings {
            stores: vec!["Alpha".to_string()],
            brands: Vec::new(),
            categories: Vec::new(),
            start: Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2024, 3, 31, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_every_analysis_reports() {
        let table = loader::load_bytes(SAMPLE.as_bytes()).unwrap();
        let reports = run(&table, &sample_settings());

        assert_eq!(reports.len(), ANALYSES.len());
        for report in &reports {
            assert!(report.outcome.is_ok(), "{} failed", report.title);
        }
    }

    #[test]
    fn test_store_performance_ignores_store_selection() {
        let table = loader::load_bytes(SAMPLE.as_bytes()).unwrap();
        let reports = run(&table, &sample_settings());

        let store_perf = reports
            .iter()
            .find(|r| r.title == "Store performance")
            .unwrap();
        let Ok(ReportData::Aggregate(agg)) = &store_perf.outcome else {
            panic!("expected aggregate data");
        };
        // Both stores present even though only Alpha is selected.
        assert_eq!(agg.rows.len(), 2);

        let brand_perf = reports
            .iter()
            .find(|r| r.title == "Brand performance")
            .unwrap();
        let Ok(ReportData::Aggregate(agg)) = &brand_perf.outcome else {
            panic!("expected aggregate data");
        };
        // Brand view is narrowed to Alpha's single brand.
        assert_eq!(agg.rows.len(), 1);
        assert_eq!(agg.rows[0].key, "X");
    }

    #[test]
    fn test_category_subset_narrows_breakdown() {
        let table = loader::load_bytes(SAMPLE.as_bytes()).unwrap();
        let mut settings = sample_settings();
        settings.stores = vec!["Alpha".to_string(), "Beta".to_string()];
        settings.categories = vec!["Drinks".to_string()];

        let reports = run(&table, &settings);
        let breakdown = reports
            .iter()
            .find(|r| r.title == "Category breakdown")
            .unwrap();
        let Ok(ReportData::Aggregate(agg)) = &breakdown.outcome else {
            panic!("expected aggregate data");
        };
        // Only Beta sells Drinks.
        assert_eq!(agg.rows.len(), 1);
        assert_eq!(agg.rows[0].key, "Beta");
    }

    #[test]
    fn test_one_failing_analysis_does_not_abort_the_others() {
        let table = loader::load_bytes(SAMPLE.as_bytes()).unwrap();
        // A table without the category column breaks the two category
        // analyses but nothing else.
        let crippled = table.drop(loader::CATEGORY).unwrap();
        let mut settings = sample_settings();
        settings.categories = vec!["Drinks".to_string()];

        let reports = run(&crippled, &settings);
        assert_eq!(reports.len(), ANALYSES.len());

        for report in &reports {
            let should_fail = report.title == "Category breakdown"
                || report.title == "Profit by category";
            assert_eq!(report.outcome.is_err(), should_fail, "{}", report.title);
        }
    }

    #[test]
    fn test_excluding_range_yields_empty_reports_not_errors() {
        let table = loader::load_bytes(SAMPLE.as_bytes()).unwrap();
        let mut settings = sample_settings();
        settings.start = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        settings.end = Utc.with_ymd_and_hms(2020, 12, 31, 0, 0, 0).unwrap();

        for report in run(&table, &settings) {
            let data = report.outcome.expect("analysis should not fail");
            assert!(data.is_empty());
        }
    }
}
