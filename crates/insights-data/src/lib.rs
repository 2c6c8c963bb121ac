//! Data layer for Payout Insights.
//!
//! Reads a billing export, flattens it into a [`core::models::PayoutTable`],
//! filters it, groups it, and writes it back out as CSV.

pub mod aggregator;
pub mod export;
pub mod filter;
pub mod normalizer;
pub mod reader;

pub use insights_core as core;

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use crate::aggregator::aggregate;
    use crate::core::models::{DateRange, Dimension};
    use crate::core::InsightsError;
    use crate::filter::filter_by;
    use crate::normalizer::normalize;

    const NONE: &[&str] = &[];

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_pipeline_year_filter_and_monthly_buckets() {
        let raw = r#"[
            {"createdAt": "2021-03-15T00:00:00Z", "payoutAmount": 100,
             "subscription": {"__typename": "Subscription", "billingPlanVersion": {"price": 1}},
             "entity": {"__typename": "Entity", "name": "a", "api": {"name": "foo"}}},
            {"createdAt": "2022-06-01T00:00:00Z", "payoutAmount": 50,
             "subscription": {"__typename": "Subscription", "billingPlanVersion": {"price": 1}},
             "entity": {"__typename": "Entity", "name": "b", "api": {"name": "bar"}}}
        ]"#;
        let table = normalize(raw).unwrap();
        assert_eq!(table.len(), 2);

        let year = DateRange::new(day(2021, 1, 1), day(2021, 12, 31)).unwrap();
        let filtered = filter_by(&table, Some(year), NONE, NONE);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered.rows()[0].endpoint, "foo");
        assert_eq!(filtered.rows()[0].payout(), 100.0);

        let months = aggregate(&table, Dimension::Month);
        assert_eq!(
            months.payout_series(),
            vec![("2021-03".to_string(), 100.0), ("2022-06".to_string(), 50.0)]
        );
    }

    #[test]
    fn test_pipeline_missing_customer_name_is_selectable() {
        let raw = r#"[
            {"createdAt": "2021-03-15T10:00:00", "payoutAmount": 7.5,
             "subscription": {"billingPlanVersion": {"price": 1}},
             "entity": {"api": {"name": "foo"}}},
            {"createdAt": "2021-03-16T10:00:00", "payoutAmount": 2.0,
             "subscription": {"billingPlanVersion": {"price": 1}},
             "entity": {"name": "acme", "api": {"name": "foo"}}}
        ]"#;
        let table = normalize(raw).unwrap();
        assert_eq!(table.rows()[0].customer, "undefined");

        let filtered = filter_by(&table, None, NONE, &["undefined"]);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered.rows()[0].payout(), 7.5);

        let customers = aggregate(&filtered, Dimension::Customer);
        assert_eq!(customers.payout_series(), vec![("undefined".to_string(), 7.5)]);
    }

    #[test]
    fn test_pipeline_empty_upload_yields_empty_results() {
        let table = normalize("[]").unwrap();
        assert!(table.is_empty());

        let filtered = filter_by(&table, None, NONE, NONE);
        assert!(filtered.is_empty());
        for dimension in [Dimension::Endpoint, Dimension::Customer, Dimension::Month] {
            assert!(aggregate(&filtered, dimension).is_empty());
        }
    }

    #[test]
    fn test_pipeline_bare_string_produces_no_table() {
        let result = normalize(r#""just a string""#);
        assert!(matches!(result, Err(InsightsError::MalformedInput(_))));
    }
}
