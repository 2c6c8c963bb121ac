//! Row selection over a normalized [`PayoutTable`].
//!
//! A row passes when it satisfies every active predicate: inside the date
//! range, endpoint in the endpoint set, customer in the customer set.  An
//! empty set is a wildcard and never excludes anything.

use std::collections::BTreeSet;

use tracing::debug;

use insights_core::models::{DateRange, FilterSelection, PayoutRecord, PayoutTable};

/// Return a new table holding the rows of `table` that match `selection`,
/// in their original order.
pub fn filter(table: &PayoutTable, selection: &FilterSelection) -> PayoutTable {
    let filtered: PayoutTable = table
        .iter()
        .filter(|record| matches(record, selection))
        .cloned()
        .collect();

    debug!(
        "filter kept {} of {} rows (range: {:?}, endpoints: {}, customers: {})",
        filtered.len(),
        table.len(),
        selection.date_range,
        selection.endpoints.len(),
        selection.customers.len()
    );

    filtered
}

/// Positional form of [`filter`].
pub fn filter_by<S: AsRef<str>>(
    table: &PayoutTable,
    date_range: Option<DateRange>,
    endpoints: &[S],
    customers: &[S],
) -> PayoutTable {
    let selection = FilterSelection {
        date_range,
        endpoints: to_set(endpoints),
        customers: to_set(customers),
    };
    filter(table, &selection)
}

/// Whether a single record satisfies every predicate of `selection`.
pub fn matches(record: &PayoutRecord, selection: &FilterSelection) -> bool {
    if let Some(range) = &selection.date_range {
        if !range.contains(&record.created_at) {
            return false;
        }
    }
    if !selection.endpoints.is_empty() && !selection.endpoints.contains(&record.endpoint) {
        return false;
    }
    if !selection.customers.is_empty() && !selection.customers.contains(&record.customer) {
        return false;
    }
    true
}

fn to_set<S: AsRef<str>>(values: &[S]) -> BTreeSet<String> {
    values.iter().map(|v| v.as_ref().to_string()).collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn make_record(created: &str, payout: f64, customer: &str, endpoint: &str) -> PayoutRecord {
        PayoutRecord {
            created_at: NaiveDateTime::parse_from_str(created, "%Y-%m-%d %H:%M:%S").unwrap(),
            total_amount: Some(payout),
            payout_amount: Some(payout),
            paid: Some(true),
            paidout: Some(true),
            additional_amount: None,
            refunded: Some(false),
            refunded_amount: None,
            id: None,
            plan_price: None,
            customer: customer.to_string(),
            endpoint: endpoint.to_string(),
        }
    }

    fn sample_table() -> PayoutTable {
        PayoutTable::new(vec![
            make_record("2021-03-15 10:00:00", 100.0, "acme", "foo"),
            make_record("2022-06-01 09:00:00", 50.0, "globex", "bar"),
            make_record("2021-11-30 23:59:00", 25.0, "acme", "bar"),
            make_record("2021-12-31 18:00:00", 5.0, "undefined", "foo"),
        ])
    }

    fn range(from: (i32, u32, u32), to: (i32, u32, u32)) -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(from.0, from.1, from.2).unwrap(),
            NaiveDate::from_ymd_opt(to.0, to.1, to.2).unwrap(),
        )
        .unwrap()
    }

    const NONE: &[&str] = &[];

    #[test]
    fn test_unrestricted_selection_keeps_everything() {
        let table = sample_table();
        let out = filter(&table, &FilterSelection::default());
        assert_eq!(out, table);
    }

    #[test]
    fn test_full_range_with_empty_sets_is_wildcard() {
        let table = sample_table();
        let full = DateRange::covering(&table).unwrap();
        let out = filter_by(&table, Some(full), NONE, NONE);
        assert_eq!(out, table);
    }

    #[test]
    fn test_date_range_inclusive_both_ends() {
        let table = sample_table();
        let out = filter_by(&table, Some(range((2021, 3, 15), (2021, 12, 31))), NONE, NONE);
        let payouts: Vec<f64> = out.iter().map(|r| r.payout()).collect();
        assert_eq!(payouts, vec![100.0, 25.0, 5.0]);
    }

    #[test]
    fn test_endpoint_set_membership() {
        let table = sample_table();
        let out = filter_by(&table, None, &["bar"], NONE);
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|r| r.endpoint == "bar"));
    }

    #[test]
    fn test_customer_set_membership() {
        let table = sample_table();
        let out = filter_by(&table, None, NONE, &["acme", "globex"]);
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn test_predicates_are_conjunctive() {
        let table = sample_table();
        let out = filter_by(
            &table,
            Some(range((2021, 1, 1), (2021, 12, 31))),
            &["bar"],
            &["acme"],
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out.rows()[0].payout(), 25.0);
    }

    #[test]
    fn test_unknown_names_match_nothing() {
        let table = sample_table();
        let out = filter_by(&table, None, &["does-not-exist"], NONE);
        assert!(out.is_empty());
    }

    #[test]
    fn test_filter_preserves_order_and_never_duplicates() {
        let table = sample_table();
        let out = filter_by(&table, None, &["foo", "bar", "foo"], NONE);
        assert_eq!(out.len(), table.len());
        for (a, b) in out.iter().zip(table.iter()) {
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_output_is_subset_of_input() {
        let table = sample_table();
        let out = filter_by(&table, Some(range((2021, 6, 1), (2022, 12, 31))), &["bar"], NONE);
        assert!(out.iter().all(|r| table.rows().contains(r)));
        assert!(out.len() <= table.len());
    }

    #[test]
    fn test_filter_does_not_touch_input() {
        let table = sample_table();
        let before = table.clone();
        let _ = filter_by(&table, None, &["foo"], &["acme"]);
        assert_eq!(table, before);
    }

    #[test]
    fn test_filter_empty_table() {
        let out = filter_by(&PayoutTable::default(), None, &["foo"], NONE);
        assert!(out.is_empty());
    }
}
