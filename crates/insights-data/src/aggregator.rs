//! Grouped payout sums by endpoint, customer, and calendar month.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use insights_core::models::{
    Dimension, GroupTotals, Kpis, PayoutRecord, PayoutTable, SummaryRow, SummaryTable,
};

// ── Public functions ──────────────────────────────────────────────────────────

/// Aggregate `table` along `dimension`.
///
/// An empty table yields an empty [`SummaryTable`].
pub fn aggregate(table: &PayoutTable, dimension: Dimension) -> SummaryTable {
    match dimension {
        Dimension::Endpoint => PayoutAggregator::by_endpoint(table),
        Dimension::Customer => PayoutAggregator::by_customer(table),
        Dimension::Month => PayoutAggregator::by_month(table),
    }
}

/// Headline totals for the KPI cards.
pub fn kpis(table: &PayoutTable) -> Kpis {
    Kpis {
        total_amount: table.iter().map(PayoutRecord::total).sum(),
        payout_amount: table.iter().map(PayoutRecord::payout).sum(),
        rows: table.len(),
    }
}

// ── PayoutAggregator ──────────────────────────────────────────────────────────

/// Stateless helper that groups payout records.
pub struct PayoutAggregator;

impl PayoutAggregator {
    /// Group by endpoint name.  Rows are sorted by key ascending.
    pub fn by_endpoint(table: &PayoutTable) -> SummaryTable {
        let rows = Self::group_by(table, |r| r.endpoint.clone())
            .into_iter()
            .map(|(key, totals)| SummaryRow { key, totals })
            .collect();

        SummaryTable {
            dimension: Dimension::Endpoint,
            rows,
        }
    }

    /// Group by customer name, largest summed payout first.
    ///
    /// Equal payouts fall back to key ascending.
    pub fn by_customer(table: &PayoutTable) -> SummaryTable {
        let mut rows: Vec<SummaryRow> = Self::group_by(table, |r| r.customer.clone())
            .into_iter()
            .map(|(key, totals)| SummaryRow { key, totals })
            .collect();

        rows.sort_by(|a, b| by_payout_desc(a, b).then_with(|| a.key.cmp(&b.key)));

        SummaryTable {
            dimension: Dimension::Customer,
            rows,
        }
    }

    /// Group by `(year, month)` of the creation time, chronologically.
    ///
    /// Months without rows are absent; gaps are not zero-filled.  Keys are
    /// formatted `"YYYY-MM"`.
    pub fn by_month(table: &PayoutTable) -> SummaryTable {
        let rows = Self::group_by(table, PayoutRecord::year_month)
            .into_iter()
            .map(|((year, month), totals)| SummaryRow {
                key: format!("{:04}-{:02}", year, month),
                totals,
            })
            .collect();

        SummaryTable {
            dimension: Dimension::Month,
            rows,
        }
    }

    /// Sum up every group of a summary into one [`GroupTotals`].
    pub fn calculate_totals(summary: &SummaryTable) -> GroupTotals {
        let mut totals = GroupTotals::default();
        for row in &summary.rows {
            totals.total_amount += row.totals.total_amount;
            totals.payout_amount += row.totals.payout_amount;
            totals.additional_amount += row.totals.additional_amount;
            totals.refunded_amount += row.totals.refunded_amount;
            totals.plan_price += row.totals.plan_price;
            totals.paid += row.totals.paid;
            totals.paidout += row.totals.paidout;
            totals.refunded += row.totals.refunded;
            totals.rows += row.totals.rows;
        }
        totals
    }

    // ── Private ───────────────────────────────────────────────────────────────

    /// Generic grouping driver; the `BTreeMap` keeps keys sorted.
    fn group_by<K: Ord>(
        table: &PayoutTable,
        key_fn: impl Fn(&PayoutRecord) -> K,
    ) -> BTreeMap<K, GroupTotals> {
        let mut map: BTreeMap<K, GroupTotals> = BTreeMap::new();
        for record in table {
            map.entry(key_fn(record)).or_default().add_record(record);
        }
        map
    }
}

/// Descending order on summed payout.
fn by_payout_desc(a: &SummaryRow, b: &SummaryRow) -> Ordering {
    b.totals.payout_amount.total_cmp(&a.totals.payout_amount)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
