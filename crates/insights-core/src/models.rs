use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::InsightsError;

/// Value substituted for a missing customer or endpoint name.
pub const UNDEFINED: &str = "undefined";

/// Column names of the normalized table, in export order.
pub const COLUMNS: [&str; 12] = [
    "createdAt",
    "totalAmount",
    "payoutAmount",
    "paid",
    "paidout",
    "additionalAmount",
    "refunded",
    "refundedAmount",
    "id",
    "billingPlanVersion.price",
    "name",
    "api.name",
];

// ── PayoutRecord ──────────────────────────────────────────────────────────────

/// One flattened payout transaction.
///
/// Optional amounts stay `None` when the source value was absent or `null`;
/// they count as zero in every sum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoutRecord {
    /// Creation time with any UTC offset stripped (local wall clock).
    #[serde(rename = "createdAt")]
    pub created_at: NaiveDateTime,
    #[serde(rename = "totalAmount")]
    pub total_amount: Option<f64>,
    #[serde(rename = "payoutAmount")]
    pub payout_amount: Option<f64>,
    pub paid: Option<bool>,
    pub paidout: Option<bool>,
    #[serde(rename = "additionalAmount")]
    pub additional_amount: Option<f64>,
    pub refunded: Option<bool>,
    #[serde(rename = "refundedAmount")]
    pub refunded_amount: Option<f64>,
    pub id: Option<String>,
    /// Billing plan price, flattened from `subscription.billingPlanVersion.price`.
    #[serde(rename = "billingPlanVersion.price")]
    pub plan_price: Option<f64>,
    /// Customer name, flattened from `entity.name`.  Never empty-by-null.
    #[serde(rename = "name")]
    pub customer: String,
    /// API endpoint name, flattened from `entity.api.name`.
    #[serde(rename = "api.name")]
    pub endpoint: String,
}

impl PayoutRecord {
    /// Payout amount with `None` treated as zero.
    pub fn payout(&self) -> f64 {
        self.payout_amount.unwrap_or(0.0)
    }

    /// Total amount with `None` treated as zero.
    pub fn total(&self) -> f64 {
        self.total_amount.unwrap_or(0.0)
    }

    /// Calendar day of the creation timestamp.
    pub fn created_on(&self) -> NaiveDate {
        self.created_at.date()
    }

    /// `(year, month)` bucket of the creation timestamp.
    pub fn year_month(&self) -> (i32, u32) {
        (self.created_at.year(), self.created_at.month())
    }
}

// ── PayoutTable ───────────────────────────────────────────────────────────────

/// The normalized, analysis-ready table.
///
/// A table is a value: filtering and aggregation derive new tables or
/// summaries and never modify an existing one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PayoutTable {
    rows: Vec<PayoutRecord>,
}

impl PayoutTable {
    pub fn new(rows: Vec<PayoutRecord>) -> Self {
        Self { rows }
    }

    /// Column names, in export order.
    pub fn columns(&self) -> &'static [&'static str] {
        &COLUMNS
    }

    pub fn rows(&self) -> &[PayoutRecord] {
        &self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PayoutRecord> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct endpoint names in order of first appearance.
    pub fn endpoint_options(&self) -> Vec<String> {
        distinct_in_order(self.rows.iter().map(|r| r.endpoint.as_str()))
    }

    /// Distinct customer names in order of first appearance.
    pub fn customer_options(&self) -> Vec<String> {
        distinct_in_order(self.rows.iter().map(|r| r.customer.as_str()))
    }

    /// Earliest and latest calendar day present, or `None` for an empty table.
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let min = self.rows.iter().map(PayoutRecord::created_on).min()?;
        let max = self.rows.iter().map(PayoutRecord::created_on).max()?;
        Some((min, max))
    }
}

impl<'a> IntoIterator for &'a PayoutTable {
    type Item = &'a PayoutRecord;
    type IntoIter = std::slice::Iter<'a, PayoutRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

impl FromIterator<PayoutRecord> for PayoutTable {
    fn from_iter<I: IntoIterator<Item = PayoutRecord>>(iter: I) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}

fn distinct_in_order<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen: BTreeSet<&str> = BTreeSet::new();
    let mut out = Vec::new();
    for value in values {
        if seen.insert(value) {
            out.push(value.to_string());
        }
    }
    out
}

// ── Filters ───────────────────────────────────────────────────────────────────

/// Closed, day-granular date interval.
///
/// A timestamp matches when its calendar day lies in `[from, to]`, so the
/// whole of the `to` day is included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    /// Build a range, rejecting `from > to`.
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self, InsightsError> {
        if from > to {
            return Err(InsightsError::Config(format!(
                "date range start {} is after end {}",
                from, to
            )));
        }
        Ok(Self { from, to })
    }

    /// The smallest range containing every row of `table`.
    pub fn covering(table: &PayoutTable) -> Option<Self> {
        table
            .date_bounds()
            .map(|(from, to)| Self { from, to })
    }

    pub fn contains(&self, ts: &NaiveDateTime) -> bool {
        let day = ts.date();
        self.from <= day && day <= self.to
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} → {}", self.from, self.to)
    }
}

/// The user's current filter choices.
///
/// Empty endpoint or customer sets are wildcards: they never exclude a row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSelection {
    /// `None` means no date restriction.
    pub date_range: Option<DateRange>,
    pub endpoints: BTreeSet<String>,
    pub customers: BTreeSet<String>,
}

// ── Aggregation types ─────────────────────────────────────────────────────────

/// Grouping key of an aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Endpoint,
    Customer,
    Month,
}

impl Dimension {
    pub const ALL: [Dimension; 3] = [Dimension::Endpoint, Dimension::Customer, Dimension::Month];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Endpoint => "endpoint",
            Dimension::Customer => "customer",
            Dimension::Month => "month",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dimension {
    type Err = InsightsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "endpoint" | "api" => Ok(Dimension::Endpoint),
            "customer" | "client" => Ok(Dimension::Customer),
            "month" => Ok(Dimension::Month),
            other => Err(InsightsError::Config(format!("unknown dimension: {}", other))),
        }
    }
}

/// Sums of every numeric column over one group of rows.
///
/// Boolean flags are summed as counts of `true`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupTotals {
    pub total_amount: f64,
    pub payout_amount: f64,
    pub additional_amount: f64,
    pub refunded_amount: f64,
    pub plan_price: f64,
    pub paid: u32,
    pub paidout: u32,
    pub refunded: u32,
    pub rows: u32,
}

impl GroupTotals {
    /// Add a single record to the running totals.
    pub fn add_record(&mut self, record: &PayoutRecord) {
        self.total_amount += record.total_amount.unwrap_or(0.0);
        self.payout_amount += record.payout_amount.unwrap_or(0.0);
        self.additional_amount += record.additional_amount.unwrap_or(0.0);
        self.refunded_amount += record.refunded_amount.unwrap_or(0.0);
        self.plan_price += record.plan_price.unwrap_or(0.0);
        self.paid += u32::from(record.paid.unwrap_or(false));
        self.paidout += u32::from(record.paidout.unwrap_or(false));
        self.refunded += u32::from(record.refunded.unwrap_or(false));
        self.rows += 1;
    }
}

/// One group of a [`SummaryTable`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    /// Endpoint name, customer name, or `"YYYY-MM"`.
    pub key: String,
    pub totals: GroupTotals,
}

/// Result of grouping a table along one [`Dimension`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryTable {
    pub dimension: Dimension,
    pub rows: Vec<SummaryRow>,
}

impl SummaryTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// `(key, summed payout)` pairs, the shape every chart consumes.
    pub fn payout_series(&self) -> Vec<(String, f64)> {
        self.rows
            .iter()
            .map(|r| (r.key.clone(), r.totals.payout_amount))
            .collect()
    }

    /// Sum of payout across all groups.
    pub fn payout_total(&self) -> f64 {
        self.rows.iter().map(|r| r.totals.payout_amount).sum()
    }
}

/// Headline figures shown on the KPI cards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Kpis {
    pub total_amount: f64,
    pub payout_amount: f64,
    pub rows: usize,
}

// ── InputLimits ───────────────────────────────────────────────────────────────

/// Upper bounds applied to an upload before a table is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputLimits {
    pub max_bytes: u64,
    pub max_rows: u64,
}

impl InputLimits {
    pub const DEFAULT_MAX_BYTES: u64 = 64 * 1024 * 1024;
    pub const DEFAULT_MAX_ROWS: u64 = 500_000;
}

impl Default for InputLimits {
    fn default() -> Self {
        Self {
            max_bytes: Self::DEFAULT_MAX_BYTES,
            max_rows: Self::DEFAULT_MAX_ROWS,
        }
    }
}
