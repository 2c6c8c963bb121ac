//! Per-session state for the payout dashboard.
//!
//! A [`SessionContext`] owns the normalized table for one upload plus the
//! user's current filter choices.  The table is never modified; every call
//! to [`SessionContext::snapshot`] re-runs filter → aggregate → KPIs from
//! scratch, so the pipeline functions it calls stay pure.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{Duration, NaiveDate, Utc};
use serde::Serialize;
use tracing::debug;

use insights_core::error::Result;
use insights_core::models::{
    DateRange, Dimension, FilterSelection, InputLimits, Kpis, PayoutTable, SummaryTable,
};
use insights_data::{aggregator, export, filter, reader};

// ── Snapshot types ────────────────────────────────────────────────────────────

/// Metadata produced alongside a snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotMetadata {
    /// RFC 3339 time when this snapshot was generated.
    pub generated_at: String,
    /// Rows in the normalized table.
    pub rows_total: usize,
    /// Rows left after filtering.
    pub rows_filtered: usize,
    /// Milliseconds spent reading and normalizing the file.
    pub load_time_ms: u64,
    /// Wall-clock seconds spent filtering and aggregating.
    pub transform_time_seconds: f64,
}

/// Everything the presentation layer needs to draw one frame.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub filtered: PayoutTable,
    pub kpis: Kpis,
    pub by_endpoint: SummaryTable,
    pub by_customer: SummaryTable,
    pub by_month: SummaryTable,
    /// Distinct endpoint names of the full table, first-appearance order.
    pub endpoint_options: Vec<String>,
    /// Distinct customer names of the full table, first-appearance order.
    pub customer_options: Vec<String>,
    /// The active date range, `None` when the table is empty.
    pub date_range: Option<DateRange>,
    pub metadata: SnapshotMetadata,
}

impl DashboardSnapshot {
    pub fn summary(&self, dimension: Dimension) -> &SummaryTable {
        match dimension {
            Dimension::Endpoint => &self.by_endpoint,
            Dimension::Customer => &self.by_customer,
            Dimension::Month => &self.by_month,
        }
    }
}

// ── SessionContext ────────────────────────────────────────────────────────────

/// The explicit state of one dashboard session.
///
/// # Example
/// ```no_run
/// use std::path::Path;
/// use insights_core::models::InputLimits;
/// use insights_runtime::session::SessionContext;
///
/// let mut session = SessionContext::load(Path::new("export.json"), &InputLimits::default())?;
/// session.toggle_endpoint("foo");
/// let snapshot = session.snapshot();
/// println!("payout: {}", snapshot.kpis.payout_amount);
/// # Ok::<(), insights_core::InsightsError>(())
/// ```
#[derive(Debug, Clone)]
pub struct SessionContext {
    /// Normalized upload; read-only for the lifetime of the session.
    table: PayoutTable,
    selection: FilterSelection,
    /// File the table was read from, if any.
    source: Option<PathBuf>,
    load_time_ms: u64,
}

impl SessionContext {
    /// Start a session over an already-normalized table.
    ///
    /// The date range starts as the full range of the table, so no row is
    /// excluded initially.
    pub fn from_table(table: PayoutTable, source: Option<PathBuf>) -> Self {
        let selection = FilterSelection {
            date_range: DateRange::covering(&table),
            ..FilterSelection::default()
        };
        Self {
            table,
            selection,
            source,
            load_time_ms: 0,
        }
    }

    /// Read, validate, and normalize the export at `path`.
    pub fn load(path: &Path, limits: &InputLimits) -> Result<Self> {
        let loaded = reader::read_export(path, limits)?;
        let mut session = Self::from_table(loaded.table, Some(path.to_path_buf()));
        session.load_time_ms = loaded.load_time_ms;
        debug!(
            "Session started over {} rows from {}",
            session.table.len(),
            path.display()
        );
        Ok(session)
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn table(&self) -> &PayoutTable {
        &self.table
    }

    pub fn selection(&self) -> &FilterSelection {
        &self.selection
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Earliest and latest day of the full table.
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.table.date_bounds()
    }

    // ── Filter mutation ───────────────────────────────────────────────────

    pub fn set_date_range(&mut self, range: Option<DateRange>) {
        self.selection.date_range = range;
    }

    /// Move the start day by `days`, clamped to the table bounds and never
    /// past the end day.
    pub fn shift_start(&mut self, days: i64) {
        let Some((min, max)) = self.table.date_bounds() else {
            return;
        };
        let current = self.selection.date_range.unwrap_or(DateRange { from: min, to: max });
        let from = (current.from + Duration::days(days)).max(min).min(current.to);
        self.selection.date_range = Some(DateRange { from, to: current.to });
    }

    /// Move the end day by `days`, clamped to the table bounds and never
    /// before the start day.
    pub fn shift_end(&mut self, days: i64) {
        let Some((min, max)) = self.table.date_bounds() else {
            return;
        };
        let current = self.selection.date_range.unwrap_or(DateRange { from: min, to: max });
        let to = (current.to + Duration::days(days)).min(max).max(current.from);
        self.selection.date_range = Some(DateRange { from: current.from, to });
    }

    /// Add `name` to the endpoint set, or remove it if already there.
    /// Returns whether it is selected afterwards.
    pub fn toggle_endpoint(&mut self, name: &str) -> bool {
        toggle(&mut self.selection.endpoints, name)
    }

    /// Add `name` to the customer set, or remove it if already there.
    /// Returns whether it is selected afterwards.
    pub fn toggle_customer(&mut self, name: &str) -> bool {
        toggle(&mut self.selection.customers, name)
    }

    pub fn set_endpoints<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selection.endpoints = names.into_iter().map(Into::into).collect();
    }

    pub fn set_customers<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selection.customers = names.into_iter().map(Into::into).collect();
    }

    /// Back to the initial state: full date range, no set restrictions.
    pub fn clear_filters(&mut self) {
        self.selection = FilterSelection {
            date_range: DateRange::covering(&self.table),
            ..FilterSelection::default()
        };
    }

    // ── Pipeline ──────────────────────────────────────────────────────────

    /// The rows passing the current selection.
    pub fn filtered(&self) -> PayoutTable {
        filter::filter(&self.table, &self.selection)
    }

    /// Re-run the whole pipeline over the current selection.
    pub fn snapshot(&self) -> DashboardSnapshot {
        let start = Instant::now();

        let filtered = self.filtered();
        let by_endpoint = aggregator::aggregate(&filtered, Dimension::Endpoint);
        let by_customer = aggregator::aggregate(&filtered, Dimension::Customer);
        let by_month = aggregator::aggregate(&filtered, Dimension::Month);
        let kpis = aggregator::kpis(&filtered);

        let metadata = SnapshotMetadata {
            generated_at: Utc::now().to_rfc3339(),
            rows_total: self.table.len(),
            rows_filtered: filtered.len(),
            load_time_ms: self.load_time_ms,
            transform_time_seconds: start.elapsed().as_secs_f64(),
        };

        DashboardSnapshot {
            filtered,
            kpis,
            by_endpoint,
            by_customer,
            by_month,
            endpoint_options: self.table.endpoint_options(),
            customer_options: self.table.customer_options(),
            date_range: self.selection.date_range,
            metadata,
        }
    }

    /// Write the filtered rows as CSV to `path`.  Returns the row count.
    pub fn export_filtered(&self, path: &Path) -> Result<usize> {
        let filtered = self.filtered();
        export::export_csv(&filtered, path)?;
        Ok(filtered.len())
    }
}

fn toggle(set: &mut BTreeSet<String>, name: &str) -> bool {
    if set.remove(name) {
        false
    } else {
        set.insert(name.to_string());
        true
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
