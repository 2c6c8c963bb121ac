//! Record normalization: nested billing export → flat [`PayoutTable`].
//!
//! Every record carries flat top-level fields plus two nested objects,
//! `subscription` (plan info) and `entity` (customer and API info).  The
//! nested objects are flattened against a fixed schema; fields outside the
//! schema, including every `__typename` discriminator, are ignored.  Because
//! the projected column names are fixed and disjoint, a nested field can
//! never overwrite a top-level column.

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use insights_core::error::{InsightsError, Result};
use insights_core::models::{InputLimits, PayoutRecord, PayoutTable, UNDEFINED};
use insights_core::timestamps::TimestampParser;

// ── Raw schema ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRecord {
    created_at: Value,
    total_amount: Option<f64>,
    payout_amount: Option<f64>,
    paid: Option<bool>,
    paidout: Option<bool>,
    additional_amount: Option<f64>,
    refunded: Option<bool>,
    refunded_amount: Option<f64>,
    id: Option<String>,
    subscription: RawSubscription,
    entity: RawEntity,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSubscription {
    billing_plan_version: Option<RawPlanVersion>,
}

#[derive(Debug, Deserialize)]
struct RawPlanVersion {
    price: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawEntity {
    name: Option<String>,
    api: Option<RawApi>,
}

#[derive(Debug, Deserialize)]
struct RawApi {
    name: Option<String>,
}

/// Nested objects that must be JSON objects, as `(parent, child)` paths.
/// A `None` child means the parent itself is required.
const OBJECT_PATHS: [(&str, Option<&str>); 4] = [
    ("subscription", None),
    ("entity", None),
    ("subscription", Some("billingPlanVersion")),
    ("entity", Some("api")),
];

// ── Public API ────────────────────────────────────────────────────────────────

/// Normalize a JSON export using the default [`InputLimits`].
pub fn normalize(raw: &str) -> Result<PayoutTable> {
    normalize_with_limits(raw, &InputLimits::default())
}

/// Normalize a JSON export, rejecting documents beyond `limits`.
///
/// Any failure yields [`InsightsError::MalformedInput`] or
/// [`InsightsError::TooLargeInput`] and no table at all.
pub fn normalize_with_limits(raw: &str, limits: &InputLimits) -> Result<PayoutTable> {
    let bytes = raw.len() as u64;
    if bytes > limits.max_bytes {
        warn!(
            "rejecting upload of {} bytes (limit {})",
            bytes, limits.max_bytes
        );
        return Err(InsightsError::TooLargeInput {
            actual: bytes,
            limit: limits.max_bytes,
            unit: "bytes",
        });
    }

    let value: Value = serde_json::from_str(raw)?;
    normalize_value(value, limits)
}

/// Normalize an already-parsed JSON document.
pub fn normalize_value(value: Value, limits: &InputLimits) -> Result<PayoutTable> {
    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(InsightsError::MalformedInput(format!(
                "expected a top-level array of records, found {}",
                kind_of(&other)
            )))
        }
    };

    let count = items.len() as u64;
    if count > limits.max_rows {
        warn!(
            "rejecting upload of {} records (limit {})",
            count, limits.max_rows
        );
        return Err(InsightsError::TooLargeInput {
            actual: count,
            limit: limits.max_rows,
            unit: "rows",
        });
    }

    let rows = items
        .into_iter()
        .enumerate()
        .map(|(index, item)| normalize_record(index, item))
        .collect::<Result<Vec<_>>>()?;

    debug!("normalized {} records", rows.len());
    Ok(PayoutTable::new(rows))
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Flatten one raw record, naming `index` in any error.
fn normalize_record(index: usize, item: Value) -> Result<PayoutRecord> {
    let malformed =
        |msg: String| InsightsError::MalformedInput(format!("record {}: {}", index, msg));

    if !item.is_object() {
        return Err(malformed(format!("expected an object, found {}", kind_of(&item))));
    }
    check_nested_objects(&item).map_err(malformed)?;

    let raw: RawRecord = serde_json::from_value(item).map_err(|e| malformed(e.to_string()))?;

    let created_at = TimestampParser::parse(&raw.created_at)
        .ok_or_else(|| malformed(format!("unparseable createdAt {}", raw.created_at)))?;

    let customer = raw
        .entity
        .name
        .unwrap_or_else(|| UNDEFINED.to_string());
    let endpoint = raw
        .entity
        .api
        .and_then(|api| api.name)
        .unwrap_or_else(|| UNDEFINED.to_string());
    let plan_price = raw
        .subscription
        .billing_plan_version
        .and_then(|plan| plan.price);

    Ok(PayoutRecord {
        created_at,
        total_amount: raw.total_amount,
        payout_amount: raw.payout_amount,
        paid: raw.paid,
        paidout: raw.paidout,
        additional_amount: raw.additional_amount,
        refunded: raw.refunded,
        refunded_amount: raw.refunded_amount,
        id: raw.id,
        plan_price,
        customer,
        endpoint,
    })
}

/// Require `subscription` and `entity` to be objects, and their optional
/// children to be objects when present and non-null.
///
/// serde would otherwise accept a JSON array in place of a struct.
fn check_nested_objects(item: &Value) -> std::result::Result<(), String> {
    for (parent, child) in OBJECT_PATHS {
        let parent_value = item.get(parent);
        match child {
            None => match parent_value {
                Some(v) if v.is_object() => {}
                Some(v) => {
                    return Err(format!(
                        "`{}` must be an object, found {}",
                        parent,
                        kind_of(v)
                    ))
                }
                None => return Err(format!("missing field `{}`", parent)),
            },
            Some(child) => {
                let nested = parent_value.and_then(|p| p.get(child));
                if let Some(v) = nested {
                    if !v.is_object() && !v.is_null() {
                        return Err(format!(
                            "`{}.{}` must be an object, found {}",
                            parent,
                            child,
                            kind_of(v)
                        ));
                    }
                }
            }
        }
    }
    Ok(())
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
