//! Loading a billing export from disk.
//!
//! The file size is checked against [`InputLimits`] before any byte is read,
//! then the content goes through the normalizer.

use std::path::Path;
use std::time::Instant;

use tracing::{debug, warn};

use insights_core::error::{InsightsError, Result};
use insights_core::models::{InputLimits, PayoutTable};

use crate::normalizer;

/// A normalized table together with how it was obtained.
#[derive(Debug, Clone)]
pub struct LoadedExport {
    pub table: PayoutTable,
    pub bytes: u64,
    pub load_time_ms: u64,
}

/// Read and normalize the JSON export at `path`.
///
/// Fails with [`InsightsError::TooLargeInput`] when the file exceeds
/// `limits.max_bytes`, with [`InsightsError::FileRead`] when it cannot be
/// read, and with [`InsightsError::MalformedInput`] when it is not a valid
/// export.
pub fn read_export(path: &Path, limits: &InputLimits) -> Result<LoadedExport> {
    let start = Instant::now();

    let metadata = std::fs::metadata(path).map_err(|source| InsightsError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    let bytes = metadata.len();
    if bytes > limits.max_bytes {
        warn!(
            "Rejecting {}: {} bytes exceeds limit of {}",
            path.display(),
            bytes,
            limits.max_bytes
        );
        return Err(InsightsError::TooLargeInput {
            actual: bytes,
            limit: limits.max_bytes,
            unit: "bytes",
        });
    }

    let raw = std::fs::read_to_string(path).map_err(|source| match source.kind() {
        std::io::ErrorKind::InvalidData => {
            InsightsError::MalformedInput(format!("{} is not valid UTF-8", path.display()))
        }
        _ => InsightsError::FileRead {
            path: path.to_path_buf(),
            source,
        },
    })?;

    let table = normalizer::normalize_with_limits(&raw, limits)?;
    let load_time_ms = start.elapsed().as_millis() as u64;

    debug!(
        "Loaded {} rows ({} bytes) from {} in {}ms",
        table.len(),
        bytes,
        path.display(),
        load_time_ms
    );

    Ok(LoadedExport {
        table,
        bytes,
        load_time_ms,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
