//! Shared foundation for payout insights.
//!
//! Holds the error taxonomy, the normalized record and summary types,
//! timestamp parsing, display formatting, and command-line settings used by
//! every other crate in the workspace.

pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
pub mod timestamps;

pub use error::{InsightsError, Result};
