//! Runtime layer for Payout Insights.
//!
//! Holds the explicit per-session state that sits between the data layer
//! and the presentation layer.

pub mod session;

pub use insights_core as core;
pub use insights_data as data;
