//! Terminal UI layer for Payout Insights.
//!
//! Provides themes, header and KPI card components, the dashboard and table
//! views, and the main application event loop built on top of [`ratatui`].

pub mod app;
pub mod components;
pub mod dashboard_view;
pub mod table_view;
pub mod themes;

pub use insights_core as core;
