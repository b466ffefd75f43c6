//! Reconciliation and valuation services.

pub mod adjustments;
pub mod comps;
pub mod cost;
pub mod income;
pub mod orchestrator;
pub mod reconcile;
pub mod sales;

pub use orchestrator::{recalculate, save_approach, weighted_market_value, SaveOutcome};
