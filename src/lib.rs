//! Appraisal reconciliation and valuation core.
//!
//! This library provides the domain core of an appraisal-report authoring
//! system: a generic keyed-collection reconciler applied recursively through
//! the Approach -> Comp -> Adjustment entity tree, and the cascading
//! valuation calculators for the Income, Cost and Sales/Lease approach
//! families. Persistence is an external collaborator reached through the
//! record-store traits in [`store`].

pub mod config;
pub mod error;
pub mod models;
pub mod numeric;
pub mod services;
pub mod store;
