//! Comparable sales/leases and their adjustment rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Parent a (qualitative or quantitative) adjustment hangs off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AdjustmentOwner {
    /// Approach-level (subject property) adjustment.
    Approach(i64),
    /// Comp-level adjustment.
    Comp(i64),
}

/// One comparable row in an approach's comp grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comp {
    pub id: i64,
    pub approach_id: i64,
    /// 1-based display position.
    pub order: i32,
    pub base_price: f64,
    /// Fractional weight toward the averaged adjusted PSF.
    pub weight: f64,
    /// Signed delta applied on top of the base price.
    pub total_adjustment: f64,
    /// base_price with all quantitative adjustments applied.
    pub adjusted_psf: f64,
    pub note: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Quantitative adjustment, keyed by `adj_key` within its owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantitativeAdjustment {
    pub id: i64,
    pub owner: AdjustmentOwner,
    pub adj_key: String,
    pub adj_value: f64,
    pub order: i32,
}

/// Qualitative (narrative) adjustment, keyed by `adj_key` within its owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualitativeAdjustment {
    pub id: i64,
    pub owner: AdjustmentOwner,
    pub adj_key: String,
    pub adj_value: String,
    pub subject_property_value: Option<String>,
    pub order: i32,
}

/// Desired quantitative adjustment as sent by the client. Order is not
/// client-controlled; it is assigned from list position during sync.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AdjustmentInput {
    pub adj_key: String,
    #[serde(default)]
    pub adj_value: f64,
}

/// Desired qualitative adjustment.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QualitativeAdjustmentInput {
    pub adj_key: String,
    #[serde(default)]
    pub adj_value: String,
    #[serde(default)]
    pub subject_property_value: Option<String>,
}

/// Desired comp row. `id: None` always creates; a known id updates in
/// place and keeps the row's children reconciled.
#[derive(Debug, Clone, Deserialize)]
pub struct CompInput {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub base_price: f64,
    #[serde(default)]
    pub weight: f64,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub comps_adjustments: Vec<AdjustmentInput>,
    #[serde(default)]
    pub comps_qualitative_adjustments: Vec<QualitativeAdjustmentInput>,
}
