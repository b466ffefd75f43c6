//! Cost approach records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Cost family row. `averaged_adjusted_psf` is materialized from the
/// approach's comp grid; the remaining figures are calculator outputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostApproach {
    pub id: i64,
    pub approach_id: i64,
    pub averaged_adjusted_psf: f64,
    pub land_value: f64,
    pub overall_replacement_cost: f64,
    pub total_depreciation: f64,
    pub improvements_total_sf_area: f64,
    pub improvements_total_adjusted_cost: f64,
    pub total_cost_valuation: f64,
    pub indicated_value_psf: f64,
    pub indicated_value_per_unit: f64,
    pub indicated_value_per_bed: f64,
    pub updated_at: DateTime<Utc>,
}

impl CostApproach {
    pub fn new(approach_id: i64) -> Self {
        CostApproach {
            id: 0,
            approach_id,
            averaged_adjusted_psf: 0.0,
            land_value: 0.0,
            overall_replacement_cost: 0.0,
            total_depreciation: 0.0,
            improvements_total_sf_area: 0.0,
            improvements_total_adjusted_cost: 0.0,
            total_cost_valuation: 0.0,
            indicated_value_psf: 0.0,
            indicated_value_per_unit: 0.0,
            indicated_value_per_bed: 0.0,
            updated_at: Utc::now(),
        }
    }
}

/// One improvement (structure) line. `structure_cost`,
/// `depreciation_amount` and `adjusted_cost` are calculator outputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Improvement {
    pub id: i64,
    pub cost_approach_id: i64,
    pub zoning_id: Option<i64>,
    pub label: String,
    pub sf_area: f64,
    pub adjusted_psf: f64,
    pub depreciation_pct: f64,
    pub structure_cost: f64,
    pub depreciation_amount: f64,
    pub adjusted_cost: f64,
    pub updated_at: DateTime<Utc>,
}

/// Desired improvement line, keyed by row id.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ImprovementInput {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub zoning_id: Option<i64>,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub sf_area: f64,
    #[serde(default)]
    pub adjusted_psf: f64,
    #[serde(default)]
    pub depreciation_pct: f64,
}
