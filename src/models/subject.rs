//! Subject property and its zoning segments.

use serde::{Deserialize, Serialize};

use crate::models::approach::{AnalysisType, CompType, LandDimension};

/// One zoning segment of the subject property. Sizes are carried per
/// comparison basis; `weight_sf` is the segment's share (percent) of the
/// sales-approach value for improved SF subjects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zoning {
    pub id: i64,
    pub label: String,
    pub sq_ft: f64,
    pub unit: f64,
    pub bed: f64,
    pub weight_sf: f64,
}

/// Snapshot of the subject property a valuation is computed against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectProperty {
    pub id: i64,
    pub comp_type: CompType,
    pub land_size: f64,
    pub land_dimension: LandDimension,
    pub building_size: f64,
    pub analysis_type: AnalysisType,
    pub zonings: Vec<Zoning>,
}
