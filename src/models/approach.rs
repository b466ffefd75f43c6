//! Approach model and the desired-state request it is saved from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::comp::{AdjustmentInput, CompInput, QualitativeAdjustmentInput};
use crate::models::cost::ImprovementInput;
use crate::models::income::IncomeSaveRequest;

/// Valuation family an approach belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApproachType {
    Income,
    Sale,
    Cost,
    Lease,
    RentRoll,
}

impl ApproachType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApproachType::Income => "INCOME",
            ApproachType::Sale => "SALE",
            ApproachType::Cost => "COST",
            ApproachType::Lease => "LEASE",
            ApproachType::RentRoll => "RENT_ROLL",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "INCOME" => Some(ApproachType::Income),
            "SALE" => Some(ApproachType::Sale),
            "COST" => Some(ApproachType::Cost),
            "LEASE" => Some(ApproachType::Lease),
            "RENT_ROLL" => Some(ApproachType::RentRoll),
            _ => None,
        }
    }

    /// Families that carry a comp grid.
    pub fn is_comp_based(&self) -> bool {
        matches!(self, ApproachType::Sale | ApproachType::Lease | ApproachType::Cost)
    }
}

impl std::fmt::Display for ApproachType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unit of comparison the approach is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComparisonBasis {
    Sf,
    Unit,
    Bed,
}

impl ComparisonBasis {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonBasis::Sf => "SF",
            ComparisonBasis::Unit => "UNIT",
            ComparisonBasis::Bed => "BED",
        }
    }
}

/// Whether the subject is bare land or land with improvements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompType {
    LandOnly,
    BuildingWithLand,
}

/// Unit the subject's land size is recorded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LandDimension {
    Sf,
    Acre,
}

/// Price analysis unit for land-only subjects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnalysisType {
    PriceSf,
    PriceAcre,
}

/// How quantitative comp adjustments are applied to the base price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompAdjustmentMode {
    Percent,
    Dollar,
}

/// One valuation approach attached to a subject property. At most one
/// row exists per (subject_property_id, approach_type).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Approach {
    pub id: i64,
    pub subject_property_id: i64,
    pub approach_type: ApproachType,
    pub comparison_basis: ComparisonBasis,
    /// Fractional weight toward the reconciled market value.
    pub weight: f64,
    pub comp_adjustment_mode: CompAdjustmentMode,
    pub updated_at: DateTime<Utc>,
}

/// Desired-state tree for one approach save. Every section is optional;
/// an absent section leaves the corresponding records untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApproachSaveRequest {
    pub weight: Option<f64>,
    pub comparison_basis: Option<ComparisonBasis>,
    pub comp_adjustment_mode: Option<CompAdjustmentMode>,
    /// Approach-level quantitative adjustments.
    pub subject_property_adjustments: Option<Vec<AdjustmentInput>>,
    /// Approach-level qualitative adjustments.
    pub subject_qualitative_adjustments: Option<Vec<QualitativeAdjustmentInput>>,
    /// Full desired comp grid, in display order.
    pub comp_data: Option<Vec<CompInput>>,
    /// Income family scalars and child collections.
    pub income: Option<IncomeSaveRequest>,
    /// Cost family improvement rows.
    pub improvements: Option<Vec<ImprovementInput>>,
}

impl ApproachSaveRequest {
    /// Deserialize a request from its JSON boundary form.
    pub fn from_json(value: serde_json::Value) -> crate::error::AppResult<Self> {
        Ok(serde_json::from_value(value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approach_type_round_trips_through_strings() {
        for ty in [
            ApproachType::Income,
            ApproachType::Sale,
            ApproachType::Cost,
            ApproachType::Lease,
            ApproachType::RentRoll,
        ] {
            assert_eq!(ApproachType::parse(ty.as_str()), Some(ty));
        }
        assert_eq!(ApproachType::parse("MYSTERY"), None);
    }

    #[test]
    fn save_request_deserializes_partial_sections() {
        let req = ApproachSaveRequest::from_json(serde_json::json!({
            "weight": 0.35,
            "comp_data": [
                { "base_price": 12.5, "weight": 1.0,
                  "comps_adjustments": [{ "adj_key": "location", "adj_value": 5.0 }] }
            ]
        }))
        .unwrap();
        assert_eq!(req.weight, Some(0.35));
        let comps = req.comp_data.unwrap();
        assert_eq!(comps.len(), 1);
        assert_eq!(comps[0].id, None);
        assert_eq!(comps[0].comps_adjustments[0].adj_key, "location");
        assert!(req.income.is_none());
    }
}
