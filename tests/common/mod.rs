//! Shared fixtures for the integration suite.
#![allow(dead_code)]

use std::sync::Arc;

use appraisal_core::models::{
    AdjustmentInput, AnalysisType, Approach, ApproachType, CompAdjustmentMode, CompInput,
    ComparisonBasis, CompType, LandDimension, SubjectProperty, Zoning,
};
use appraisal_core::store::{Datastore, MemoryStore};
use chrono::Utc;

pub struct Fixture {
    pub store: Arc<MemoryStore>,
    pub ds: Datastore,
}

pub fn fixture() -> Fixture {
    let store = MemoryStore::new();
    Fixture {
        ds: store.datastore(),
        store,
    }
}

pub fn zoning(id: i64, label: &str, sq_ft: f64) -> Zoning {
    Zoning {
        id,
        label: label.to_string(),
        sq_ft,
        unit: 0.0,
        bed: 0.0,
        weight_sf: 100.0,
    }
}

pub async fn land_only_subject(ds: &Datastore, land_size: f64) -> SubjectProperty {
    ds.subject_properties
        .create(SubjectProperty {
            id: 0,
            comp_type: CompType::LandOnly,
            land_size,
            land_dimension: LandDimension::Sf,
            building_size: 0.0,
            analysis_type: AnalysisType::PriceSf,
            zonings: vec![],
        })
        .await
        .unwrap()
}

pub async fn improved_subject(ds: &Datastore, zonings: Vec<Zoning>) -> SubjectProperty {
    ds.subject_properties
        .create(SubjectProperty {
            id: 0,
            comp_type: CompType::BuildingWithLand,
            land_size: 0.0,
            land_dimension: LandDimension::Sf,
            building_size: zonings.iter().map(|z| z.sq_ft).sum(),
            analysis_type: AnalysisType::PriceSf,
            zonings,
        })
        .await
        .unwrap()
}

pub async fn create_approach(
    ds: &Datastore,
    subject_property_id: i64,
    approach_type: ApproachType,
) -> Approach {
    ds.approaches
        .create(Approach {
            id: 0,
            subject_property_id,
            approach_type,
            comparison_basis: ComparisonBasis::Sf,
            weight: 1.0,
            comp_adjustment_mode: CompAdjustmentMode::Percent,
            updated_at: Utc::now(),
        })
        .await
        .unwrap()
}

pub fn comp_input(id: Option<i64>, base_price: f64, weight: f64) -> CompInput {
    CompInput {
        id,
        base_price,
        weight,
        note: None,
        comps_adjustments: vec![],
        comps_qualitative_adjustments: vec![],
    }
}

pub fn adj(key: &str, value: f64) -> AdjustmentInput {
    AdjustmentInput {
        adj_key: key.to_string(),
        adj_value: value,
    }
}
