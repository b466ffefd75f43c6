//! Save and recalculation orchestration.
//!
//! `save_approach` is the write entry point: it patches the approach's
//! own scalars, reconciles whichever collections the request carries,
//! and reruns the family calculator so persisted figures stay coherent.
//! Child failures are collected, never fatal: the outcome reports them
//! while sibling operations proceed.

use serde::Serialize;
use tracing::instrument;

use crate::error::{AppError, AppResult};
use crate::models::{
    Approach, ApproachSaveRequest, ApproachType, CostApproach, IncomeApproach, IncomeSaveRequest,
    SalesApproach, SubjectProperty,
};
use crate::numeric::round2;
use crate::services::adjustments::{sync_qualitative, sync_quantitative};
use crate::services::comps::{sync_comps, weighted_average_psf};
use crate::services::cost::{recalculate_cost, sync_improvements};
use crate::services::income::{
    recalculate_income, sync_income_sources, sync_operating_expenses, sync_other_income,
};
use crate::services::sales::recalculate_sales;
use crate::store::Datastore;

/// Result of one approach save. `success` is false when any child
/// operation failed; the approach-level work itself either completed or
/// the save returned an error instead.
#[derive(Debug, Clone, Serialize)]
pub struct SaveOutcome {
    pub success: bool,
    pub errors: Vec<String>,
}

impl SaveOutcome {
    fn from_errors(errors: Vec<String>) -> SaveOutcome {
        SaveOutcome {
            success: errors.is_empty(),
            errors,
        }
    }
}

/// Recomputed family figures for one approach.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ApproachPatch {
    Income(IncomeApproach),
    Cost(CostApproach),
    Sales(SalesApproach),
}

/// One entry of a subject-wide recalculation.
#[derive(Debug, Clone, Serialize)]
pub struct RecalcResult {
    pub approach_id: i64,
    pub approach_type: ApproachType,
    pub patch: ApproachPatch,
}

async fn load_approach(ds: &Datastore, approach_id: i64) -> AppResult<Approach> {
    ds.approaches
        .find_one(approach_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Approach {approach_id}")))
}

async fn load_subject(ds: &Datastore, subject_property_id: i64) -> AppResult<SubjectProperty> {
    ds.subject_properties
        .find_one(subject_property_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Subject property {subject_property_id}")))
}

/// Apply requested scalar changes to the approach row itself.
async fn patch_approach_scalars(
    ds: &Datastore,
    approach: &mut Approach,
    request: &ApproachSaveRequest,
) -> AppResult<()> {
    let mut changed = false;
    if let Some(weight) = request.weight {
        if approach.weight != weight {
            approach.weight = weight;
            changed = true;
        }
    }
    if let Some(basis) = request.comparison_basis {
        if approach.comparison_basis != basis {
            approach.comparison_basis = basis;
            changed = true;
        }
    }
    if let Some(mode) = request.comp_adjustment_mode {
        if approach.comp_adjustment_mode != mode {
            approach.comp_adjustment_mode = mode;
            changed = true;
        }
    }
    if changed {
        ds.approaches.update(approach).await?;
    }
    Ok(())
}

/// Recompute the comp average and store it on the sales family row,
/// creating the row on first save.
async fn refresh_sales_family(ds: &Datastore, approach: &Approach) -> AppResult<SalesApproach> {
    let comps = ds.comps.find_all(approach.id).await?;
    let averaged = round2(weighted_average_psf(&comps));
    let row = match ds.sales_approaches.find_by_approach(approach.id).await? {
        Some(row) => row,
        None => {
            ds.sales_approaches
                .create(SalesApproach::new(approach.id))
                .await?
        }
    };
    if row.averaged_adjusted_psf != averaged {
        let mut next = row.clone();
        next.averaged_adjusted_psf = averaged;
        ds.sales_approaches.update(&next).await?;
        Ok(next)
    } else {
        Ok(row)
    }
}

/// Cost counterpart of [`refresh_sales_family`].
async fn refresh_cost_family(ds: &Datastore, approach: &Approach) -> AppResult<CostApproach> {
    let comps = ds.comps.find_all(approach.id).await?;
    let averaged = round2(weighted_average_psf(&comps));
    let row = match ds.cost_approaches.find_by_approach(approach.id).await? {
        Some(row) => row,
        None => {
            ds.cost_approaches
                .create(CostApproach::new(approach.id))
                .await?
        }
    };
    if row.averaged_adjusted_psf != averaged {
        let mut next = row.clone();
        next.averaged_adjusted_psf = averaged;
        ds.cost_approaches.update(&next).await?;
        Ok(next)
    } else {
        Ok(row)
    }
}

/// Income family row, created on first save.
async fn ensure_income_family(ds: &Datastore, approach: &Approach) -> AppResult<IncomeApproach> {
    match ds.income_approaches.find_by_approach(approach.id).await? {
        Some(row) => Ok(row),
        None => {
            ds.income_approaches
                .create(IncomeApproach::new(approach.id))
                .await
        }
    }
}

async fn apply_income_request(
    ds: &Datastore,
    approach: &Approach,
    request: &IncomeSaveRequest,
) -> AppResult<Vec<String>> {
    let income = ensure_income_family(ds, approach).await?;

    let mut next = income.clone();
    if let Some(v) = request.vacancy_pct {
        next.vacancy_pct = v;
    }
    if let Some(v) = request.monthly_capitalization_rate {
        next.monthly_capitalization_rate = v;
    }
    if let Some(v) = request.annual_capitalization_rate {
        next.annual_capitalization_rate = v;
    }
    if let Some(v) = request.basis_capitalization_rate {
        next.basis_capitalization_rate = v;
    }
    if next != income {
        ds.income_approaches.update(&next).await?;
    }

    let mut errors = Vec::new();
    if let Some(sources) = &request.income_sources {
        errors.extend(sync_income_sources(ds, income.id, sources).await);
    }
    if let Some(sources) = &request.other_income_sources {
        errors.extend(sync_other_income(ds, income.id, sources).await);
    }
    if let Some(expenses) = &request.operating_expenses {
        errors.extend(sync_operating_expenses(ds, income.id, expenses).await);
    }
    Ok(errors)
}

/// Persist one approach's desired state and rerun its calculator.
#[instrument(skip(ds, request))]
pub async fn save_approach(
    ds: &Datastore,
    approach_id: i64,
    request: ApproachSaveRequest,
) -> AppResult<SaveOutcome> {
    let mut approach = load_approach(ds, approach_id).await?;
    let subject = load_subject(ds, approach.subject_property_id).await?;

    patch_approach_scalars(ds, &mut approach, &request).await?;

    let mut errors = Vec::new();
    if let Some(adjustments) = &request.subject_property_adjustments {
        errors.extend(
            sync_quantitative(
                ds,
                crate::models::AdjustmentOwner::Approach(approach.id),
                adjustments,
            )
            .await,
        );
    }
    if let Some(adjustments) = &request.subject_qualitative_adjustments {
        errors.extend(
            sync_qualitative(
                ds,
                crate::models::AdjustmentOwner::Approach(approach.id),
                adjustments,
            )
            .await,
        );
    }

    if approach.approach_type.is_comp_based() {
        if let Some(comps) = request.comp_data {
            errors.extend(sync_comps(ds, &approach, comps).await);
        }
    }

    match approach.approach_type {
        ApproachType::Sale | ApproachType::Lease => {
            refresh_sales_family(ds, &approach).await?;
            recalculate_sales(ds, &subject, &approach).await?;
        }
        ApproachType::Cost => {
            let cost = refresh_cost_family(ds, &approach).await?;
            if let Some(improvements) = &request.improvements {
                errors.extend(sync_improvements(ds, cost.id, improvements).await);
            }
            recalculate_cost(ds, &subject, &approach).await?;
        }
        ApproachType::Income => {
            if let Some(income_request) = &request.income {
                errors.extend(apply_income_request(ds, &approach, income_request).await?);
            } else {
                ensure_income_family(ds, &approach).await?;
            }
            recalculate_income(ds, &subject, &approach).await?;
        }
        // Rent roll carries no calculator; scalars and approach-level
        // adjustments above are the whole save.
        ApproachType::RentRoll => {}
    }

    if !errors.is_empty() {
        tracing::warn!(
            approach_id,
            error_count = errors.len(),
            "approach save completed with child failures"
        );
    }
    Ok(SaveOutcome::from_errors(errors))
}

/// Rerun every calculator of a subject property after its fields (land
/// size, zonings, ...) changed. Rent-roll approaches are skipped.
#[instrument(skip(ds, subject), fields(subject_property_id = subject.id))]
pub async fn recalculate(
    ds: &Datastore,
    subject: &SubjectProperty,
) -> AppResult<Vec<RecalcResult>> {
    let mut results = Vec::new();
    for approach in ds.approaches.find_all(subject.id).await? {
        let patch = match approach.approach_type {
            ApproachType::Income => recalculate_income(ds, subject, &approach)
                .await?
                .map(ApproachPatch::Income),
            ApproachType::Cost => recalculate_cost(ds, subject, &approach)
                .await?
                .map(ApproachPatch::Cost),
            ApproachType::Sale | ApproachType::Lease => {
                recalculate_sales(ds, subject, &approach)
                    .await?
                    .map(ApproachPatch::Sales)
            }
            ApproachType::RentRoll => None,
        };
        if let Some(patch) = patch {
            results.push(RecalcResult {
                approach_id: approach.id,
                approach_type: approach.approach_type,
                patch,
            });
        }
    }
    Ok(results)
}

/// Weighted sum of every approach's indicated value. Approaches with no
/// family row (or a rent roll) contribute nothing.
pub async fn weighted_market_value(ds: &Datastore, subject_property_id: i64) -> AppResult<f64> {
    let mut total = 0.0;
    for approach in ds.approaches.find_all(subject_property_id).await? {
        let indicated = match approach.approach_type {
            ApproachType::Income => ds
                .income_approaches
                .find_by_approach(approach.id)
                .await?
                .map(|r| r.indicated_value_annual)
                .unwrap_or(0.0),
            ApproachType::Sale | ApproachType::Lease => ds
                .sales_approaches
                .find_by_approach(approach.id)
                .await?
                .map(|r| r.sales_approach_value)
                .unwrap_or(0.0),
            ApproachType::Cost => ds
                .cost_approaches
                .find_by_approach(approach.id)
                .await?
                .map(|r| r.total_cost_valuation)
                .unwrap_or(0.0),
            ApproachType::RentRoll => 0.0,
        };
        total += indicated * approach.weight;
    }
    Ok(round2(total))
}
