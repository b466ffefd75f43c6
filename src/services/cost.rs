//! Cost approach: improvement sync and the depreciated replacement-cost
//! calculator.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use futures_util::future::BoxFuture;

use crate::error::AppResult;
use crate::models::{
    Approach, ComparisonBasis, CostApproach, Improvement, ImprovementInput, SubjectProperty,
    Zoning,
};
use crate::numeric::{resolve_land_size, round2, safe_div};
use crate::services::reconcile::{join_best_effort, reconcile, MissingKey};
use crate::store::Datastore;

/// Reconcile improvement lines against the desired list (keyed by row
/// id). Derived cost figures are left to the calculator.
pub async fn sync_improvements(
    ds: &Datastore,
    cost_approach_id: i64,
    desired: &[ImprovementInput],
) -> Vec<String> {
    let existing = match ds.improvements.find_all(cost_approach_id).await {
        Ok(rows) => rows,
        Err(e) => return vec![format!("improvements: {e}")],
    };
    let by_id: HashMap<i64, Improvement> = existing.iter().map(|r| (r.id, r.clone())).collect();

    let recon = reconcile(
        &existing,
        desired.to_vec(),
        MissingKey::Add,
        |e| e.id,
        |d| d.id.filter(|id| by_id.contains_key(id)),
        |e, d| {
            e.zoning_id == d.zoning_id
                && e.label == d.label
                && e.sf_area == d.sf_area
                && e.adjusted_psf == d.adjusted_psf
                && e.depreciation_pct == d.depreciation_pct
        },
    );

    let mut ops: Vec<BoxFuture<'static, AppResult<()>>> = Vec::new();
    for input in recon.to_add {
        let store = ds.improvements.clone();
        ops.push(Box::pin(async move {
            store
                .create(Improvement {
                    id: 0,
                    cost_approach_id,
                    zoning_id: input.zoning_id,
                    label: input.label,
                    sf_area: input.sf_area,
                    adjusted_psf: input.adjusted_psf,
                    depreciation_pct: input.depreciation_pct,
                    structure_cost: 0.0,
                    depreciation_amount: 0.0,
                    adjusted_cost: 0.0,
                    updated_at: Utc::now(),
                })
                .await
                .map(|_| ())
        }));
    }
    for input in recon.to_update {
        let store = ds.improvements.clone();
        let mut row = by_id[&input.id.unwrap_or_default()].clone();
        ops.push(Box::pin(async move {
            row.zoning_id = input.zoning_id;
            row.label = input.label;
            row.sf_area = input.sf_area;
            row.adjusted_psf = input.adjusted_psf;
            row.depreciation_pct = input.depreciation_pct;
            store.update(&row).await.map(|_| ())
        }));
    }
    for id in recon.to_delete {
        let store = ds.improvements.clone();
        ops.push(Box::pin(async move {
            store.delete(id).await.map(|_| ())
        }));
    }
    join_best_effort(ops, "improvements").await
}

/// Trim improvements tied to dropped zonings and provision a bare line
/// for every zoning without one.
async fn mirror_improvements_to_zonings(
    ds: &Datastore,
    cost_approach_id: i64,
    zonings: &[Zoning],
) -> AppResult<Vec<Improvement>> {
    let improvements = ds.improvements.find_all(cost_approach_id).await?;
    let zoning_ids: HashSet<i64> = zonings.iter().map(|z| z.id).collect();

    let mut mutated = false;
    for improvement in &improvements {
        if let Some(zoning_id) = improvement.zoning_id {
            if !zoning_ids.contains(&zoning_id) {
                ds.improvements.delete(improvement.id).await?;
                mutated = true;
            }
        }
    }

    let linked: HashSet<i64> = improvements.iter().filter_map(|i| i.zoning_id).collect();
    for zoning in zonings {
        if !linked.contains(&zoning.id) {
            ds.improvements
                .create(Improvement {
                    id: 0,
                    cost_approach_id,
                    zoning_id: Some(zoning.id),
                    label: zoning.label.clone(),
                    sf_area: zoning.sq_ft,
                    adjusted_psf: 0.0,
                    depreciation_pct: 0.0,
                    structure_cost: 0.0,
                    depreciation_amount: 0.0,
                    adjusted_cost: 0.0,
                    updated_at: Utc::now(),
                })
                .await?;
            mutated = true;
        }
    }

    if mutated {
        ds.improvements.find_all(cost_approach_id).await
    } else {
        Ok(improvements)
    }
}

/// Run the cost cascade for one approach. Returns the updated family
/// row, or `None` when the approach has no cost record yet.
pub async fn recalculate_cost(
    ds: &Datastore,
    subject: &SubjectProperty,
    approach: &Approach,
) -> AppResult<Option<CostApproach>> {
    let Some(cost) = ds.cost_approaches.find_by_approach(approach.id).await? else {
        return Ok(None);
    };
    let land_size = resolve_land_size(subject, approach.comparison_basis);
    let zoning_by_id: HashMap<i64, &Zoning> =
        subject.zonings.iter().map(|z| (z.id, z)).collect();

    let land_value = if cost.averaged_adjusted_psf != 0.0 {
        round2(cost.averaged_adjusted_psf * land_size)
    } else {
        0.0
    };

    let improvements = mirror_improvements_to_zonings(ds, cost.id, &subject.zonings).await?;

    let mut overall_replacement_cost = 0.0;
    let mut total_depreciation = 0.0;
    let mut total_sf_area = 0.0;
    let mut total_adjusted_cost = 0.0;
    let has_improvements = !improvements.is_empty();
    for improvement in improvements {
        let original = improvement.clone();
        let mut improvement = improvement;
        if let Some(zoning) = improvement.zoning_id.and_then(|id| zoning_by_id.get(&id)) {
            improvement.label = zoning.label.clone();
            if zoning.sq_ft != 0.0 {
                improvement.sf_area = zoning.sq_ft;
            } else {
                improvement.sf_area = subject.building_size;
            }
        }
        improvement.structure_cost = round2(improvement.sf_area * improvement.adjusted_psf);
        improvement.depreciation_amount =
            round2(improvement.structure_cost * improvement.depreciation_pct / 100.0);
        improvement.adjusted_cost = improvement.structure_cost - improvement.depreciation_amount;

        overall_replacement_cost += improvement.structure_cost;
        total_depreciation += improvement.depreciation_amount;
        total_sf_area += improvement.sf_area;
        total_adjusted_cost += improvement.adjusted_cost;
        if improvement != original {
            ds.improvements.update(&improvement).await?;
        }
    }

    let total_cost_valuation = if has_improvements {
        land_value + total_adjusted_cost
    } else {
        land_value
    };

    let mut indicated_value_psf = 0.0;
    let mut indicated_value_per_unit = 0.0;
    let mut indicated_value_per_bed = 0.0;
    match approach.comparison_basis {
        ComparisonBasis::Sf => {
            // Normalize over built area when any improvement exists,
            // otherwise over the subject's recorded building size.
            let divisor = if has_improvements {
                total_sf_area
            } else {
                subject.building_size
            };
            indicated_value_psf = round2(safe_div(total_cost_valuation, divisor));
        }
        ComparisonBasis::Unit => {
            indicated_value_per_unit = round2(safe_div(total_cost_valuation, land_size));
        }
        ComparisonBasis::Bed => {
            indicated_value_per_bed = round2(safe_div(total_cost_valuation, land_size));
        }
    }

    let mut next = cost.clone();
    next.land_value = land_value;
    next.overall_replacement_cost = round2(overall_replacement_cost);
    next.total_depreciation = round2(total_depreciation);
    next.improvements_total_sf_area = total_sf_area;
    next.improvements_total_adjusted_cost = round2(total_adjusted_cost);
    next.total_cost_valuation = round2(total_cost_valuation);
    next.indicated_value_psf = indicated_value_psf;
    next.indicated_value_per_unit = indicated_value_per_unit;
    next.indicated_value_per_bed = indicated_value_per_bed;

    if next != cost {
        ds.cost_approaches.update(&next).await?;
    }
    Ok(Some(next))
}
