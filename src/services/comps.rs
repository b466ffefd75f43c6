//! Comp grid synchronization.
//!
//! Comps are keyed by row id; `id: None` (or an id the server no longer
//! knows) creates a fresh row. Each retained or created comp then has
//! its own adjustment children reconciled; deleted comps lose their
//! children before the row itself goes. The quantitative adjustments in
//! the desired state are folded into `total_adjustment`/`adjusted_psf`
//! before the row is written, so the persisted comp always carries its
//! derived figures.

use std::collections::HashSet;

use futures_util::future::{join_all, BoxFuture};

use crate::models::{
    AdjustmentInput, AdjustmentOwner, Approach, Comp, CompAdjustmentMode, CompInput,
    QualitativeAdjustmentInput,
};
use crate::numeric::{round2, safe_div};
use crate::services::adjustments::{sync_qualitative, sync_quantitative};
use crate::services::reconcile::{reconcile, MissingKey};
use crate::store::Datastore;

/// Apply a desired adjustment list to a base price, returning
/// `(total_adjustment, adjusted_psf)`. Blank-keyed rows are ignored,
/// matching the adjustment sync's own filter.
pub fn materialize_adjustments(
    base_price: f64,
    adjustments: &[AdjustmentInput],
    mode: CompAdjustmentMode,
) -> (f64, f64) {
    let sum: f64 = adjustments
        .iter()
        .filter(|a| !a.adj_key.trim().is_empty())
        .map(|a| a.adj_value)
        .sum();
    let adjusted = match mode {
        CompAdjustmentMode::Percent => base_price * (1.0 + sum / 100.0),
        CompAdjustmentMode::Dollar => base_price + sum,
    };
    let adjusted = round2(adjusted);
    (round2(adjusted - base_price), adjusted)
}

/// Weight-normalized mean of the comps' adjusted PSF. Falls back to the
/// simple mean when all weights are zero, and to 0 with no comps.
pub fn weighted_average_psf(comps: &[Comp]) -> f64 {
    if comps.is_empty() {
        return 0.0;
    }
    let total_weight: f64 = comps.iter().map(|c| c.weight).sum();
    if total_weight == 0.0 {
        let sum: f64 = comps.iter().map(|c| c.adjusted_psf).sum();
        return safe_div(sum, comps.len() as f64);
    }
    let weighted: f64 = comps.iter().map(|c| c.adjusted_psf * c.weight).sum();
    weighted / total_weight
}

#[derive(Clone)]
struct DesiredComp {
    id: Option<i64>,
    order: i32,
    base_price: f64,
    weight: f64,
    note: Option<String>,
    total_adjustment: f64,
    adjusted_psf: f64,
    adjustments: Vec<AdjustmentInput>,
    qualitative: Vec<QualitativeAdjustmentInput>,
}

impl DesiredComp {
    fn row(&self, id: i64, approach_id: i64) -> Comp {
        Comp {
            id,
            approach_id,
            order: self.order,
            base_price: self.base_price,
            weight: self.weight,
            total_adjustment: self.total_adjustment,
            adjusted_psf: self.adjusted_psf,
            note: self.note.clone(),
            updated_at: chrono::Utc::now(),
        }
    }
}

async fn sync_children(
    ds: &Datastore,
    comp_id: i64,
    adjustments: &[AdjustmentInput],
    qualitative: &[QualitativeAdjustmentInput],
) -> Vec<String> {
    let owner = AdjustmentOwner::Comp(comp_id);
    let mut errors = sync_quantitative(ds, owner, adjustments).await;
    errors.extend(sync_qualitative(ds, owner, qualitative).await);
    errors
}

/// Reconcile an approach's comp grid against the desired state.
/// Returns error messages; an empty vec means full success.
pub async fn sync_comps(
    ds: &Datastore,
    approach: &Approach,
    desired: Vec<CompInput>,
) -> Vec<String> {
    let existing = match ds.comps.find_all(approach.id).await {
        Ok(rows) => rows,
        Err(e) => {
            tracing::error!(approach_id = approach.id, error = %e, "failed to load comps");
            return vec![format!("comps: {e}")];
        }
    };

    // Display order and derived figures are fixed before diffing.
    let desired: Vec<DesiredComp> = desired
        .into_iter()
        .enumerate()
        .map(|(i, input)| {
            let (total_adjustment, adjusted_psf) = materialize_adjustments(
                input.base_price,
                &input.comps_adjustments,
                approach.comp_adjustment_mode,
            );
            DesiredComp {
                id: input.id,
                order: (i + 1) as i32,
                base_price: input.base_price,
                weight: input.weight,
                note: input.note,
                total_adjustment,
                adjusted_psf,
                adjustments: input.comps_adjustments,
                qualitative: input.comps_qualitative_adjustments,
            }
        })
        .collect();

    let existing_ids: HashSet<i64> = existing.iter().map(|c| c.id).collect();
    let recon = reconcile(
        &existing,
        desired.clone(),
        MissingKey::Add,
        |e| e.id,
        |d| d.id.filter(|id| existing_ids.contains(id)),
        |e, d| {
            e.order == d.order
                && e.base_price == d.base_price
                && e.weight == d.weight
                && e.note == d.note
                && e.total_adjustment == d.total_adjustment
                && e.adjusted_psf == d.adjusted_psf
        },
    );
    let changed: HashSet<i64> = recon.to_update.iter().filter_map(|d| d.id).collect();

    let approach_id = approach.id;
    let mut ops: Vec<BoxFuture<'static, Vec<String>>> = Vec::new();
    let mut dispatched: HashSet<i64> = HashSet::new();

    for comp in desired {
        let ds = ds.clone();
        match comp.id.filter(|id| existing_ids.contains(id)) {
            Some(id) => {
                // First occurrence wins, matching the diff itself.
                if !dispatched.insert(id) {
                    continue;
                }
                // Retained: write the row only when a field changed, but
                // always keep its children reconciled.
                let update_row = changed.contains(&id);
                ops.push(Box::pin(async move {
                    let mut errors = Vec::new();
                    if update_row {
                        if let Err(e) = ds.comps.update(&comp.row(id, approach_id)).await {
                            tracing::error!(comp_id = id, error = %e, "comp update failed");
                            errors.push(format!("comp {id}: {e}"));
                        }
                    }
                    errors
                        .extend(sync_children(&ds, id, &comp.adjustments, &comp.qualitative).await);
                    errors
                }));
            }
            None => {
                ops.push(Box::pin(async move {
                    match ds.comps.create(comp.row(0, approach_id)).await {
                        Ok(created) => {
                            sync_children(&ds, created.id, &comp.adjustments, &comp.qualitative)
                                .await
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "comp create failed");
                            vec![format!("comp create: {e}")]
                        }
                    }
                }));
            }
        }
    }

    for id in recon.to_delete {
        let ds = ds.clone();
        // Children go first so a failed comp delete never orphans them.
        ops.push(Box::pin(async move {
            let mut errors = Vec::new();
            let owner = AdjustmentOwner::Comp(id);
            if let Err(e) = ds.quantitative_adjustments.delete_all(owner).await {
                errors.push(format!("comp {id} adjustments: {e}"));
            }
            if let Err(e) = ds.qualitative_adjustments.delete_all(owner).await {
                errors.push(format!("comp {id} qualitative adjustments: {e}"));
            }
            if errors.is_empty() {
                if let Err(e) = ds.comps.delete(id).await {
                    errors.push(format!("comp {id}: {e}"));
                }
            }
            for e in &errors {
                tracing::error!(comp_id = id, error = %e, "comp delete failed");
            }
            errors
        }));
    }

    join_all(ops).await.into_iter().flatten().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adj(key: &str, value: f64) -> AdjustmentInput {
        AdjustmentInput {
            adj_key: key.to_string(),
            adj_value: value,
        }
    }

    #[test]
    fn percent_mode_scales_the_base_price() {
        let (total, adjusted) =
            materialize_adjustments(100.0, &[adj("location", 5.0), adj("age", -10.0)], CompAdjustmentMode::Percent);
        assert_eq!(adjusted, 95.0);
        assert_eq!(total, -5.0);
    }

    #[test]
    fn dollar_mode_adds_to_the_base_price() {
        let (total, adjusted) =
            materialize_adjustments(100.0, &[adj("location", 5.0), adj("age", -10.0)], CompAdjustmentMode::Dollar);
        assert_eq!(adjusted, 95.0);
        assert_eq!(total, -5.0);
    }

    #[test]
    fn blank_keys_do_not_contribute() {
        let (_, adjusted) =
            materialize_adjustments(100.0, &[adj("", 50.0), adj("x", 10.0)], CompAdjustmentMode::Dollar);
        assert_eq!(adjusted, 110.0);
    }

    #[test]
    fn weighted_average_normalizes_by_total_weight() {
        let comp = |psf: f64, weight: f64| Comp {
            id: 0,
            approach_id: 1,
            order: 1,
            base_price: psf,
            weight,
            total_adjustment: 0.0,
            adjusted_psf: psf,
            note: None,
            updated_at: chrono::Utc::now(),
        };
        assert_eq!(weighted_average_psf(&[]), 0.0);
        assert_eq!(weighted_average_psf(&[comp(10.0, 3.0), comp(20.0, 1.0)]), 12.5);
        // all-zero weights fall back to the simple mean
        assert_eq!(weighted_average_psf(&[comp(10.0, 0.0), comp(20.0, 0.0)]), 15.0);
    }
}
