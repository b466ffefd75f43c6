//! Adjustment synchronization.
//!
//! Both adjustment flavors are keyed by `adj_key` within their owner
//! (an approach or a comp). `order` is the 1-based position in the list
//! as submitted; blank-keyed placeholder rows are dropped afterwards,
//! so a blank row leaves a gap in the persisted sequence.

use futures_util::future::BoxFuture;

use crate::models::{
    AdjustmentInput, AdjustmentOwner, QualitativeAdjustment, QualitativeAdjustmentInput,
    QuantitativeAdjustment,
};
use crate::services::reconcile::{join_best_effort, reconcile, MissingKey};
use crate::store::Datastore;

fn is_blank(key: &str) -> bool {
    key.trim().is_empty()
}

/// Reconcile an owner's quantitative adjustments against the desired
/// list. Returns error messages; an empty vec means full success.
pub async fn sync_quantitative(
    ds: &Datastore,
    owner: AdjustmentOwner,
    desired: &[AdjustmentInput],
) -> Vec<String> {
    let rows: Vec<QuantitativeAdjustment> = desired
        .iter()
        .enumerate()
        .filter(|(_, d)| !is_blank(&d.adj_key))
        .map(|(i, d)| QuantitativeAdjustment {
            id: 0,
            owner,
            adj_key: d.adj_key.clone(),
            adj_value: d.adj_value,
            order: (i + 1) as i32,
        })
        .collect();

    let existing = match ds.quantitative_adjustments.find_all(owner).await {
        Ok(rows) => rows,
        Err(e) => {
            tracing::error!(error = %e, "failed to load quantitative adjustments");
            return vec![format!("quantitative adjustments: {e}")];
        }
    };

    let recon = reconcile(
        &existing,
        rows,
        MissingKey::Add,
        |e| e.adj_key.clone(),
        |d| Some(d.adj_key.clone()),
        |e, d| e.order == d.order && e.adj_value == d.adj_value,
    );

    let mut ops: Vec<BoxFuture<'static, crate::error::AppResult<()>>> = Vec::new();
    for adj in recon.to_add {
        let store = ds.quantitative_adjustments.clone();
        ops.push(Box::pin(async move {
            store.create(adj).await.map(|_| ())
        }));
    }
    for adj in recon.to_update {
        let store = ds.quantitative_adjustments.clone();
        ops.push(Box::pin(async move {
            store.update(&adj).await.map(|_| ())
        }));
    }
    for adj_key in recon.to_delete {
        let store = ds.quantitative_adjustments.clone();
        ops.push(Box::pin(async move {
            store.delete(owner, &adj_key).await.map(|_| ())
        }));
    }
    join_best_effort(ops, "quantitative adjustments").await
}

/// Reconcile an owner's qualitative adjustments against the desired
/// list. Same shape as the quantitative sync, but equality also spans
/// the subject-side narrative value.
pub async fn sync_qualitative(
    ds: &Datastore,
    owner: AdjustmentOwner,
    desired: &[QualitativeAdjustmentInput],
) -> Vec<String> {
    let rows: Vec<QualitativeAdjustment> = desired
        .iter()
        .enumerate()
        .filter(|(_, d)| !is_blank(&d.adj_key))
        .map(|(i, d)| QualitativeAdjustment {
            id: 0,
            owner,
            adj_key: d.adj_key.clone(),
            adj_value: d.adj_value.clone(),
            subject_property_value: d.subject_property_value.clone(),
            order: (i + 1) as i32,
        })
        .collect();

    let existing = match ds.qualitative_adjustments.find_all(owner).await {
        Ok(rows) => rows,
        Err(e) => {
            tracing::error!(error = %e, "failed to load qualitative adjustments");
            return vec![format!("qualitative adjustments: {e}")];
        }
    };

    let recon = reconcile(
        &existing,
        rows,
        MissingKey::Add,
        |e| e.adj_key.clone(),
        |d| Some(d.adj_key.clone()),
        |e, d| {
            e.order == d.order
                && e.adj_value == d.adj_value
                && e.subject_property_value == d.subject_property_value
        },
    );

    let mut ops: Vec<BoxFuture<'static, crate::error::AppResult<()>>> = Vec::new();
    for adj in recon.to_add {
        let store = ds.qualitative_adjustments.clone();
        ops.push(Box::pin(async move {
            store.create(adj).await.map(|_| ())
        }));
    }
    for adj in recon.to_update {
        let store = ds.qualitative_adjustments.clone();
        ops.push(Box::pin(async move {
            store.update(&adj).await.map(|_| ())
        }));
    }
    for adj_key in recon.to_delete {
        let store = ds.qualitative_adjustments.clone();
        ops.push(Box::pin(async move {
            store.delete(owner, &adj_key).await.map(|_| ())
        }));
    }
    join_best_effort(ops, "qualitative adjustments").await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn input(key: &str, value: f64) -> AdjustmentInput {
        AdjustmentInput {
            adj_key: key.to_string(),
            adj_value: value,
        }
    }

    #[tokio::test]
    async fn blank_rows_are_dropped_but_keep_their_slot_in_order() {
        let store = MemoryStore::new();
        let ds = store.datastore();
        let owner = AdjustmentOwner::Approach(1);

        let errors = sync_quantitative(
            &ds,
            owner,
            &[input("location", 5.0), input("  ", 1.0), input("condition", -2.0)],
        )
        .await;
        assert!(errors.is_empty());

        // order reflects the submitted position, so the blank row's
        // slot stays empty rather than compacting the sequence
        let rows = ds.quantitative_adjustments.find_all(owner).await.unwrap();
        let keyed: Vec<(&str, i32)> = rows.iter().map(|r| (r.adj_key.as_str(), r.order)).collect();
        assert_eq!(keyed, vec![("location", 1), ("condition", 3)]);
    }

    #[tokio::test]
    async fn reorder_updates_both_rows() {
        let store = MemoryStore::new();
        let ds = store.datastore();
        let owner = AdjustmentOwner::Comp(9);

        sync_quantitative(&ds, owner, &[input("a", 1.0), input("b", 2.0)]).await;
        sync_quantitative(&ds, owner, &[input("b", 2.0), input("a", 1.0)]).await;

        let rows = ds.quantitative_adjustments.find_all(owner).await.unwrap();
        let a = rows.iter().find(|r| r.adj_key == "a").unwrap();
        let b = rows.iter().find(|r| r.adj_key == "b").unwrap();
        assert_eq!(a.order, 2);
        assert_eq!(b.order, 1);
    }

    #[tokio::test]
    async fn resync_of_identical_state_writes_nothing() {
        let store = MemoryStore::new();
        let ds = store.datastore();
        let owner = AdjustmentOwner::Approach(3);
        let desired = vec![input("location", 5.0), input("condition", -2.0)];

        sync_quantitative(&ds, owner, &desired).await;
        let before = store.op_counts();
        sync_quantitative(&ds, owner, &desired).await;
        let after = store.op_counts();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn removed_keys_are_deleted() {
        let store = MemoryStore::new();
        let ds = store.datastore();
        let owner = AdjustmentOwner::Approach(5);

        sync_quantitative(&ds, owner, &[input("a", 1.0), input("b", 2.0)]).await;
        sync_quantitative(&ds, owner, &[input("b", 2.0)]).await;

        let rows = ds.quantitative_adjustments.find_all(owner).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].adj_key, "b");
        assert_eq!(rows[0].order, 1);
    }

    #[tokio::test]
    async fn qualitative_blank_rows_leave_the_same_gap() {
        let store = MemoryStore::new();
        let ds = store.datastore();
        let owner = AdjustmentOwner::Approach(8);

        let qual = |key: &str| QualitativeAdjustmentInput {
            adj_key: key.to_string(),
            adj_value: "Similar".to_string(),
            subject_property_value: None,
        };
        sync_qualitative(&ds, owner, &[qual("view"), qual(""), qual("access")]).await;

        let rows = ds.qualitative_adjustments.find_all(owner).await.unwrap();
        let keyed: Vec<(&str, i32)> = rows.iter().map(|r| (r.adj_key.as_str(), r.order)).collect();
        assert_eq!(keyed, vec![("view", 1), ("access", 3)]);
    }

    #[tokio::test]
    async fn qualitative_subject_value_change_fires_update() {
        let store = MemoryStore::new();
        let ds = store.datastore();
        let owner = AdjustmentOwner::Comp(2);
        let desired = |subject: &str| {
            vec![QualitativeAdjustmentInput {
                adj_key: "view".to_string(),
                adj_value: "Superior".to_string(),
                subject_property_value: Some(subject.to_string()),
            }]
        };

        sync_qualitative(&ds, owner, &desired("Average")).await;
        let before = store.op_counts().updates;
        sync_qualitative(&ds, owner, &desired("Good")).await;
        assert_eq!(store.op_counts().updates, before + 1);

        let rows = ds.qualitative_adjustments.find_all(owner).await.unwrap();
        assert_eq!(rows[0].subject_property_value.as_deref(), Some("Good"));
    }
}
