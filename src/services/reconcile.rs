//! Generic keyed-collection reconciliation.
//!
//! Persisted collections are diffed against a desired state by identity
//! key: keys only in the desired state are adds, keys on both sides are
//! updates (when the scoped equality check says the row changed), and
//! keys only in the persisted state are deletes or ignored, depending
//! on [`MissingKey`].

use futures_util::future::{join_all, BoxFuture};
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use crate::error::AppResult;

/// What to do with a desired row whose key has no persisted match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingKey {
    /// Create it (row-id keyed collections: an unknown id is a new row).
    Add,
    /// Drop it (not applicable to any current caller, kept for symmetry
    /// with collections whose keys are server-issued).
    Drop,
}

/// Outcome of diffing one collection.
#[derive(Debug)]
pub struct Reconciliation<D, K> {
    pub to_add: Vec<D>,
    pub to_update: Vec<D>,
    pub to_delete: Vec<K>,
}

/// Diff `existing` against `desired`.
///
/// `key_of_desired` returning `None` marks the row as always-create.
/// Duplicate keys in the desired state keep the first occurrence.
/// Equality is field-scoped: `unchanged` compares only the fields the
/// caller persists, so untouched rows produce no write.
pub fn reconcile<E, D, K>(
    existing: &[E],
    desired: Vec<D>,
    missing: MissingKey,
    key_of_existing: impl Fn(&E) -> K,
    key_of_desired: impl Fn(&D) -> Option<K>,
    unchanged: impl Fn(&E, &D) -> bool,
) -> Reconciliation<D, K>
where
    K: Eq + Hash + Clone,
{
    let existing_by_key: HashMap<K, &E> =
        existing.iter().map(|e| (key_of_existing(e), e)).collect();

    let mut to_add = Vec::new();
    let mut to_update = Vec::new();
    let mut seen: HashSet<K> = HashSet::new();

    for row in desired {
        match key_of_desired(&row) {
            None => to_add.push(row),
            Some(key) => {
                if !seen.insert(key.clone()) {
                    continue;
                }
                match existing_by_key.get(&key) {
                    Some(current) => {
                        if !unchanged(current, &row) {
                            to_update.push(row);
                        }
                    }
                    None => match missing {
                        MissingKey::Add => to_add.push(row),
                        MissingKey::Drop => {}
                    },
                }
            }
        }
    }

    // Preserve persisted order for deterministic delete dispatch.
    let to_delete = existing
        .iter()
        .map(&key_of_existing)
        .filter(|k| !seen.contains(k))
        .collect();

    Reconciliation {
        to_add,
        to_update,
        to_delete,
    }
}

/// Run independent persistence ops concurrently and collect failures.
///
/// One failed op never aborts its siblings; each failure is logged and
/// surfaced as a message for the caller's outcome report.
pub async fn join_best_effort(
    ops: Vec<BoxFuture<'static, AppResult<()>>>,
    context: &str,
) -> Vec<String> {
    let mut errors = Vec::new();
    for result in join_all(ops).await {
        if let Err(e) = result {
            tracing::error!(context, error = %e, "reconciliation step failed");
            errors.push(format!("{context}: {e}"));
        }
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        id: Option<i64>,
        value: f64,
    }

    fn existing(id: i64, value: f64) -> Row {
        Row {
            id: Some(id),
            value,
        }
    }

    #[test]
    fn classifies_adds_updates_and_deletes() {
        let persisted = vec![existing(1, 10.0), existing(2, 20.0), existing(3, 30.0)];
        let desired = vec![
            Row { id: None, value: 5.0 },
            existing(1, 10.0),
            existing(2, 25.0),
        ];
        let recon = reconcile(
            &persisted,
            desired,
            MissingKey::Add,
            |e| e.id.unwrap(),
            |d| d.id,
            |e, d| e.value == d.value,
        );
        assert_eq!(recon.to_add, vec![Row { id: None, value: 5.0 }]);
        assert_eq!(recon.to_update, vec![existing(2, 25.0)]);
        assert_eq!(recon.to_delete, vec![3]);
    }

    #[test]
    fn unknown_key_is_add_or_dropped_per_policy() {
        let persisted = vec![existing(1, 10.0)];
        let desired = vec![existing(99, 1.0)];

        let added = reconcile(
            &persisted,
            desired.clone(),
            MissingKey::Add,
            |e| e.id.unwrap(),
            |d| d.id,
            |e, d| e.value == d.value,
        );
        assert_eq!(added.to_add.len(), 1);

        let dropped = reconcile(
            &persisted,
            desired,
            MissingKey::Drop,
            |e| e.id.unwrap(),
            |d| d.id,
            |e, d| e.value == d.value,
        );
        assert!(dropped.to_add.is_empty());
        assert!(dropped.to_update.is_empty());
    }

    #[test]
    fn duplicate_desired_keys_keep_first() {
        let persisted = vec![existing(1, 10.0)];
        let desired = vec![existing(1, 11.0), existing(1, 99.0)];
        let recon = reconcile(
            &persisted,
            desired,
            MissingKey::Add,
            |e| e.id.unwrap(),
            |d| d.id,
            |e, d| e.value == d.value,
        );
        assert_eq!(recon.to_update, vec![existing(1, 11.0)]);
        assert!(recon.to_delete.is_empty());
    }
}
