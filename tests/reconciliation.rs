//! End-to-end reconciliation behavior: the persisted tree converges to
//! the desired tree, resaves are no-ops, and deletes never orphan
//! children.

mod common;

use appraisal_core::models::{AdjustmentOwner, ApproachSaveRequest, ApproachType, CompInput};
use appraisal_core::services::save_approach;
use appraisal_core::store::Datastore;
use common::{adj, comp_input, create_approach, fixture, land_only_subject};

fn comps_request(comp_data: Vec<CompInput>) -> ApproachSaveRequest {
    ApproachSaveRequest {
        comp_data: Some(comp_data),
        ..Default::default()
    }
}

#[tokio::test]
async fn comp_grid_converges_to_desired_state() {
    let f = fixture();
    let subject = land_only_subject(&f.ds, 5_000.0).await;
    let approach = create_approach(&f.ds, subject.id, ApproachType::Sale).await;

    // Seed two comps.
    let outcome = save_approach(
        &f.ds,
        approach.id,
        comps_request(vec![comp_input(None, 10.0, 1.0), comp_input(None, 12.0, 1.0)]),
    )
    .await
    .unwrap();
    assert!(outcome.success);

    let comps = f.ds.comps.find_all(approach.id).await.unwrap();
    assert_eq!(comps.len(), 2);
    let keep = comps[0].id;
    let dropped = comps[1].id;

    // Update one, drop the other, add a third.
    let mut updated = comp_input(Some(keep), 11.0, 2.0);
    updated.comps_adjustments = vec![adj("location", 10.0)];
    let outcome = save_approach(
        &f.ds,
        approach.id,
        comps_request(vec![updated, comp_input(None, 9.0, 1.0)]),
    )
    .await
    .unwrap();
    assert!(outcome.success);

    let comps = f.ds.comps.find_all(approach.id).await.unwrap();
    assert_eq!(comps.len(), 2);
    assert_eq!(comps[0].id, keep);
    assert_eq!(comps[0].order, 1);
    assert_eq!(comps[0].base_price, 11.0);
    // percent mode: 11.0 * 1.10
    assert_eq!(comps[0].adjusted_psf, 12.1);
    assert_eq!(comps[0].total_adjustment, 1.1);
    assert_eq!(comps[1].order, 2);
    assert_eq!(comps[1].base_price, 9.0);
    assert!(comps.iter().all(|c| c.id != dropped));
}

#[tokio::test]
async fn deleted_comp_loses_its_adjustments_first() {
    let f = fixture();
    let subject = land_only_subject(&f.ds, 5_000.0).await;
    let approach = create_approach(&f.ds, subject.id, ApproachType::Sale).await;

    let mut with_children = comp_input(None, 10.0, 1.0);
    with_children.comps_adjustments = vec![adj("location", 5.0), adj("size", -3.0)];
    save_approach(&f.ds, approach.id, comps_request(vec![with_children]))
        .await
        .unwrap();

    let comp_id = f.ds.comps.find_all(approach.id).await.unwrap()[0].id;
    assert_eq!(
        f.ds.quantitative_adjustments
            .find_all(AdjustmentOwner::Comp(comp_id))
            .await
            .unwrap()
            .len(),
        2
    );

    save_approach(&f.ds, approach.id, comps_request(vec![]))
        .await
        .unwrap();

    assert!(f.ds.comps.find_all(approach.id).await.unwrap().is_empty());
    assert!(f
        .ds
        .quantitative_adjustments
        .find_all(AdjustmentOwner::Comp(comp_id))
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn resaving_the_same_tree_writes_nothing() {
    let f = fixture();
    let subject = land_only_subject(&f.ds, 5_000.0).await;
    let approach = create_approach(&f.ds, subject.id, ApproachType::Sale).await;

    let mut first = comp_input(None, 10.0, 1.0);
    first.comps_adjustments = vec![adj("location", 5.0)];
    save_approach(&f.ds, approach.id, comps_request(vec![first]))
        .await
        .unwrap();

    // Round-trip the persisted tree into a second identical request.
    let comp = f.ds.comps.find_all(approach.id).await.unwrap()[0].clone();
    let mut resave = comp_input(Some(comp.id), comp.base_price, comp.weight);
    resave.comps_adjustments = vec![adj("location", 5.0)];

    let before = f.store.op_counts();
    let outcome = save_approach(&f.ds, approach.id, comps_request(vec![resave]))
        .await
        .unwrap();
    assert!(outcome.success);
    assert_eq!(f.store.op_counts(), before);
}

#[tokio::test]
async fn reordering_comps_updates_positions() {
    let f = fixture();
    let subject = land_only_subject(&f.ds, 5_000.0).await;
    let approach = create_approach(&f.ds, subject.id, ApproachType::Sale).await;

    save_approach(
        &f.ds,
        approach.id,
        comps_request(vec![comp_input(None, 10.0, 1.0), comp_input(None, 20.0, 1.0)]),
    )
    .await
    .unwrap();
    let comps = f.ds.comps.find_all(approach.id).await.unwrap();
    let (a, b) = (comps[0].clone(), comps[1].clone());

    save_approach(
        &f.ds,
        approach.id,
        comps_request(vec![
            comp_input(Some(b.id), b.base_price, b.weight),
            comp_input(Some(a.id), a.base_price, a.weight),
        ]),
    )
    .await
    .unwrap();

    let comps = f.ds.comps.find_all(approach.id).await.unwrap();
    assert_eq!(comps[0].id, b.id);
    assert_eq!(comps[0].order, 1);
    assert_eq!(comps[1].id, a.id);
    assert_eq!(comps[1].order, 2);
}

#[tokio::test]
async fn stale_comp_id_is_treated_as_a_create() {
    let f = fixture();
    let subject = land_only_subject(&f.ds, 5_000.0).await;
    let approach = create_approach(&f.ds, subject.id, ApproachType::Sale).await;

    save_approach(
        &f.ds,
        approach.id,
        comps_request(vec![comp_input(Some(999_999), 10.0, 1.0)]),
    )
    .await
    .unwrap();

    let comps = f.ds.comps.find_all(approach.id).await.unwrap();
    assert_eq!(comps.len(), 1);
    assert_ne!(comps[0].id, 999_999);
    assert_eq!(comps[0].base_price, 10.0);
}

#[tokio::test]
async fn missing_approach_is_a_not_found_error() {
    let ds = Datastore::in_memory();
    let err = save_approach(&ds, 42, ApproachSaveRequest::default())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("not found"));
}
