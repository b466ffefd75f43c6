//! Calculator cascades: income, cost and sales figures persisted by a
//! save, plus the subject-wide recalculation entry points.

mod common;

use appraisal_core::models::{
    ApproachSaveRequest, ApproachType, ImprovementInput, IncomeSaveRequest, IncomeSourceInput,
    OperatingExpenseInput,
};
use appraisal_core::services::{recalculate, save_approach, weighted_market_value};
use common::{comp_input, create_approach, fixture, improved_subject, land_only_subject, zoning};

#[tokio::test]
async fn income_cascade_produces_indicated_values() {
    let f = fixture();
    let subject = improved_subject(&f.ds, vec![zoning(1, "Retail", 1_000.0)]).await;
    let approach = create_approach(&f.ds, subject.id, ApproachType::Income).await;

    let outcome = save_approach(
        &f.ds,
        approach.id,
        ApproachSaveRequest {
            income: Some(IncomeSaveRequest {
                vacancy_pct: Some(5.0),
                annual_capitalization_rate: Some(8.0),
                income_sources: Some(vec![IncomeSourceInput {
                    id: None,
                    zoning_id: Some(1),
                    label: "Retail".to_string(),
                    monthly_income: 1_000.0,
                    annual_income: 12_000.0,
                }]),
                ..Default::default()
            }),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert!(outcome.success);

    let income = f
        .ds
        .income_approaches
        .find_by_approach(approach.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(income.total_annual_income, 12_000.0);
    assert_eq!(income.total_sq_ft, 1_000.0);
    assert_eq!(income.vacancy_amount, 600.0);
    assert_eq!(income.adjusted_gross, 11_400.0);
    assert_eq!(income.net_operating_income, 11_400.0);
    assert_eq!(income.indicated_value_annual, 142_500.0);
    assert_eq!(income.indicated_psf_annual, 142.5);
    // no monthly/basis cap rate -> those legs stay zero
    assert_eq!(income.indicated_value_monthly, 0.0);
    assert_eq!(income.indicated_value_basis, 0.0);

    let sources = f.ds.income_sources.find_all(income.id).await.unwrap();
    assert_eq!(sources.len(), 1);
    assert_eq!(sources[0].rent_per_basis, 12.0);
}

#[tokio::test]
async fn operating_expenses_get_ratio_columns() {
    let f = fixture();
    let subject = improved_subject(&f.ds, vec![zoning(1, "Retail", 1_000.0)]).await;
    let approach = create_approach(&f.ds, subject.id, ApproachType::Income).await;

    save_approach(
        &f.ds,
        approach.id,
        ApproachSaveRequest {
            income: Some(IncomeSaveRequest {
                annual_capitalization_rate: Some(8.0),
                income_sources: Some(vec![IncomeSourceInput {
                    id: None,
                    zoning_id: Some(1),
                    label: "Retail".to_string(),
                    monthly_income: 0.0,
                    annual_income: 10_000.0,
                }]),
                operating_expenses: Some(vec![OperatingExpenseInput {
                    id: None,
                    label: "Taxes".to_string(),
                    annual_amount: 2_500.0,
                }]),
                ..Default::default()
            }),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let income = f
        .ds
        .income_approaches
        .find_by_approach(approach.id)
        .await
        .unwrap()
        .unwrap();
    let expenses = f.ds.operating_expenses.find_all(income.id).await.unwrap();
    assert_eq!(expenses[0].percentage_of_gross, 25.0);
    assert_eq!(expenses[0].per_basis, 2.5);
    assert_eq!(income.total_operating_expenses, 2_500.0);
    assert_eq!(income.net_operating_income, 7_500.0);
}

#[tokio::test]
async fn new_zoning_provisions_a_rent_line_on_recalculation() {
    let f = fixture();
    let mut subject = improved_subject(&f.ds, vec![zoning(1, "Retail", 1_000.0)]).await;
    let approach = create_approach(&f.ds, subject.id, ApproachType::Income).await;

    save_approach(
        &f.ds,
        approach.id,
        ApproachSaveRequest {
            income: Some(IncomeSaveRequest::default()),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let income = f
        .ds
        .income_approaches
        .find_by_approach(approach.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(f.ds.income_sources.find_all(income.id).await.unwrap().len(), 1);

    // Add a zoning, drop the old one, and recalculate subject-wide.
    subject.zonings = vec![zoning(2, "Office", 2_000.0)];
    f.ds.subject_properties.update(&subject).await.unwrap();
    let results = recalculate(&f.ds, &subject).await.unwrap();
    assert_eq!(results.len(), 1);

    let sources = f.ds.income_sources.find_all(income.id).await.unwrap();
    assert_eq!(sources.len(), 1);
    assert_eq!(sources[0].zoning_id, Some(2));
    assert_eq!(sources[0].label, "Office");
    assert_eq!(sources[0].sq_ft, 2_000.0);
    assert_eq!(sources[0].annual_income, 0.0);
}

#[tokio::test]
async fn cost_cascade_depreciates_improvements() {
    let f = fixture();
    let subject = land_only_subject(&f.ds, 10_000.0).await;
    let approach = create_approach(&f.ds, subject.id, ApproachType::Cost).await;

    let outcome = save_approach(
        &f.ds,
        approach.id,
        ApproachSaveRequest {
            comp_data: Some(vec![comp_input(None, 5.0, 1.0)]),
            improvements: Some(vec![ImprovementInput {
                id: None,
                zoning_id: None,
                label: "Warehouse".to_string(),
                sf_area: 8_000.0,
                adjusted_psf: 100.0,
                depreciation_pct: 10.0,
            }]),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert!(outcome.success);

    let cost = f
        .ds
        .cost_approaches
        .find_by_approach(approach.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(cost.averaged_adjusted_psf, 5.0);
    assert_eq!(cost.land_value, 50_000.0);
    assert_eq!(cost.overall_replacement_cost, 800_000.0);
    assert_eq!(cost.total_depreciation, 80_000.0);
    assert_eq!(cost.improvements_total_adjusted_cost, 720_000.0);
    assert_eq!(cost.total_cost_valuation, 770_000.0);
    assert_eq!(cost.indicated_value_psf, 96.25);

    let improvements = f.ds.improvements.find_all(cost.id).await.unwrap();
    assert_eq!(improvements[0].structure_cost, 800_000.0);
    assert_eq!(improvements[0].depreciation_amount, 80_000.0);
    assert_eq!(improvements[0].adjusted_cost, 720_000.0);
}

#[tokio::test]
async fn sales_cascade_scales_the_comp_average() {
    let f = fixture();
    let subject = land_only_subject(&f.ds, 5_000.0).await;
    let approach = create_approach(&f.ds, subject.id, ApproachType::Sale).await;

    save_approach(
        &f.ds,
        approach.id,
        ApproachSaveRequest {
            comp_data: Some(vec![comp_input(None, 20.0, 1.0)]),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let sales = f
        .ds
        .sales_approaches
        .find_by_approach(approach.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(sales.averaged_adjusted_psf, 20.0);
    assert_eq!(sales.sales_approach_value, 100_000.0);
    assert_eq!(sales.total_comp_adj, 100_000.0);
}

#[tokio::test]
async fn improved_sf_subject_splits_sales_value_across_zonings() {
    let f = fixture();
    let mut z1 = zoning(1, "Retail", 1_000.0);
    z1.weight_sf = 60.0;
    let mut z2 = zoning(2, "Office", 2_000.0);
    z2.weight_sf = 50.0;
    let subject = improved_subject(&f.ds, vec![z1, z2]).await;
    let approach = create_approach(&f.ds, subject.id, ApproachType::Sale).await;

    save_approach(
        &f.ds,
        approach.id,
        ApproachSaveRequest {
            comp_data: Some(vec![comp_input(None, 10.0, 1.0)]),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let sales = f
        .ds
        .sales_approaches
        .find_by_approach(approach.id)
        .await
        .unwrap()
        .unwrap();
    // 10 * 1000 * 0.60 + 10 * 2000 * 0.50
    assert_eq!(sales.sales_approach_value, 16_000.0);
    // total_comp_adj always scales over the summed basis size
    assert_eq!(sales.total_comp_adj, 30_000.0);
}

#[tokio::test]
async fn lease_approach_reports_adjusted_comp_range() {
    let f = fixture();
    let subject = land_only_subject(&f.ds, 5_000.0).await;
    let approach = create_approach(&f.ds, subject.id, ApproachType::Lease).await;

    save_approach(
        &f.ds,
        approach.id,
        ApproachSaveRequest {
            comp_data: Some(vec![
                comp_input(None, 18.0, 1.0),
                comp_input(None, 24.0, 1.0),
                comp_input(None, 21.0, 2.0),
            ]),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let sales = f
        .ds
        .sales_approaches
        .find_by_approach(approach.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(sales.low_adjusted_comp_range, 18.0);
    assert_eq!(sales.high_adjusted_comp_range, 24.0);
}

#[tokio::test]
async fn zero_divisors_yield_zero_figures_not_nan() {
    let f = fixture();
    // No zonings at all: every land-size divisor is zero.
    let subject = improved_subject(&f.ds, vec![]).await;
    let approach = create_approach(&f.ds, subject.id, ApproachType::Income).await;

    save_approach(
        &f.ds,
        approach.id,
        ApproachSaveRequest {
            income: Some(IncomeSaveRequest {
                annual_capitalization_rate: Some(8.0),
                income_sources: Some(vec![IncomeSourceInput {
                    id: None,
                    zoning_id: None,
                    label: "Misc".to_string(),
                    monthly_income: 0.0,
                    annual_income: 10_000.0,
                }]),
                operating_expenses: Some(vec![OperatingExpenseInput {
                    id: None,
                    label: "Taxes".to_string(),
                    annual_amount: 1_000.0,
                }]),
                ..Default::default()
            }),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let income = f
        .ds
        .income_approaches
        .find_by_approach(approach.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(income.indicated_value_annual, 112_500.0);
    assert_eq!(income.indicated_psf_annual, 0.0);
    assert!(income.indicated_psf_annual.is_finite());

    let expenses = f.ds.operating_expenses.find_all(income.id).await.unwrap();
    assert_eq!(expenses[0].per_basis, 0.0);
}

#[tokio::test]
async fn market_value_weights_every_family() {
    let f = fixture();
    let subject = land_only_subject(&f.ds, 5_000.0).await;

    let mut sale = create_approach(&f.ds, subject.id, ApproachType::Sale).await;
    sale.weight = 0.6;
    f.ds.approaches.update(&sale).await.unwrap();
    save_approach(
        &f.ds,
        sale.id,
        ApproachSaveRequest {
            comp_data: Some(vec![comp_input(None, 20.0, 1.0)]),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let mut cost = create_approach(&f.ds, subject.id, ApproachType::Cost).await;
    cost.weight = 0.4;
    f.ds.approaches.update(&cost).await.unwrap();
    save_approach(
        &f.ds,
        cost.id,
        ApproachSaveRequest {
            comp_data: Some(vec![comp_input(None, 10.0, 1.0)]),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    // sale: 20 * 5000 = 100_000; cost: land only, 10 * 5000 = 50_000
    let value = weighted_market_value(&f.ds, subject.id).await.unwrap();
    assert_eq!(value, 100_000.0 * 0.6 + 50_000.0 * 0.4);
}

#[tokio::test]
async fn identical_income_resave_writes_nothing() {
    let f = fixture();
    let subject = improved_subject(&f.ds, vec![zoning(1, "Retail", 1_000.0)]).await;
    let approach = create_approach(&f.ds, subject.id, ApproachType::Income).await;

    let request = |source_id: Option<i64>| ApproachSaveRequest {
        income: Some(IncomeSaveRequest {
            vacancy_pct: Some(5.0),
            annual_capitalization_rate: Some(8.0),
            income_sources: Some(vec![IncomeSourceInput {
                id: source_id,
                zoning_id: Some(1),
                label: "Retail".to_string(),
                monthly_income: 1_000.0,
                annual_income: 12_000.0,
            }]),
            ..Default::default()
        }),
        ..Default::default()
    };

    save_approach(&f.ds, approach.id, request(None)).await.unwrap();
    let income = f
        .ds
        .income_approaches
        .find_by_approach(approach.id)
        .await
        .unwrap()
        .unwrap();
    let source_id = f.ds.income_sources.find_all(income.id).await.unwrap()[0].id;

    let before = f.store.op_counts();
    let outcome = save_approach(&f.ds, approach.id, request(Some(source_id)))
        .await
        .unwrap();
    assert!(outcome.success);
    assert_eq!(f.store.op_counts(), before);
}
