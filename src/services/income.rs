//! Income approach: child-collection sync and the income calculator.
//!
//! Rent lines, other income and operating expenses are all keyed by row
//! id. The calculator keeps zoning-linked rent lines mirrored to the
//! subject's zonings (dropped zonings trim their line, new zonings get
//! a zero-income line) and cascades gross income down to indicated
//! values per capitalization rate.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use futures_util::future::BoxFuture;

use crate::error::AppResult;
use crate::models::{
    Approach, IncomeApproach, IncomeSource, IncomeSourceInput, OperatingExpense,
    OperatingExpenseInput, OtherIncomeSource, OtherIncomeSourceInput, SubjectProperty, Zoning,
};
use crate::numeric::{basis_size, resolve_land_size, round2, safe_div};
use crate::services::reconcile::{join_best_effort, reconcile, MissingKey};
use crate::store::Datastore;

/// Reconcile rent lines against the desired list.
pub async fn sync_income_sources(
    ds: &Datastore,
    income_approach_id: i64,
    desired: &[IncomeSourceInput],
) -> Vec<String> {
    let existing = match ds.income_sources.find_all(income_approach_id).await {
        Ok(rows) => rows,
        Err(e) => return vec![format!("income sources: {e}")],
    };
    let by_id: HashMap<i64, IncomeSource> = existing.iter().map(|r| (r.id, r.clone())).collect();

    let recon = reconcile(
        &existing,
        desired.to_vec(),
        MissingKey::Add,
        |e| e.id,
        |d| d.id.filter(|id| by_id.contains_key(id)),
        |e, d| {
            e.zoning_id == d.zoning_id
                && e.label == d.label
                && e.monthly_income == d.monthly_income
                && e.annual_income == d.annual_income
        },
    );

    let mut ops: Vec<BoxFuture<'static, AppResult<()>>> = Vec::new();
    for input in recon.to_add {
        let store = ds.income_sources.clone();
        ops.push(Box::pin(async move {
            store
                .create(IncomeSource {
                    id: 0,
                    income_approach_id,
                    zoning_id: input.zoning_id,
                    label: input.label,
                    sq_ft: 0.0,
                    unit: 0.0,
                    bed: 0.0,
                    monthly_income: input.monthly_income,
                    annual_income: input.annual_income,
                    rent_per_basis: 0.0,
                    updated_at: Utc::now(),
                })
                .await
                .map(|_| ())
        }));
    }
    for input in recon.to_update {
        let store = ds.income_sources.clone();
        // to_update only holds ids present in by_id
        let mut row = by_id[&input.id.unwrap_or_default()].clone();
        ops.push(Box::pin(async move {
            row.zoning_id = input.zoning_id;
            row.label = input.label;
            row.monthly_income = input.monthly_income;
            row.annual_income = input.annual_income;
            store.update(&row).await.map(|_| ())
        }));
    }
    for id in recon.to_delete {
        let store = ds.income_sources.clone();
        ops.push(Box::pin(async move {
            store.delete(id).await.map(|_| ())
        }));
    }
    join_best_effort(ops, "income sources").await
}

/// Reconcile ancillary income lines against the desired list.
pub async fn sync_other_income(
    ds: &Datastore,
    income_approach_id: i64,
    desired: &[OtherIncomeSourceInput],
) -> Vec<String> {
    let existing = match ds.other_income_sources.find_all(income_approach_id).await {
        Ok(rows) => rows,
        Err(e) => return vec![format!("other income sources: {e}")],
    };
    let by_id: HashMap<i64, OtherIncomeSource> =
        existing.iter().map(|r| (r.id, r.clone())).collect();

    let recon = reconcile(
        &existing,
        desired.to_vec(),
        MissingKey::Add,
        |e| e.id,
        |d| d.id.filter(|id| by_id.contains_key(id)),
        |e, d| e.label == d.label && e.annual_income == d.annual_income,
    );

    let mut ops: Vec<BoxFuture<'static, AppResult<()>>> = Vec::new();
    for input in recon.to_add {
        let store = ds.other_income_sources.clone();
        ops.push(Box::pin(async move {
            store
                .create(OtherIncomeSource {
                    id: 0,
                    income_approach_id,
                    label: input.label,
                    annual_income: input.annual_income,
                    updated_at: Utc::now(),
                })
                .await
                .map(|_| ())
        }));
    }
    for input in recon.to_update {
        let store = ds.other_income_sources.clone();
        let mut row = by_id[&input.id.unwrap_or_default()].clone();
        ops.push(Box::pin(async move {
            row.label = input.label;
            row.annual_income = input.annual_income;
            store.update(&row).await.map(|_| ())
        }));
    }
    for id in recon.to_delete {
        let store = ds.other_income_sources.clone();
        ops.push(Box::pin(async move {
            store.delete(id).await.map(|_| ())
        }));
    }
    join_best_effort(ops, "other income sources").await
}

/// Reconcile operating expense lines against the desired list.
pub async fn sync_operating_expenses(
    ds: &Datastore,
    income_approach_id: i64,
    desired: &[OperatingExpenseInput],
) -> Vec<String> {
    let existing = match ds.operating_expenses.find_all(income_approach_id).await {
        Ok(rows) => rows,
        Err(e) => return vec![format!("operating expenses: {e}")],
    };
    let by_id: HashMap<i64, OperatingExpense> =
        existing.iter().map(|r| (r.id, r.clone())).collect();

    let recon = reconcile(
        &existing,
        desired.to_vec(),
        MissingKey::Add,
        |e| e.id,
        |d| d.id.filter(|id| by_id.contains_key(id)),
        |e, d| e.label == d.label && e.annual_amount == d.annual_amount,
    );

    let mut ops: Vec<BoxFuture<'static, AppResult<()>>> = Vec::new();
    for input in recon.to_add {
        let store = ds.operating_expenses.clone();
        ops.push(Box::pin(async move {
            store
                .create(OperatingExpense {
                    id: 0,
                    income_approach_id,
                    label: input.label,
                    annual_amount: input.annual_amount,
                    percentage_of_gross: 0.0,
                    per_basis: 0.0,
                    updated_at: Utc::now(),
                })
                .await
                .map(|_| ())
        }));
    }
    for input in recon.to_update {
        let store = ds.operating_expenses.clone();
        let mut row = by_id[&input.id.unwrap_or_default()].clone();
        ops.push(Box::pin(async move {
            row.label = input.label;
            row.annual_amount = input.annual_amount;
            store.update(&row).await.map(|_| ())
        }));
    }
    for id in recon.to_delete {
        let store = ds.operating_expenses.clone();
        ops.push(Box::pin(async move {
            store.delete(id).await.map(|_| ())
        }));
    }
    join_best_effort(ops, "operating expenses").await
}

/// Trim rent lines whose zoning no longer exists and provision a
/// zero-income line for every zoning without one.
async fn mirror_sources_to_zonings(
    ds: &Datastore,
    income_approach_id: i64,
    zonings: &[Zoning],
) -> AppResult<Vec<IncomeSource>> {
    let sources = ds.income_sources.find_all(income_approach_id).await?;
    let zoning_ids: HashSet<i64> = zonings.iter().map(|z| z.id).collect();

    let mut mutated = false;
    for src in &sources {
        if let Some(zoning_id) = src.zoning_id {
            if !zoning_ids.contains(&zoning_id) {
                ds.income_sources.delete(src.id).await?;
                mutated = true;
            }
        }
    }

    let linked: HashSet<i64> = sources.iter().filter_map(|s| s.zoning_id).collect();
    for zoning in zonings {
        if !linked.contains(&zoning.id) {
            ds.income_sources
                .create(IncomeSource {
                    id: 0,
                    income_approach_id,
                    zoning_id: Some(zoning.id),
                    label: zoning.label.clone(),
                    sq_ft: zoning.sq_ft,
                    unit: zoning.unit,
                    bed: zoning.bed,
                    monthly_income: 0.0,
                    annual_income: 0.0,
                    rent_per_basis: 0.0,
                    updated_at: Utc::now(),
                })
                .await?;
            mutated = true;
        }
    }

    if mutated {
        ds.income_sources.find_all(income_approach_id).await
    } else {
        Ok(sources)
    }
}

/// Run the income cascade for one approach. Returns the updated family
/// row, or `None` when the approach has no income record yet.
pub async fn recalculate_income(
    ds: &Datastore,
    subject: &SubjectProperty,
    approach: &Approach,
) -> AppResult<Option<IncomeApproach>> {
    let Some(income) = ds.income_approaches.find_by_approach(approach.id).await? else {
        return Ok(None);
    };
    let land_size = resolve_land_size(subject, approach.comparison_basis);
    let zoning_by_id: HashMap<i64, &Zoning> =
        subject.zonings.iter().map(|z| (z.id, z)).collect();

    let sources = mirror_sources_to_zonings(ds, income.id, &subject.zonings).await?;

    let mut total_monthly_income = 0.0;
    let mut total_annual_income = 0.0;
    let mut total_sq_ft = 0.0;
    let mut total_unit = 0.0;
    let mut total_bed = 0.0;
    for source in sources {
        let original = source.clone();
        let mut source = source;
        if let Some(zoning) = source.zoning_id.and_then(|id| zoning_by_id.get(&id)) {
            source.label = zoning.label.clone();
            source.sq_ft = zoning.sq_ft;
            source.unit = zoning.unit;
            source.bed = zoning.bed;
            source.rent_per_basis = round2(safe_div(
                source.annual_income,
                basis_size(zoning, approach.comparison_basis),
            ));
        }
        total_monthly_income += source.monthly_income;
        total_annual_income += source.annual_income;
        total_sq_ft += source.sq_ft;
        total_unit += source.unit;
        total_bed += source.bed;
        if source != original {
            ds.income_sources.update(&source).await?;
        }
    }

    // Land-only subjects have no zoned building area.
    if subject.comp_type == crate::models::CompType::LandOnly {
        total_sq_ft = land_size;
        total_unit = 0.0;
        total_bed = 0.0;
    }

    let vacancy_amount = round2(total_annual_income * income.vacancy_pct / 100.0);
    let adjusted_gross = total_annual_income - vacancy_amount;

    let other_income_total: f64 = ds
        .other_income_sources
        .find_all(income.id)
        .await?
        .iter()
        .map(|o| o.annual_income)
        .sum();

    let mut total_operating_expenses = 0.0;
    let mut total_oe_gross_pct = 0.0;
    let mut total_oe_per_basis = 0.0;
    for expense in ds.operating_expenses.find_all(income.id).await? {
        let original = expense.clone();
        let mut expense = expense;
        expense.percentage_of_gross = round2(safe_div(expense.annual_amount, adjusted_gross) * 100.0);
        expense.per_basis = round2(safe_div(expense.annual_amount, land_size));
        total_operating_expenses += expense.annual_amount;
        total_oe_gross_pct += expense.percentage_of_gross;
        total_oe_per_basis += expense.per_basis;
        if expense != original {
            ds.operating_expenses.update(&expense).await?;
        }
    }

    let net_operating_income = adjusted_gross + other_income_total - total_operating_expenses;
    let indicated = |rate: f64| {
        if rate == 0.0 {
            0.0
        } else {
            round2(safe_div(net_operating_income, rate / 100.0))
        }
    };

    let mut next = income.clone();
    next.total_monthly_income = total_monthly_income;
    next.total_annual_income = total_annual_income;
    next.total_sq_ft = total_sq_ft;
    next.total_unit = total_unit;
    next.total_bed = total_bed;
    next.vacancy_amount = vacancy_amount;
    next.adjusted_gross = adjusted_gross;
    next.other_income_total = other_income_total;
    next.total_operating_expenses = total_operating_expenses;
    next.total_oe_gross_pct = round2(total_oe_gross_pct);
    next.total_oe_per_basis = round2(total_oe_per_basis);
    next.net_operating_income = net_operating_income;
    next.indicated_value_monthly = indicated(income.monthly_capitalization_rate);
    next.indicated_value_annual = indicated(income.annual_capitalization_rate);
    next.indicated_value_basis = indicated(income.basis_capitalization_rate);
    next.indicated_psf_monthly = round2(safe_div(next.indicated_value_monthly, land_size));
    next.indicated_psf_annual = round2(safe_div(next.indicated_value_annual, land_size));
    next.indicated_psf_basis = round2(safe_div(next.indicated_value_basis, land_size));

    if next != income {
        ds.income_approaches.update(&next).await?;
    }
    Ok(Some(next))
}
