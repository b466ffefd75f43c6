//! Income approach records: the family row plus its three child
//! collections (income sources, other income, operating expenses).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Income family row. Rate inputs are percentages (8 means 8%); the
/// `indicated_*` and total fields are calculator outputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeApproach {
    pub id: i64,
    pub approach_id: i64,
    pub vacancy_pct: f64,
    pub monthly_capitalization_rate: f64,
    pub annual_capitalization_rate: f64,
    pub basis_capitalization_rate: f64,
    pub total_monthly_income: f64,
    pub total_annual_income: f64,
    pub total_sq_ft: f64,
    pub total_unit: f64,
    pub total_bed: f64,
    pub vacancy_amount: f64,
    pub adjusted_gross: f64,
    pub other_income_total: f64,
    pub total_operating_expenses: f64,
    pub total_oe_gross_pct: f64,
    pub total_oe_per_basis: f64,
    pub net_operating_income: f64,
    pub indicated_value_monthly: f64,
    pub indicated_value_annual: f64,
    pub indicated_value_basis: f64,
    pub indicated_psf_monthly: f64,
    pub indicated_psf_annual: f64,
    pub indicated_psf_basis: f64,
    pub updated_at: DateTime<Utc>,
}

impl IncomeApproach {
    /// Fresh family row with zeroed figures.
    pub fn new(approach_id: i64) -> Self {
        IncomeApproach {
            id: 0,
            approach_id,
            vacancy_pct: 0.0,
            monthly_capitalization_rate: 0.0,
            annual_capitalization_rate: 0.0,
            basis_capitalization_rate: 0.0,
            total_monthly_income: 0.0,
            total_annual_income: 0.0,
            total_sq_ft: 0.0,
            total_unit: 0.0,
            total_bed: 0.0,
            vacancy_amount: 0.0,
            adjusted_gross: 0.0,
            other_income_total: 0.0,
            total_operating_expenses: 0.0,
            total_oe_gross_pct: 0.0,
            total_oe_per_basis: 0.0,
            net_operating_income: 0.0,
            indicated_value_monthly: 0.0,
            indicated_value_annual: 0.0,
            indicated_value_basis: 0.0,
            indicated_psf_monthly: 0.0,
            indicated_psf_annual: 0.0,
            indicated_psf_basis: 0.0,
            updated_at: Utc::now(),
        }
    }
}

/// One rent line. Zoning-linked rows mirror the zoning's label and
/// sizes; unlinked rows keep whatever was entered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeSource {
    pub id: i64,
    pub income_approach_id: i64,
    pub zoning_id: Option<i64>,
    pub label: String,
    pub sq_ft: f64,
    pub unit: f64,
    pub bed: f64,
    pub monthly_income: f64,
    pub annual_income: f64,
    /// annual_income / zoning size in the approach's basis.
    pub rent_per_basis: f64,
    pub updated_at: DateTime<Utc>,
}

/// Ancillary income line (parking, laundry, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OtherIncomeSource {
    pub id: i64,
    pub income_approach_id: i64,
    pub label: String,
    pub annual_income: f64,
    pub updated_at: DateTime<Utc>,
}

/// Operating expense line. `percentage_of_gross` and `per_basis` are
/// calculator outputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatingExpense {
    pub id: i64,
    pub income_approach_id: i64,
    pub label: String,
    pub annual_amount: f64,
    pub percentage_of_gross: f64,
    pub per_basis: f64,
    pub updated_at: DateTime<Utc>,
}

/// Desired rent line, keyed by row id.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IncomeSourceInput {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub zoning_id: Option<i64>,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub monthly_income: f64,
    #[serde(default)]
    pub annual_income: f64,
}

/// Desired ancillary income line.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OtherIncomeSourceInput {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub annual_income: f64,
}

/// Desired operating expense line.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OperatingExpenseInput {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub annual_amount: f64,
}

/// Income section of an approach save. Absent collections leave the
/// corresponding rows untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IncomeSaveRequest {
    pub vacancy_pct: Option<f64>,
    pub monthly_capitalization_rate: Option<f64>,
    pub annual_capitalization_rate: Option<f64>,
    pub basis_capitalization_rate: Option<f64>,
    pub income_sources: Option<Vec<IncomeSourceInput>>,
    pub other_income_sources: Option<Vec<OtherIncomeSourceInput>>,
    pub operating_expenses: Option<Vec<OperatingExpenseInput>>,
}
