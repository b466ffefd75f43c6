//! Numeric utilities: unit conversion, guarded arithmetic and display
//! formatting shared by the valuation calculators.

use crate::models::{AnalysisType, ComparisonBasis, CompType, LandDimension, SubjectProperty, Zoning};

/// Square feet per acre.
pub const SQ_FT_PER_ACRE: f64 = 43_560.0;

/// Convert acres to square feet.
pub fn acres_to_sq_ft(acres: f64) -> f64 {
    acres * SQ_FT_PER_ACRE
}

/// Convert square feet to acres.
pub fn sq_ft_to_acres(sq_ft: f64) -> f64 {
    sq_ft / SQ_FT_PER_ACRE
}

/// Division that short-circuits to 0 instead of producing NaN/Infinity.
///
/// An incomplete valuation shows zeros, it never crashes the report.
pub fn safe_div(numerator: f64, divisor: f64) -> f64 {
    if divisor == 0.0 || !divisor.is_finite() || !numerator.is_finite() {
        0.0
    } else {
        numerator / divisor
    }
}

/// Round to 2 decimal places (money and percentage figures).
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// The size contribution of one zoning under a comparison basis.
pub fn basis_size(zoning: &Zoning, basis: ComparisonBasis) -> f64 {
    match basis {
        ComparisonBasis::Sf => zoning.sq_ft,
        ComparisonBasis::Unit => zoning.unit,
        ComparisonBasis::Bed => zoning.bed,
    }
}

/// Resolve the land size used to normalize valuations.
///
/// Land-only subjects use the parcel size, converted from acres to square
/// feet unless the analysis itself is priced per acre. Built subjects sum
/// the zoning field matching the comparison basis.
pub fn resolve_land_size(subject: &SubjectProperty, basis: ComparisonBasis) -> f64 {
    match subject.comp_type {
        CompType::LandOnly => {
            if subject.land_dimension == LandDimension::Acre
                && subject.analysis_type != AnalysisType::PriceAcre
            {
                acres_to_sq_ft(subject.land_size)
            } else {
                subject.land_size
            }
        }
        CompType::BuildingWithLand => subject
            .zonings
            .iter()
            .map(|z| basis_size(z, basis))
            .sum(),
    }
}

/// Group the integer digits of an already-formatted number with commas.
fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    let offset = digits.len() % 3;
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (i + 3 - offset) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

/// Format a number with thousands separators and 2 decimal places.
pub fn format_number(value: f64) -> String {
    let rounded = round2(value);
    let negative = rounded < 0.0;
    let text = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), "00"));
    let formatted = format!("{}.{}", group_thousands(int_part), frac_part);
    if negative {
        format!("-{}", formatted)
    } else {
        formatted
    }
}

/// Format a dollar amount, e.g. `$1,234,567.50`.
pub fn format_currency(value: f64) -> String {
    if value < 0.0 {
        format!("-${}", format_number(-value))
    } else {
        format!("${}", format_number(value))
    }
}

/// Format a percentage figure, e.g. `5.25%`.
pub fn format_percent(value: f64) -> String {
    format!("{:.2}%", round2(value))
}
