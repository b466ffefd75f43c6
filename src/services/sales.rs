//! Sales/lease calculator.
//!
//! `averaged_adjusted_psf` is materialized onto the family row by the
//! comp sync; this calculator scales it to the subject. Improved SF
//! subjects split the value across zonings by each zoning's sales
//! weight share; everything else multiplies by the resolved land size.

use crate::error::AppResult;
use crate::models::{
    Approach, ApproachType, ComparisonBasis, CompType, SalesApproach, SubjectProperty,
};
use crate::numeric::{resolve_land_size, round2};
use crate::store::Datastore;

/// Run the sales cascade for one approach. Returns the updated family
/// row, or `None` when the approach has no sales record yet.
pub async fn recalculate_sales(
    ds: &Datastore,
    subject: &SubjectProperty,
    approach: &Approach,
) -> AppResult<Option<SalesApproach>> {
    let Some(sales) = ds.sales_approaches.find_by_approach(approach.id).await? else {
        return Ok(None);
    };
    let averaged = sales.averaged_adjusted_psf;
    let land_size = resolve_land_size(subject, approach.comparison_basis);

    let value = if averaged == 0.0 {
        0.0
    } else if subject.comp_type == CompType::BuildingWithLand
        && approach.comparison_basis == ComparisonBasis::Sf
    {
        subject
            .zonings
            .iter()
            .map(|z| averaged * z.sq_ft * z.weight_sf / 100.0)
            .sum()
    } else {
        averaged * land_size
    };

    let mut next = sales.clone();
    next.sales_approach_value = round2(value);
    next.total_comp_adj = round2(averaged * land_size);
    if approach.approach_type == ApproachType::Lease {
        let comps = ds.comps.find_all(approach.id).await?;
        if comps.is_empty() {
            next.low_adjusted_comp_range = 0.0;
            next.high_adjusted_comp_range = 0.0;
        } else {
            next.low_adjusted_comp_range = round2(
                comps
                    .iter()
                    .map(|c| c.adjusted_psf)
                    .fold(f64::INFINITY, f64::min),
            );
            next.high_adjusted_comp_range = round2(
                comps
                    .iter()
                    .map(|c| c.adjusted_psf)
                    .fold(f64::NEG_INFINITY, f64::max),
            );
        }
    }

    if next != sales {
        ds.sales_approaches.update(&next).await?;
    }
    Ok(Some(next))
}
