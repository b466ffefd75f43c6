//! Sales/lease approach family row. One record type serves both
//! families; only lease approaches fill the adjusted-comp range.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesApproach {
    pub id: i64,
    pub approach_id: i64,
    /// Weight-normalized mean of the comps' adjusted PSF.
    pub averaged_adjusted_psf: f64,
    pub sales_approach_value: f64,
    /// averaged_adjusted_psf scaled to the subject's full land size.
    pub total_comp_adj: f64,
    pub low_adjusted_comp_range: f64,
    pub high_adjusted_comp_range: f64,
    pub updated_at: DateTime<Utc>,
}

impl SalesApproach {
    pub fn new(approach_id: i64) -> Self {
        SalesApproach {
            id: 0,
            approach_id,
            averaged_adjusted_psf: 0.0,
            sales_approach_value: 0.0,
            total_comp_adj: 0.0,
            low_adjusted_comp_range: 0.0,
            high_adjusted_comp_range: 0.0,
            updated_at: Utc::now(),
        }
    }
}
