//! Record store seams.
//!
//! Persistence is a collaborator, not a concern of this crate: every
//! entity gets a narrow async trait with find/create/update/delete
//! verbs, and [`Datastore`] bundles one implementation of each.
//! `create` assigns the server id; any caller-supplied id is ignored.
//! `update`/`delete` return whether a row was touched.

pub mod memory;

pub use memory::MemoryStore;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::AppResult;
use crate::models::{
    AdjustmentOwner, Approach, Comp, CostApproach, Improvement, IncomeApproach, IncomeSource,
    OperatingExpense, OtherIncomeSource, QualitativeAdjustment, QuantitativeAdjustment,
    SalesApproach, SubjectProperty,
};

#[async_trait]
pub trait SubjectPropertyStore: Send + Sync {
    async fn find_one(&self, id: i64) -> AppResult<Option<SubjectProperty>>;
    async fn create(&self, attrs: SubjectProperty) -> AppResult<SubjectProperty>;
    async fn update(&self, subject: &SubjectProperty) -> AppResult<bool>;
}

#[async_trait]
pub trait ApproachStore: Send + Sync {
    /// All approaches of a subject property, ordered by id.
    async fn find_all(&self, subject_property_id: i64) -> AppResult<Vec<Approach>>;
    async fn find_one(&self, id: i64) -> AppResult<Option<Approach>>;
    async fn create(&self, attrs: Approach) -> AppResult<Approach>;
    async fn update(&self, approach: &Approach) -> AppResult<bool>;
    async fn delete(&self, id: i64) -> AppResult<bool>;
}

#[async_trait]
pub trait CompStore: Send + Sync {
    /// All comps of an approach, ordered by display position.
    async fn find_all(&self, approach_id: i64) -> AppResult<Vec<Comp>>;
    async fn create(&self, attrs: Comp) -> AppResult<Comp>;
    async fn update(&self, comp: &Comp) -> AppResult<bool>;
    async fn delete(&self, id: i64) -> AppResult<bool>;
}

/// Quantitative adjustments are keyed by (owner, adj_key).
#[async_trait]
pub trait QuantAdjustmentStore: Send + Sync {
    async fn find_all(&self, owner: AdjustmentOwner) -> AppResult<Vec<QuantitativeAdjustment>>;
    async fn create(&self, attrs: QuantitativeAdjustment) -> AppResult<QuantitativeAdjustment>;
    async fn update(&self, adjustment: &QuantitativeAdjustment) -> AppResult<bool>;
    async fn delete(&self, owner: AdjustmentOwner, adj_key: &str) -> AppResult<bool>;
    async fn delete_all(&self, owner: AdjustmentOwner) -> AppResult<u64>;
}

/// Qualitative adjustments are keyed by (owner, adj_key).
#[async_trait]
pub trait QualAdjustmentStore: Send + Sync {
    async fn find_all(&self, owner: AdjustmentOwner) -> AppResult<Vec<QualitativeAdjustment>>;
    async fn create(&self, attrs: QualitativeAdjustment) -> AppResult<QualitativeAdjustment>;
    async fn update(&self, adjustment: &QualitativeAdjustment) -> AppResult<bool>;
    async fn delete(&self, owner: AdjustmentOwner, adj_key: &str) -> AppResult<bool>;
    async fn delete_all(&self, owner: AdjustmentOwner) -> AppResult<u64>;
}

#[async_trait]
pub trait IncomeApproachStore: Send + Sync {
    async fn find_by_approach(&self, approach_id: i64) -> AppResult<Option<IncomeApproach>>;
    async fn create(&self, attrs: IncomeApproach) -> AppResult<IncomeApproach>;
    async fn update(&self, row: &IncomeApproach) -> AppResult<bool>;
}

#[async_trait]
pub trait IncomeSourceStore: Send + Sync {
    async fn find_all(&self, income_approach_id: i64) -> AppResult<Vec<IncomeSource>>;
    async fn create(&self, attrs: IncomeSource) -> AppResult<IncomeSource>;
    async fn update(&self, row: &IncomeSource) -> AppResult<bool>;
    async fn delete(&self, id: i64) -> AppResult<bool>;
}

#[async_trait]
pub trait OtherIncomeSourceStore: Send + Sync {
    async fn find_all(&self, income_approach_id: i64) -> AppResult<Vec<OtherIncomeSource>>;
    async fn create(&self, attrs: OtherIncomeSource) -> AppResult<OtherIncomeSource>;
    async fn update(&self, row: &OtherIncomeSource) -> AppResult<bool>;
    async fn delete(&self, id: i64) -> AppResult<bool>;
}

#[async_trait]
pub trait OperatingExpenseStore: Send + Sync {
    async fn find_all(&self, income_approach_id: i64) -> AppResult<Vec<OperatingExpense>>;
    async fn create(&self, attrs: OperatingExpense) -> AppResult<OperatingExpense>;
    async fn update(&self, row: &OperatingExpense) -> AppResult<bool>;
    async fn delete(&self, id: i64) -> AppResult<bool>;
}

#[async_trait]
pub trait CostApproachStore: Send + Sync {
    async fn find_by_approach(&self, approach_id: i64) -> AppResult<Option<CostApproach>>;
    async fn create(&self, attrs: CostApproach) -> AppResult<CostApproach>;
    async fn update(&self, row: &CostApproach) -> AppResult<bool>;
}

#[async_trait]
pub trait ImprovementStore: Send + Sync {
    async fn find_all(&self, cost_approach_id: i64) -> AppResult<Vec<Improvement>>;
    async fn create(&self, attrs: Improvement) -> AppResult<Improvement>;
    async fn update(&self, row: &Improvement) -> AppResult<bool>;
    async fn delete(&self, id: i64) -> AppResult<bool>;
}

#[async_trait]
pub trait SalesApproachStore: Send + Sync {
    async fn find_by_approach(&self, approach_id: i64) -> AppResult<Option<SalesApproach>>;
    async fn create(&self, attrs: SalesApproach) -> AppResult<SalesApproach>;
    async fn update(&self, row: &SalesApproach) -> AppResult<bool>;
}

/// One handle bundling every record store the services need.
#[derive(Clone)]
pub struct Datastore {
    pub subject_properties: Arc<dyn SubjectPropertyStore>,
    pub approaches: Arc<dyn ApproachStore>,
    pub comps: Arc<dyn CompStore>,
    pub quantitative_adjustments: Arc<dyn QuantAdjustmentStore>,
    pub qualitative_adjustments: Arc<dyn QualAdjustmentStore>,
    pub income_approaches: Arc<dyn IncomeApproachStore>,
    pub income_sources: Arc<dyn IncomeSourceStore>,
    pub other_income_sources: Arc<dyn OtherIncomeSourceStore>,
    pub operating_expenses: Arc<dyn OperatingExpenseStore>,
    pub cost_approaches: Arc<dyn CostApproachStore>,
    pub improvements: Arc<dyn ImprovementStore>,
    pub sales_approaches: Arc<dyn SalesApproachStore>,
}

impl Datastore {
    /// In-memory datastore for tests and embedding.
    pub fn in_memory() -> Datastore {
        MemoryStore::new().datastore()
    }
}
