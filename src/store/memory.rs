//! In-memory datastore. Backs the test suite and doubles as a reference
//! implementation of the store traits. Counts every write so tests can
//! assert reconciliation touched exactly the rows it should.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;

use crate::error::{AppError, AppResult};
use crate::models::{
    AdjustmentOwner, Approach, Comp, CostApproach, Improvement, IncomeApproach, IncomeSource,
    OperatingExpense, OtherIncomeSource, QualitativeAdjustment, QuantitativeAdjustment,
    SalesApproach, SubjectProperty,
};
use crate::store::Datastore;

/// Write-operation totals since the store was created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpCounts {
    pub creates: u64,
    pub updates: u64,
    pub deletes: u64,
}

#[derive(Default)]
struct State {
    next_id: i64,
    subject_properties: HashMap<i64, SubjectProperty>,
    approaches: HashMap<i64, Approach>,
    comps: HashMap<i64, Comp>,
    quantitative_adjustments: Vec<QuantitativeAdjustment>,
    qualitative_adjustments: Vec<QualitativeAdjustment>,
    income_approaches: HashMap<i64, IncomeApproach>,
    income_sources: HashMap<i64, IncomeSource>,
    other_income_sources: HashMap<i64, OtherIncomeSource>,
    operating_expenses: HashMap<i64, OperatingExpense>,
    cost_approaches: HashMap<i64, CostApproach>,
    improvements: HashMap<i64, Improvement>,
    sales_approaches: HashMap<i64, SalesApproach>,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

pub struct MemoryStore {
    state: Mutex<State>,
    creates: AtomicU64,
    updates: AtomicU64,
    deletes: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Arc<MemoryStore> {
        Arc::new(MemoryStore {
            state: Mutex::new(State::default()),
            creates: AtomicU64::new(0),
            updates: AtomicU64::new(0),
            deletes: AtomicU64::new(0),
        })
    }

    /// Bundle this store into a [`Datastore`] handle.
    pub fn datastore(self: &Arc<Self>) -> Datastore {
        Datastore {
            subject_properties: self.clone(),
            approaches: self.clone(),
            comps: self.clone(),
            quantitative_adjustments: self.clone(),
            qualitative_adjustments: self.clone(),
            income_approaches: self.clone(),
            income_sources: self.clone(),
            other_income_sources: self.clone(),
            operating_expenses: self.clone(),
            cost_approaches: self.clone(),
            improvements: self.clone(),
            sales_approaches: self.clone(),
        }
    }

    pub fn op_counts(&self) -> OpCounts {
        OpCounts {
            creates: self.creates.load(Ordering::SeqCst),
            updates: self.updates.load(Ordering::SeqCst),
            deletes: self.deletes.load(Ordering::SeqCst),
        }
    }

    fn lock(&self) -> AppResult<std::sync::MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| AppError::Store("memory store poisoned".to_string()))
    }

    fn created(&self) {
        self.creates.fetch_add(1, Ordering::SeqCst);
    }

    fn updated(&self) {
        self.updates.fetch_add(1, Ordering::SeqCst);
    }

    fn deleted(&self, count: u64) {
        self.deletes.fetch_add(count, Ordering::SeqCst);
    }
}

#[async_trait]
impl crate::store::SubjectPropertyStore for MemoryStore {
    async fn find_one(&self, id: i64) -> AppResult<Option<SubjectProperty>> {
        Ok(self.lock()?.subject_properties.get(&id).cloned())
    }

    async fn create(&self, mut attrs: SubjectProperty) -> AppResult<SubjectProperty> {
        let mut state = self.lock()?;
        attrs.id = state.next_id();
        state.subject_properties.insert(attrs.id, attrs.clone());
        drop(state);
        self.created();
        Ok(attrs)
    }

    async fn update(&self, subject: &SubjectProperty) -> AppResult<bool> {
        let mut state = self.lock()?;
        let found = state.subject_properties.contains_key(&subject.id);
        if found {
            state.subject_properties.insert(subject.id, subject.clone());
            drop(state);
            self.updated();
        }
        Ok(found)
    }
}

#[async_trait]
impl crate::store::ApproachStore for MemoryStore {
    async fn find_all(&self, subject_property_id: i64) -> AppResult<Vec<Approach>> {
        let state = self.lock()?;
        let mut rows: Vec<Approach> = state
            .approaches
            .values()
            .filter(|a| a.subject_property_id == subject_property_id)
            .cloned()
            .collect();
        rows.sort_by_key(|a| a.id);
        Ok(rows)
    }

    async fn find_one(&self, id: i64) -> AppResult<Option<Approach>> {
        Ok(self.lock()?.approaches.get(&id).cloned())
    }

    async fn create(&self, mut attrs: Approach) -> AppResult<Approach> {
        let mut state = self.lock()?;
        let duplicate = state.approaches.values().any(|a| {
            a.subject_property_id == attrs.subject_property_id
                && a.approach_type == attrs.approach_type
        });
        if duplicate {
            return Err(AppError::Conflict(format!(
                "approach {} already exists for subject property {}",
                attrs.approach_type, attrs.subject_property_id
            )));
        }
        attrs.id = state.next_id();
        attrs.updated_at = Utc::now();
        state.approaches.insert(attrs.id, attrs.clone());
        drop(state);
        self.created();
        Ok(attrs)
    }

    async fn update(&self, approach: &Approach) -> AppResult<bool> {
        let mut state = self.lock()?;
        let found = state.approaches.contains_key(&approach.id);
        if found {
            let mut row = approach.clone();
            row.updated_at = Utc::now();
            state.approaches.insert(row.id, row);
            drop(state);
            self.updated();
        }
        Ok(found)
    }

    async fn delete(&self, id: i64) -> AppResult<bool> {
        let removed = self.lock()?.approaches.remove(&id).is_some();
        if removed {
            self.deleted(1);
        }
        Ok(removed)
    }
}

#[async_trait]
impl crate::store::CompStore for MemoryStore {
    async fn find_all(&self, approach_id: i64) -> AppResult<Vec<Comp>> {
        let state = self.lock()?;
        let mut rows: Vec<Comp> = state
            .comps
            .values()
            .filter(|c| c.approach_id == approach_id)
            .cloned()
            .collect();
        rows.sort_by_key(|c| (c.order, c.id));
        Ok(rows)
    }

    async fn create(&self, mut attrs: Comp) -> AppResult<Comp> {
        let mut state = self.lock()?;
        attrs.id = state.next_id();
        attrs.updated_at = Utc::now();
        state.comps.insert(attrs.id, attrs.clone());
        drop(state);
        self.created();
        Ok(attrs)
    }

    async fn update(&self, comp: &Comp) -> AppResult<bool> {
        let mut state = self.lock()?;
        let found = state.comps.contains_key(&comp.id);
        if found {
            let mut row = comp.clone();
            row.updated_at = Utc::now();
            state.comps.insert(row.id, row);
            drop(state);
            self.updated();
        }
        Ok(found)
    }

    async fn delete(&self, id: i64) -> AppResult<bool> {
        let removed = self.lock()?.comps.remove(&id).is_some();
        if removed {
            self.deleted(1);
        }
        Ok(removed)
    }
}

#[async_trait]
impl crate::store::QuantAdjustmentStore for MemoryStore {
    async fn find_all(&self, owner: AdjustmentOwner) -> AppResult<Vec<QuantitativeAdjustment>> {
        let state = self.lock()?;
        let mut rows: Vec<QuantitativeAdjustment> = state
            .quantitative_adjustments
            .iter()
            .filter(|a| a.owner == owner)
            .cloned()
            .collect();
        rows.sort_by_key(|a| (a.order, a.id));
        Ok(rows)
    }

    async fn create(&self, mut attrs: QuantitativeAdjustment) -> AppResult<QuantitativeAdjustment> {
        let mut state = self.lock()?;
        attrs.id = state.next_id();
        state.quantitative_adjustments.push(attrs.clone());
        drop(state);
        self.created();
        Ok(attrs)
    }

    async fn update(&self, adjustment: &QuantitativeAdjustment) -> AppResult<bool> {
        let mut state = self.lock()?;
        let row = state
            .quantitative_adjustments
            .iter_mut()
            .find(|a| a.owner == adjustment.owner && a.adj_key == adjustment.adj_key);
        match row {
            Some(row) => {
                row.adj_value = adjustment.adj_value;
                row.order = adjustment.order;
                drop(state);
                self.updated();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, owner: AdjustmentOwner, adj_key: &str) -> AppResult<bool> {
        let mut state = self.lock()?;
        let before = state.quantitative_adjustments.len();
        state
            .quantitative_adjustments
            .retain(|a| !(a.owner == owner && a.adj_key == adj_key));
        let removed = state.quantitative_adjustments.len() < before;
        drop(state);
        if removed {
            self.deleted(1);
        }
        Ok(removed)
    }

    async fn delete_all(&self, owner: AdjustmentOwner) -> AppResult<u64> {
        let mut state = self.lock()?;
        let before = state.quantitative_adjustments.len();
        state.quantitative_adjustments.retain(|a| a.owner != owner);
        let removed = (before - state.quantitative_adjustments.len()) as u64;
        drop(state);
        self.deleted(removed);
        Ok(removed)
    }
}

#[async_trait]
impl crate::store::QualAdjustmentStore for MemoryStore {
    async fn find_all(&self, owner: AdjustmentOwner) -> AppResult<Vec<QualitativeAdjustment>> {
        let state = self.lock()?;
        let mut rows: Vec<QualitativeAdjustment> = state
            .qualitative_adjustments
            .iter()
            .filter(|a| a.owner == owner)
            .cloned()
            .collect();
        rows.sort_by_key(|a| (a.order, a.id));
        Ok(rows)
    }

    async fn create(&self, mut attrs: QualitativeAdjustment) -> AppResult<QualitativeAdjustment> {
        let mut state = self.lock()?;
        attrs.id = state.next_id();
        state.qualitative_adjustments.push(attrs.clone());
        drop(state);
        self.created();
        Ok(attrs)
    }

    async fn update(&self, adjustment: &QualitativeAdjustment) -> AppResult<bool> {
        let mut state = self.lock()?;
        let row = state
            .qualitative_adjustments
            .iter_mut()
            .find(|a| a.owner == adjustment.owner && a.adj_key == adjustment.adj_key);
        match row {
            Some(row) => {
                row.adj_value = adjustment.adj_value.clone();
                row.subject_property_value = adjustment.subject_property_value.clone();
                row.order = adjustment.order;
                drop(state);
                self.updated();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, owner: AdjustmentOwner, adj_key: &str) -> AppResult<bool> {
        let mut state = self.lock()?;
        let before = state.qualitative_adjustments.len();
        state
            .qualitative_adjustments
            .retain(|a| !(a.owner == owner && a.adj_key == adj_key));
        let removed = state.qualitative_adjustments.len() < before;
        drop(state);
        if removed {
            self.deleted(1);
        }
        Ok(removed)
    }

    async fn delete_all(&self, owner: AdjustmentOwner) -> AppResult<u64> {
        let mut state = self.lock()?;
        let before = state.qualitative_adjustments.len();
        state.qualitative_adjustments.retain(|a| a.owner != owner);
        let removed = (before - state.qualitative_adjustments.len()) as u64;
        drop(state);
        self.deleted(removed);
        Ok(removed)
    }
}

#[async_trait]
impl crate::store::IncomeApproachStore for MemoryStore {
    async fn find_by_approach(&self, approach_id: i64) -> AppResult<Option<IncomeApproach>> {
        let state = self.lock()?;
        Ok(state
            .income_approaches
            .values()
            .find(|r| r.approach_id == approach_id)
            .cloned())
    }

    async fn create(&self, mut attrs: IncomeApproach) -> AppResult<IncomeApproach> {
        let mut state = self.lock()?;
        attrs.id = state.next_id();
        attrs.updated_at = Utc::now();
        state.income_approaches.insert(attrs.id, attrs.clone());
        drop(state);
        self.created();
        Ok(attrs)
    }

    async fn update(&self, row: &IncomeApproach) -> AppResult<bool> {
        let mut state = self.lock()?;
        let found = state.income_approaches.contains_key(&row.id);
        if found {
            let mut row = row.clone();
            row.updated_at = Utc::now();
            state.income_approaches.insert(row.id, row);
            drop(state);
            self.updated();
        }
        Ok(found)
    }
}

#[async_trait]
impl crate::store::IncomeSourceStore for MemoryStore {
    async fn find_all(&self, income_approach_id: i64) -> AppResult<Vec<IncomeSource>> {
        let state = self.lock()?;
        let mut rows: Vec<IncomeSource> = state
            .income_sources
            .values()
            .filter(|r| r.income_approach_id == income_approach_id)
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.id);
        Ok(rows)
    }

    async fn create(&self, mut attrs: IncomeSource) -> AppResult<IncomeSource> {
        let mut state = self.lock()?;
        attrs.id = state.next_id();
        attrs.updated_at = Utc::now();
        state.income_sources.insert(attrs.id, attrs.clone());
        drop(state);
        self.created();
        Ok(attrs)
    }

    async fn update(&self, row: &IncomeSource) -> AppResult<bool> {
        let mut state = self.lock()?;
        let found = state.income_sources.contains_key(&row.id);
        if found {
            let mut row = row.clone();
            row.updated_at = Utc::now();
            state.income_sources.insert(row.id, row);
            drop(state);
            self.updated();
        }
        Ok(found)
    }

    async fn delete(&self, id: i64) -> AppResult<bool> {
        let removed = self.lock()?.income_sources.remove(&id).is_some();
        if removed {
            self.deleted(1);
        }
        Ok(removed)
    }
}

#[async_trait]
impl crate::store::OtherIncomeSourceStore for MemoryStore {
    async fn find_all(&self, income_approach_id: i64) -> AppResult<Vec<OtherIncomeSource>> {
        let state = self.lock()?;
        let mut rows: Vec<OtherIncomeSource> = state
            .other_income_sources
            .values()
            .filter(|r| r.income_approach_id == income_approach_id)
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.id);
        Ok(rows)
    }

    async fn create(&self, mut attrs: OtherIncomeSource) -> AppResult<OtherIncomeSource> {
        let mut state = self.lock()?;
        attrs.id = state.next_id();
        attrs.updated_at = Utc::now();
        state.other_income_sources.insert(attrs.id, attrs.clone());
        drop(state);
        self.created();
        Ok(attrs)
    }

    async fn update(&self, row: &OtherIncomeSource) -> AppResult<bool> {
        let mut state = self.lock()?;
        let found = state.other_income_sources.contains_key(&row.id);
        if found {
            let mut row = row.clone();
            row.updated_at = Utc::now();
            state.other_income_sources.insert(row.id, row);
            drop(state);
            self.updated();
        }
        Ok(found)
    }

    async fn delete(&self, id: i64) -> AppResult<bool> {
        let removed = self.lock()?.other_income_sources.remove(&id).is_some();
        if removed {
            self.deleted(1);
        }
        Ok(removed)
    }
}

#[async_trait]
impl crate::store::OperatingExpenseStore for MemoryStore {
    async fn find_all(&self, income_approach_id: i64) -> AppResult<Vec<OperatingExpense>> {
        let state = self.lock()?;
        let mut rows: Vec<OperatingExpense> = state
            .operating_expenses
            .values()
            .filter(|r| r.income_approach_id == income_approach_id)
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.id);
        Ok(rows)
    }

    async fn create(&self, mut attrs: OperatingExpense) -> AppResult<OperatingExpense> {
        let mut state = self.lock()?;
        attrs.id = state.next_id();
        attrs.updated_at = Utc::now();
        state.operating_expenses.insert(attrs.id, attrs.clone());
        drop(state);
        self.created();
        Ok(attrs)
    }

    async fn update(&self, row: &OperatingExpense) -> AppResult<bool> {
        let mut state = self.lock()?;
        let found = state.operating_expenses.contains_key(&row.id);
        if found {
            let mut row = row.clone();
            row.updated_at = Utc::now();
            state.operating_expenses.insert(row.id, row);
            drop(state);
            self.updated();
        }
        Ok(found)
    }

    async fn delete(&self, id: i64) -> AppResult<bool> {
        let removed = self.lock()?.operating_expenses.remove(&id).is_some();
        if removed {
            self.deleted(1);
        }
        Ok(removed)
    }
}

#[async_trait]
impl crate::store::CostApproachStore for MemoryStore {
    async fn find_by_approach(&self, approach_id: i64) -> AppResult<Option<CostApproach>> {
        let state = self.lock()?;
        Ok(state
            .cost_approaches
            .values()
            .find(|r| r.approach_id == approach_id)
            .cloned())
    }

    async fn create(&self, mut attrs: CostApproach) -> AppResult<CostApproach> {
        let mut state = self.lock()?;
        attrs.id = state.next_id();
        attrs.updated_at = Utc::now();
        state.cost_approaches.insert(attrs.id, attrs.clone());
        drop(state);
        self.created();
        Ok(attrs)
    }

    async fn update(&self, row: &CostApproach) -> AppResult<bool> {
        let mut state = self.lock()?;
        let found = state.cost_approaches.contains_key(&row.id);
        if found {
            let mut row = row.clone();
            row.updated_at = Utc::now();
            state.cost_approaches.insert(row.id, row);
            drop(state);
            self.updated();
        }
        Ok(found)
    }
}

#[async_trait]
impl crate::store::ImprovementStore for MemoryStore {
    async fn find_all(&self, cost_approach_id: i64) -> AppResult<Vec<Improvement>> {
        let state = self.lock()?;
        let mut rows: Vec<Improvement> = state
            .improvements
            .values()
            .filter(|r| r.cost_approach_id == cost_approach_id)
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.id);
        Ok(rows)
    }

    async fn create(&self, mut attrs: Improvement) -> AppResult<Improvement> {
        let mut state = self.lock()?;
        attrs.id = state.next_id();
        attrs.updated_at = Utc::now();
        state.improvements.insert(attrs.id, attrs.clone());
        drop(state);
        self.created();
        Ok(attrs)
    }

    async fn update(&self, row: &Improvement) -> AppResult<bool> {
        let mut state = self.lock()?;
        let found = state.improvements.contains_key(&row.id);
        if found {
            let mut row = row.clone();
            row.updated_at = Utc::now();
            state.improvements.insert(row.id, row);
            drop(state);
            self.updated();
        }
        Ok(found)
    }

    async fn delete(&self, id: i64) -> AppResult<bool> {
        let removed = self.lock()?.improvements.remove(&id).is_some();
        if removed {
            self.deleted(1);
        }
        Ok(removed)
    }
}

#[async_trait]
impl crate::store::SalesApproachStore for MemoryStore {
    async fn find_by_approach(&self, approach_id: i64) -> AppResult<Option<SalesApproach>> {
        let state = self.lock()?;
        Ok(state
            .sales_approaches
            .values()
            .find(|r| r.approach_id == approach_id)
            .cloned())
    }

    async fn create(&self, mut attrs: SalesApproach) -> AppResult<SalesApproach> {
        let mut state = self.lock()?;
        attrs.id = state.next_id();
        attrs.updated_at = Utc::now();
        state.sales_approaches.insert(attrs.id, attrs.clone());
        drop(state);
        self.created();
        Ok(attrs)
    }

    async fn update(&self, row: &SalesApproach) -> AppResult<bool> {
        let mut state = self.lock()?;
        let found = state.sales_approaches.contains_key(&row.id);
        if found {
            let mut row = row.clone();
            row.updated_at = Utc::now();
            state.sales_approaches.insert(row.id, row);
            drop(state);
            self.updated();
        }
        Ok(found)
    }
}
