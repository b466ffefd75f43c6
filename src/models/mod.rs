//! Domain models: plain value structs for the appraisal entity tree.

pub mod approach;
pub mod comp;
pub mod cost;
pub mod income;
pub mod sales;
pub mod subject;

// Re-export commonly used types
pub use approach::{
    AnalysisType, Approach, ApproachSaveRequest, ApproachType, CompAdjustmentMode, CompType,
    ComparisonBasis, LandDimension,
};
pub use comp::{
    AdjustmentInput, AdjustmentOwner, Comp, CompInput, QualitativeAdjustment,
    QualitativeAdjustmentInput, QuantitativeAdjustment,
};
pub use cost::{CostApproach, Improvement, ImprovementInput};
pub use income::{
    IncomeApproach, IncomeSaveRequest, IncomeSource, IncomeSourceInput, OperatingExpense,
    OperatingExpenseInput, OtherIncomeSource, OtherIncomeSourceInput,
};
pub use sales::SalesApproach;
pub use subject::{SubjectProperty, Zoning};
