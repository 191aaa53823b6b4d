//! @ai:module:intent Batch grading of many tools across scenarios
//! @ai:module:layer application
//! @ai:module:public_api BatchAggregator, BatchReport, Submission, discover_submissions

pub mod discovery;
pub mod executor;
pub mod stats;
pub mod types;

pub use discovery::discover_submissions;
pub use executor::{build_report, BatchAggregator};
pub use types::{
    BatchEntry, BatchReport, Consistency, ModuleUsage, ScenarioRankEntry, ScenarioStats,
    Submission, SubmissionSource, ToolStats,
};
