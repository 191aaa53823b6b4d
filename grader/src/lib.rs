//! @ai:module:intent Scenario grading and batch comparison of generated embedded C code
//! @ai:module:layer application
//! @ai:module:public_api config, rubric, evaluator, batch, report

pub mod batch;
pub mod config;
pub mod evaluator;
pub mod report;
pub mod rubric;

pub use batch::{BatchAggregator, BatchReport, Submission};
pub use config::GraderConfig;
pub use evaluator::{EvaluationError, ScenarioEvaluator, ScenarioEvaluatorTrait, ScoredResult};
pub use report::{BatchRecord, EvaluationRecord, ReportGenerator};
pub use rubric::{Category, RubricError, RubricSet, ScenarioRubric};
