//! @ai:module:intent Scenario rubric definitions and loading
//! @ai:module:layer domain
//! @ai:module:public_api ScenarioRubric, ScenarioCheck, CheckKind, Category, CategoryWeights, Metric, RubricSet, RubricError

pub mod loader;
pub mod scenario;

pub use loader::{RubricError, RubricSet};
pub use scenario::{
    Category, CategoryWeights, CheckKind, Metric, ScenarioCheck, ScenarioRubric, WEIGHT_TOLERANCE,
};
