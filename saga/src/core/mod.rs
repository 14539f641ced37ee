// saga/src/core/mod.rs

pub mod control;
pub mod handler;
pub mod saga_data;
pub mod step;

pub use control::{SagaOutcome, SagaReport, StepControl, StepDisposition, StepRecord};
pub use handler::{Annotator, Handler};
pub use saga_data::SagaData;
pub use step::{SkipCondition, StepDef, StepPolicy};
