// saga/src/lib.rs

//! checkout-saga: a small async saga engine.
//!
//! A saga is an ordered list of named steps over shared state with:
//!  - before/on/after handlers per step,
//!  - a per-step failure policy (`Fatal` aborts, `BestEffort` degrades),
//!  - optional skip conditions evaluated against the current state,
//!  - early halting via `StepControl::Halt`,
//!  - an intent journal that records each step's start and outcome so an
//!    interrupted run can be resolved after a crash.

pub mod core;
pub mod error;
pub mod journal;
pub mod saga;

pub use crate::core::control::{SagaOutcome, SagaReport, StepControl, StepDisposition, StepRecord};
pub use crate::core::handler::{Annotator, Handler};
pub use crate::core::saga_data::SagaData;
pub use crate::core::step::{SkipCondition, StepDef, StepPolicy};

pub use crate::journal::{resolve_step, InMemoryJournal, IntentEntry, IntentJournal, IntentPhase, StepResolution};
pub use crate::saga::definition::Saga;

pub use crate::error::{SagaError, SagaResult};
