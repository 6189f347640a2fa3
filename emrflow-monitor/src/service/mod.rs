//! Service layer
//!
//! Routes step outcomes to the downstream queue or the alert topic, using the
//! repositories from `emrflow-client`.

mod alert;
mod outcome;

pub use outcome::{OutcomeService, RoutingTargets, StandardOutcomeService, StepDisposition};
