//! Service layer
//!
//! Services contain the launcher's business logic. They orchestrate calls to
//! the repositories from `emrflow-client` and return typed outcomes; deciding
//! what the runtime sees is left to the adapter in `main.rs`.

mod cleanup;
mod launch;

pub use cleanup::OutputCleaner;
pub use launch::{LaunchOutcome, LaunchService, StandardLaunchService};
