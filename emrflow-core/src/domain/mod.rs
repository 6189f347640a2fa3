//! Core domain types
//!
//! These types describe what the handlers act on. They carry no I/O and are
//! shared between the launcher (job submission) and the monitor (outcome
//! routing).

pub mod cluster;
pub mod message;
pub mod policy;
pub mod step;
