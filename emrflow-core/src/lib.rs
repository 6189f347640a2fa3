//! emrflow Core
//!
//! Core types for the emrflow ETL handlers.
//!
//! This crate contains:
//! - Domain types: pipeline messages, the cluster job definition, step states
//! - DTOs: inbound event shapes delivered by the hosting runtime
//! - Validation: matching queue message bodies against the trigger payload

pub mod domain;
pub mod dto;
pub mod error;
pub mod validation;

pub use error::EventError;
