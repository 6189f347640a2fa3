//! Inbound event DTOs
//!
//! Shapes of the events the hosting runtime delivers to the handlers. They
//! are parsed from raw JSON so that a malformed event surfaces as a typed
//! [`EventError`](crate::EventError) instead of a runtime-level failure.

pub mod queue;
pub mod step;
