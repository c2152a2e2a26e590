//! Core domain types
//!
//! These types describe a job after it has crossed the mediator boundary, the
//! outcome of running it against the inference backend, and the result sent back.

pub mod inference;
pub mod job;
pub mod report;
