//! Repository layer
//!
//! Repositories are stateless adapters over the mediator HTTP API. They expose
//! exactly what the poll loop needs, with no business logic, behind a trait so
//! the loop can be tested against in-memory fakes.

mod jobs;

pub use jobs::{HttpJobRepository, JobRepository};
