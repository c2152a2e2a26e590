//! Data Transfer Objects for mediator communication
//!
//! DTOs mirror the JSON exchanged with the mediator. Payloads describing work are
//! converted into domain types at the boundary so that shape problems surface as
//! errors here rather than deep inside the agent.

pub mod job;
