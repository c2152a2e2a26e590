//! Tether Core
//!
//! Core types shared by the Tether polling agent, the mediator client and the CLI.
//!
//! This crate contains:
//! - Domain types: jobs, inference outcomes and reported results
//! - DTOs: wire shapes exchanged with the mediator, validated into domain types

pub mod domain;
pub mod dto;
