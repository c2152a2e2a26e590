//! Configuration module
//!
//! Handles CLI configuration such as the mediator URL.

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the mediator API
    pub api_url: String,
}
