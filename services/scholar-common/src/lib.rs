//! Scholar Common - Shared types, utilities, and configuration for the Scholar
//! research assistant.
//!
//! This crate provides:
//! - Configuration types and loading (`config.json` + `secrets.json` + env)
//! - Configuration validation
//! - Error types and handling utilities
//! - Logging setup and structured logging helpers
//! - Utility functions used across Scholar crates

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod config;
pub mod config_loader;
pub mod error;
pub mod logging;
pub mod util;
pub mod validation;

pub use config::{
    AgentConfig, Config, LlmConfig, MemoryConfig, ObservabilityConfig, SearchConfig,
    SecretsConfig, ToolTimeoutPolicy,
};
pub use error::{Error, Result};
pub use validation::{Validate, ValidationError, ValidationResult};
