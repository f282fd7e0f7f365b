//! Conduct Core - Foundational Types
//!
//! Error taxonomy and control-plane connection settings shared by the
//! bundle tooling and the `conduct` CLI.

pub mod config;
pub mod error;

// Re-export commonly used types
pub use config::{supported_api_versions, ControlConfig};
pub use error::{ConductError, Result};

/// Conduct version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
