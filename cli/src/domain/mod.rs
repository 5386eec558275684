//! Domain layer — pure types and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.

pub mod config;
pub mod error;
pub mod instance;

pub use config::Settings;
pub use error::InstanceError;
pub use instance::Instance;
