//! # pulse-core
//!
//! Core crate for Pulse. Contains the typed identifiers, configuration
//! schemas, and the unified error system shared by every other crate.
//!
//! This crate has **no** internal dependencies on other Pulse crates.

pub mod config;
pub mod error;
pub mod result;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
