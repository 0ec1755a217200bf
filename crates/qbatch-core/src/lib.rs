//! qbatch-core
//!
//! Shared domain types, collaborator traits, error type and configuration for
//! the batch query runner crates.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
