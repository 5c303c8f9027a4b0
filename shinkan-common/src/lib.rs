//! # shinkan Common Library
//!
//! Shared code for the shinkan crates:
//! - Database models, schema and read-only queries
//! - Enumerations (media types, catalog services, states)
//! - Configuration loading and source-priority ranking
//! - Error types

pub mod config;
pub mod db;
pub mod enums;
pub mod error;

pub use config::SourcePriority;
pub use error::{Error, Result};
