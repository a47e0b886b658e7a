//! Shared utilities, configuration, and error handling for CampusNest
//!
//! This crate provides common functionality used across the CampusNest workspace:
//! - Configuration management following 12-factor principles
//! - Error types and handling
//! - Request extractors shared by domain routers
//! - State machine error types

pub mod config;
pub mod error;
pub mod extractors;
pub mod state;

pub use config::{Config, LogFormat, MessageStoreKind};
pub use error::{Error, Result};
pub use extractors::{Pagination, ValidatedJson};
pub use state::StateError;
