//! Messaging domain model

pub mod aggregator;
pub mod entities;
pub mod state;
