//! HTTP handlers for the Messaging domain

pub mod inbox;
pub mod messages;
pub mod properties;

// Re-export handler functions for easier access
pub use inbox::*;
pub use messages::*;
pub use properties::*;
