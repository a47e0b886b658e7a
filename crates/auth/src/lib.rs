//! Authentication middleware for CampusNest
//!
//! Validates Supabase-issued JWTs and exposes the viewing user through axum
//! extractors that work with any domain state implementing `FromRef<S>` for `AuthBackend`.

mod backend;
mod claims;
mod config;
mod context;
mod error;
mod extractors;
mod jwt;

pub use backend::AuthBackend;
pub use claims::{SupabaseClaims, UserMetadata};
pub use config::AuthConfig;
pub use context::{AuthContext, UserType};
pub use error::AuthError;
pub use extractors::AuthUser;
