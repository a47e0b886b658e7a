//! JWT claims types

use serde::{Deserialize, Serialize};

/// Profile metadata Supabase embeds at sign-up
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserMetadata {
    /// `student` or `landlord`
    pub user_type: Option<String>,
    pub full_name: Option<String>,
}

/// JWT claims from Supabase
#[derive(Debug, Serialize, Deserialize)]
pub struct SupabaseClaims {
    /// Subject (user ID)
    pub sub: String,
    /// Email
    pub email: Option<String>,
    /// Issued at
    pub iat: u64,
    /// Expires at
    pub exp: u64,
    /// Audience
    pub aud: String,
    /// Role (authenticated user)
    pub role: String,
    #[serde(default)]
    pub user_metadata: Option<UserMetadata>,
}
