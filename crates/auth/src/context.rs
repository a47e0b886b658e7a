//! Authenticated viewer context

use uuid::Uuid;

use crate::claims::SupabaseClaims;
use crate::error::AuthError;

/// Marketplace role chosen at sign-up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserType {
    Student,
    Landlord,
}

impl std::fmt::Display for UserType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserType::Student => write!(f, "student"),
            UserType::Landlord => write!(f, "landlord"),
        }
    }
}

/// The user viewing the inbox
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub user_type: UserType,
}

impl AuthContext {
    pub fn new(user_id: Uuid, email: Option<String>, user_type: UserType) -> Self {
        Self {
            user_id,
            email,
            user_type,
        }
    }

    /// Build a context from validated claims. Missing `user_type` means student.
    pub fn from_claims(claims: &SupabaseClaims) -> Result<Self, AuthError> {
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidUserId)?;

        let user_type = match claims
            .user_metadata
            .as_ref()
            .and_then(|m| m.user_type.as_deref())
        {
            Some("landlord") => UserType::Landlord,
            _ => UserType::Student,
        };

        Ok(Self::new(user_id, claims.email.clone(), user_type))
    }

    pub fn is_landlord(&self) -> bool {
        self.user_type == UserType::Landlord
    }
}
