use serde::{Deserialize, Serialize};

use crate::models::id::RecordId;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum UserRole {
    SuperAdmin,
    #[default]
    #[serde(rename = "HR")]
    Hr,
}

impl UserRole {
    /// Anything that is not recognisably a super admin is HR.
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "superadmin" | "super_admin" | "super-admin" | "super admin" => UserRole::SuperAdmin,
            _ => UserRole::Hr,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::SuperAdmin => "SuperAdmin",
            UserRole::Hr => "HR",
        }
    }
}

/// The signed-in operator. Persisted as-is under the session storage key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthUser {
    pub id: RecordId,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub token: String,
}
