//! Credential verification. Logins are checked either against the bundled
//! demo users or against the REST backend; the session manager only sees the
//! `CredentialVerifier` trait.

use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::models::{AuthUser, RecordId, UserRole};
use crate::session::token;
use crate::session::AuthError;
use crate::store::remote::RemoteStore;

/// Checks submitted credentials and, on success, produces the session user.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    async fn verify(&self, email: &str, password: &str) -> Result<AuthUser, AuthError>;

    /// Short label for logs.
    fn backend(&self) -> &'static str;
}

#[derive(Debug, Clone, Deserialize)]
pub struct Credential {
    pub id: RecordId,
    pub email: String,
    pub password: String,
    pub role: UserRole,
    pub name: String,
}

/// A fixed list of demo users.
#[derive(Debug, Clone)]
pub struct StaticCredentials {
    users: Vec<Credential>,
}

impl StaticCredentials {
    pub fn new(users: Vec<Credential>) -> Self {
        Self { users }
    }

    pub fn bundled() -> Self {
        Self::new(vec![
            Credential {
                id: RecordId::from(1),
                email: "owner@company.com".into(),
                password: "owner123".into(),
                role: UserRole::SuperAdmin,
                name: "Company Owner".into(),
            },
            Credential {
                id: RecordId::from(2),
                email: "hr@company.com".into(),
                password: "hr123".into(),
                role: UserRole::Hr,
                name: "HR User".into(),
            },
        ])
    }

    /// Users from a JSON file, or the bundled set if the file is unusable.
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::bundled();
        };
        let parsed = std::fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|text| {
                serde_json::from_str::<Vec<Credential>>(&text).map_err(|e| e.to_string())
            });
        match parsed {
            Ok(users) => {
                info!("Loaded {} users from {}", users.len(), path.display());
                Self::new(users)
            }
            Err(e) => {
                warn!(
                    "Cannot use users file {}: {e}; falling back to bundled users",
                    path.display()
                );
                Self::bundled()
            }
        }
    }
}

#[async_trait]
impl CredentialVerifier for StaticCredentials {
    async fn verify(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        let email = email.trim();
        let user = self
            .users
            .iter()
            .find(|u| u.email == email && u.password == password)
            .ok_or(AuthError::InvalidCredentials)?;

        Ok(AuthUser {
            id: user.id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role,
            token: token::issue(&user.id, &user.email, user.role),
        })
    }

    fn backend(&self) -> &'static str {
        "static"
    }
}

/// Delegates to the backend's `/auth/login` endpoint.
#[derive(Clone)]
pub struct BackendCredentials {
    remote: RemoteStore,
}

impl BackendCredentials {
    pub fn new(remote: RemoteStore) -> Self {
        Self { remote }
    }
}

fn string_at(value: Option<&Value>, key: &str) -> Option<String> {
    value
        .and_then(|v| v.get(key))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Builds the session user from a backend login response.
pub fn user_from_login_body(body: &Value, submitted_email: &str) -> Result<AuthUser, AuthError> {
    let token = ["accessToken", "access_token", "token"]
        .iter()
        .find_map(|k| string_at(Some(body), k))
        .ok_or(AuthError::MissingToken)?;

    let claims = token::decode(&token).unwrap_or_default();
    let user = body.get("user");

    let id = user
        .and_then(|u| u.get("id").or_else(|| u.get("_id")))
        .and_then(RecordId::from_json)
        .or_else(|| claims.subject())
        .unwrap_or_default();
    let email = string_at(user, "email")
        .or_else(|| claims.email.clone())
        .unwrap_or_else(|| submitted_email.trim().to_string());
    let name = string_at(user, "name")
        .or_else(|| claims.name.clone())
        .unwrap_or_else(|| email.clone());
    let role = string_at(user, "role")
        .map(|r| UserRole::parse_lenient(&r))
        .unwrap_or_else(|| claims.role());

    Ok(AuthUser {
        id,
        email,
        name,
        role,
        token,
    })
}

#[async_trait]
impl CredentialVerifier for BackendCredentials {
    async fn verify(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        let body = self
            .remote
            .login(email, password)
            .await
            .map_err(|e| match e.status() {
                Some(400 | 401 | 403 | 404) => AuthError::InvalidCredentials,
                _ => AuthError::Backend(e),
            })?;
        user_from_login_body(&body, email)
    }

    fn backend(&self) -> &'static str {
        "backend"
    }
}
