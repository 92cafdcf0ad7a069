//! Session lifecycle: anonymous -> authenticated -> anonymous.
//!
//! The session is created by a successful login, persisted under
//! [`SESSION_KEY`] and destroyed by logout or by the inactivity monitor.

pub mod credentials;
pub mod handlers;
pub mod idle;
pub mod token;

use std::sync::{Arc, PoisonError, RwLock};

use thiserror::Error;
use tracing::{info, warn};

use crate::models::{AuthUser, UserRole};
use crate::session::credentials::CredentialVerifier;
use crate::store::local::LocalStore;
use crate::store::remote::RemoteError;

pub const SESSION_KEY: &str = "erd_auth_user";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("No access token received")]
    MissingToken,

    #[error("authentication backend unavailable: {0}")]
    Backend(#[from] RemoteError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AccessError {
    #[error("no active session")]
    Unauthenticated,

    #[error("role not permitted")]
    Forbidden,
}

/// Shared slot holding the current user. Cloning shares the slot.
#[derive(Debug, Clone, Default)]
pub struct SessionCell(Arc<RwLock<Option<AuthUser>>>);

impl SessionCell {
    pub fn get(&self) -> Option<AuthUser> {
        self.0.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn set(&self, user: Option<AuthUser>) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = user;
    }

    pub fn token(&self) -> Option<String> {
        self.0
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|u| u.token.clone())
            .filter(|t| !t.is_empty())
    }
}

#[derive(Clone)]
pub struct SessionManager {
    cell: SessionCell,
    store: LocalStore,
    verifier: Arc<dyn CredentialVerifier>,
}

impl SessionManager {
    pub fn new(cell: SessionCell, store: LocalStore, verifier: Arc<dyn CredentialVerifier>) -> Self {
        Self {
            cell,
            store,
            verifier,
        }
    }

    /// Loads a persisted session, if any. Unreadable content means no session.
    pub fn restore(&self) -> Option<AuthUser> {
        let restored = self
            .store
            .read_value(SESSION_KEY)
            .and_then(|value| match serde_json::from_value::<AuthUser>(value) {
                Ok(user) => Some(user),
                Err(e) => {
                    warn!("Discarding stored session: {e}");
                    None
                }
            });
        if let Some(user) = &restored {
            info!("Restored session for {} ({})", user.email, user.role.as_str());
        }
        self.cell.set(restored.clone());
        restored
    }

    /// Verifies the credentials and, on success, replaces the current session.
    /// A failed attempt leaves any existing session untouched.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        let user = match self.verifier.verify(email, password).await {
            Ok(user) => user,
            Err(e) => {
                warn!("Login failed for {} via {}: {e}", email.trim(), self.verifier.backend());
                return Err(e);
            }
        };

        if let Err(e) = self.store.write_value(SESSION_KEY, &user) {
            warn!("Session for {} will not survive a restart: {e}", user.email);
        }
        self.cell.set(Some(user.clone()));
        info!("Signed in {} as {}", user.email, user.role.as_str());
        Ok(user)
    }

    /// Clears the session in memory and in durable storage.
    pub fn logout(&self) {
        if let Some(user) = self.cell.get() {
            info!("Signed out {}", user.email);
        }
        self.cell.set(None);
        if let Err(e) = self.store.remove(SESSION_KEY) {
            warn!("Failed to clear stored session: {e}");
        }
    }

    pub fn current(&self) -> Option<AuthUser> {
        self.cell.get()
    }

    pub fn is_authenticated(&self) -> bool {
        self.cell.get().is_some()
    }

    /// True if signed in with one of `roles`.
    pub fn has_role(&self, roles: &[UserRole]) -> bool {
        self.cell
            .get()
            .is_some_and(|u| roles.contains(&u.role))
    }

    pub fn bearer_token(&self) -> Option<String> {
        self.cell.token()
    }

    /// Checks a presented token against the active session. An empty `roles`
    /// list admits any signed-in user.
    pub fn authorize(&self, token: Option<&str>, roles: &[UserRole]) -> Result<AuthUser, AccessError> {
        let user = self.cell.get().ok_or(AccessError::Unauthenticated)?;
        match token {
            Some(t) if !t.is_empty() && t == user.token => {}
            _ => return Err(AccessError::Unauthenticated),
        }
        if roles.is_empty() || roles.contains(&user.role) {
            Ok(user)
        } else {
            Err(AccessError::Forbidden)
        }
    }
}
