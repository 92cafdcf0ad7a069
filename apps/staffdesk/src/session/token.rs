//! Bearer token claims.
//!
//! Tokens minted for the bundled credential set are the base64 encoding of a
//! small JSON claims object. Backend tokens are usually JWTs; only the payload
//! segment is read, the signature is never checked here.

use base64::engine::general_purpose::{STANDARD, URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{RecordId, UserRole};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TokenClaims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
}

impl TokenClaims {
    pub fn subject(&self) -> Option<RecordId> {
        self.sub.as_ref().and_then(RecordId::from_json)
    }

    /// HR unless the claims name a recognised role.
    pub fn role(&self) -> UserRole {
        self.role
            .as_deref()
            .map(UserRole::parse_lenient)
            .unwrap_or_default()
    }
}

/// Mints a token for a locally verified user.
pub fn issue(id: &RecordId, email: &str, role: UserRole) -> String {
    let claims = TokenClaims {
        sub: Some(Value::from(id.as_str())),
        email: Some(email.to_string()),
        name: None,
        role: Some(role.as_str().to_string()),
        iat: Some(Utc::now().timestamp_millis()),
    };
    // Serializing a struct of strings and integers cannot fail.
    let json = serde_json::to_vec(&claims).unwrap_or_default();
    STANDARD.encode(json)
}

fn decode_segment(segment: &str) -> Option<TokenClaims> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .or_else(|_| URL_SAFE.decode(segment))
        .or_else(|_| STANDARD.decode(segment))
        .ok()?;
    serde_json::from_slice(&bytes).ok()
}

/// Reads the claims from either a JWT or a whole-token base64 JSON blob.
pub fn decode(token: &str) -> Option<TokenClaims> {
    let token = token.trim();
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() == 3 {
        return decode_segment(parts[1]);
    }
    decode_segment(token)
}
