//! REST backend adapter.
//!
//! Every outgoing call carries the active session's bearer token. List
//! endpoints answer either with a bare array or with a `{ "data": [...] }`
//! envelope; both are unwrapped and normalized here.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{ApplicationStatus, JobApplication, RecordId};
use crate::session::SessionCell;
use crate::store::{Collection, DeleteOutcome, Entity, SaveOutcome};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("unexpected payload: {0}")]
    Payload(String),

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("the backend has no endpoint for {0}")]
    Unsupported(Collection),

    #[error("invalid backend URL: {0}")]
    InvalidUrl(String),
}

impl RemoteError {
    pub fn status(&self) -> Option<u16> {
        match self {
            RemoteError::Api { status, .. } => Some(*status),
            RemoteError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ApiErrorBody {
    Nested { error: ApiErrorMessage },
    Flat { message: String },
}

#[derive(Debug, Deserialize)]
struct ApiErrorMessage {
    message: String,
}

/// Pulls the record list out of a list response.
pub fn unwrap_envelope(body: Value) -> Result<Vec<Value>, RemoteError> {
    match body {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(items)) => Ok(items),
            Some(other) => Err(RemoteError::Payload(format!(
                "`data` is {} rather than a list",
                kind_of(&other)
            ))),
            None => Err(RemoteError::Payload("object without a `data` list".into())),
        },
        other => Err(RemoteError::Payload(format!(
            "expected a list, got {}",
            kind_of(&other)
        ))),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

/// Client for one backend base URL.
#[derive(Clone)]
pub struct RemoteStore {
    client: Client,
    base: Url,
    base_url: String,
    session: SessionCell,
    list_limit: usize,
}

impl RemoteStore {
    pub fn new(
        base_url: impl Into<String>,
        session: SessionCell,
        list_limit: usize,
    ) -> Result<Self, RemoteError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let base = Url::parse(&base_url)
            .map_err(|e| RemoteError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(RemoteError::InvalidUrl(base_url));
        }
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base,
            base_url,
            session,
            list_limit,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Base URL extended by `segments`, each percent-encoded as one path
    /// segment. Record ids therefore never add or climb path levels.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, RemoteError> {
        if let Some(bad) = segments.iter().find(|s| matches!(**s, "" | "." | "..")) {
            return Err(RemoteError::InvalidUrl(format!("illegal path segment '{bad}'")));
        }
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| RemoteError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn resource<E: Entity>() -> Result<&'static str, RemoteError> {
        E::COLLECTION
            .remote_path()
            .ok_or(RemoteError::Unsupported(E::COLLECTION))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match self.session.token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Sends the request and turns non-2xx answers into `RemoteError::Api`.
    async fn send(&self, request: RequestBuilder) -> Result<Response, RemoteError> {
        let response = self.authorized(request).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ApiErrorBody>(&body) {
            Ok(ApiErrorBody::Nested { error }) => error.message,
            Ok(ApiErrorBody::Flat { message }) => message,
            Err(_) => body,
        };
        if status.is_server_error() {
            warn!("Backend {} returned {}: {}", self.base_url, status, message);
        }
        Err(RemoteError::Api {
            status: status.as_u16(),
            message,
        })
    }

    /// Body as JSON, with an empty body read as `null`.
    async fn json_body(response: Response) -> Result<Value, RemoteError> {
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }

    pub async fn list<E: Entity>(&self) -> Result<Vec<E>, RemoteError> {
        let path = Self::resource::<E>()?;
        let request = self
            .client
            .get(self.endpoint(&[path])?)
            .query(&[("limit", self.list_limit)]);
        let body = Self::json_body(self.send(request).await?).await?;
        let records: Vec<E> = unwrap_envelope(body)?
            .iter()
            .enumerate()
            .map(|(position, raw)| E::normalize(raw, position))
            .collect();

        debug!(
            "Fetched {} {} from {}",
            records.len(),
            E::COLLECTION,
            self.base_url
        );
        Ok(records)
    }

    /// POST for new records, PUT for records with an id. A 404 on PUT means
    /// nothing matched and is reported as `Unmatched`.
    pub async fn save<E: Entity>(&self, record: &E) -> Result<SaveOutcome, RemoteError> {
        let path = Self::resource::<E>()?;
        let payload = record.remote_payload();

        if record.id().is_assigned() {
            let id = record.id().clone();
            let request = self
                .client
                .put(self.endpoint(&[path, id.as_str()])?)
                .json(&payload);
            return match self.send(request).await {
                Ok(_) => Ok(SaveOutcome::Updated(id)),
                Err(RemoteError::Api { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() => {
                    Ok(SaveOutcome::Unmatched(id))
                }
                Err(e) => Err(e),
            };
        }

        let request = self.client.post(self.endpoint(&[path])?).json(&payload);
        let body = Self::json_body(self.send(request).await?).await?;
        let id = ["id", "_id"]
            .iter()
            .filter_map(|k| body.get(*k).or_else(|| body.get("data").and_then(|d| d.get(*k))))
            .find_map(RecordId::from_json)
            .unwrap_or_default();
        Ok(SaveOutcome::Inserted(id))
    }

    pub async fn delete<E: Entity>(&self, id: &RecordId) -> Result<DeleteOutcome, RemoteError> {
        let path = Self::resource::<E>()?;
        let request = self.client.delete(self.endpoint(&[path, id.as_str()])?);
        match self.send(request).await {
            Ok(_) => Ok(DeleteOutcome::Deleted),
            Err(RemoteError::Api { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() => {
                Ok(DeleteOutcome::Absent)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn update_application_status(
        &self,
        id: &RecordId,
        status: ApplicationStatus,
    ) -> Result<SaveOutcome, RemoteError> {
        let path = Self::resource::<JobApplication>()?;
        let request = self
            .client
            .put(self.endpoint(&[path, id.as_str(), "status"])?)
            .json(&json!({ "status": status }));
        match self.send(request).await {
            Ok(_) => Ok(SaveOutcome::Updated(id.clone())),
            Err(RemoteError::Api { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() => {
                Ok(SaveOutcome::Unmatched(id.clone()))
            }
            Err(e) => Err(e),
        }
    }

    /// Submits credentials to the backend and returns the raw login body.
    pub async fn login(&self, email: &str, password: &str) -> Result<Value, RemoteError> {
        let request = self
            .client
            .post(self.endpoint(&["auth", "login"])?)
            .json(&json!({ "email": email, "password": password }));
        Self::json_body(self.send(request).await?).await
    }
}
