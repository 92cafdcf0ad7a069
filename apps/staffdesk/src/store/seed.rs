//! One-time population of the local collections from a bundled snapshot.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::models::{Department, DocumentRecord, Employee, JobApplication};
use crate::store::local::{LocalStore, StoreError};
use crate::store::{Collection, Entity};

/// Where to look for the snapshot, in the order tried when nothing is
/// configured: relative to the working directory, absolute, filesystem root.
pub const DEFAULT_SEED_SOURCES: &[&str] = &["assets/db.json", "/assets/db.json", "/db.json"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedSource {
    File(PathBuf),
    Url(String),
}

impl SeedSource {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.starts_with("http://") || raw.starts_with("https://") {
            SeedSource::Url(raw.to_string())
        } else {
            SeedSource::File(PathBuf::from(raw))
        }
    }

    pub fn defaults() -> Vec<SeedSource> {
        DEFAULT_SEED_SOURCES.iter().map(|s| SeedSource::parse(s)).collect()
    }
}

impl fmt::Display for SeedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeedSource::File(path) => write!(f, "{}", path.display()),
            SeedSource::Url(url) => f.write_str(url),
        }
    }
}

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },

    #[error("snapshot is not valid: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The snapshot document. Missing arrays read as empty.
#[derive(Debug, Default, Deserialize)]
pub struct SeedSnapshot {
    #[serde(default)]
    pub employees: Vec<Value>,
    #[serde(default)]
    pub applications: Vec<Value>,
    #[serde(default)]
    pub departments: Vec<Value>,
    #[serde(default)]
    pub documents: Vec<Value>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeedCounts {
    pub employees: usize,
    pub applications: usize,
    pub departments: usize,
    pub documents: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SeedOutcome {
    /// Seeding already ran (or was skipped) earlier in this process.
    AlreadySeeded,
    /// All four collections already held records.
    AlreadyPresent,
    /// `counts` holds the records written; collections that already had
    /// records count zero.
    Seeded { source: String, counts: SeedCounts },
    /// Every candidate failed; one cause per candidate.
    Unavailable { causes: Vec<String> },
}

async fn fetch_snapshot(
    source: &SeedSource,
    client: &reqwest::Client,
) -> Result<SeedSnapshot, SeedError> {
    let text = match source {
        SeedSource::File(path) => {
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| SeedError::Io {
                    path: path.display().to_string(),
                    source,
                })?
        }
        SeedSource::Url(url) => {
            let response = client.get(url).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(SeedError::Status {
                    url: url.clone(),
                    status: status.as_u16(),
                });
            }
            response.text().await?
        }
    };
    Ok(serde_json::from_str(&text)?)
}

fn normalized<E: Entity>(raw: &[Value]) -> Vec<E> {
    raw.iter()
        .enumerate()
        .map(|(position, value)| E::normalize(value, position))
        .collect()
}

/// Writes one collection from the snapshot unless it already holds records.
/// Returns the number of records written.
fn fill<E: Entity>(store: &LocalStore, raw: &[Value]) -> Result<usize, StoreError> {
    if store.has_records(E::COLLECTION) {
        debug!("Keeping existing {}; snapshot not applied", E::COLLECTION);
        return Ok(0);
    }
    let records = normalized::<E>(raw);
    store.store(&records)?;
    Ok(records.len())
}

/// Fills every empty collection from the snapshot. Stored records are never
/// replaced, so writes made before a late seed survive it.
fn materialize(store: &LocalStore, snapshot: &SeedSnapshot) -> Result<SeedCounts, StoreError> {
    Ok(SeedCounts {
        employees: fill::<Employee>(store, &snapshot.employees)?,
        applications: fill::<JobApplication>(store, &snapshot.applications)?,
        departments: fill::<Department>(store, &snapshot.departments)?,
        documents: fill::<DocumentRecord>(store, &snapshot.documents)?,
    })
}

/// Owns the in-memory "seeded" flag for one process.
pub struct Seeder {
    store: LocalStore,
    sources: Vec<SeedSource>,
    client: reqwest::Client,
    seeded: Mutex<bool>,
}

impl Seeder {
    pub fn new(store: LocalStore, sources: Vec<SeedSource>, client: reqwest::Client) -> Self {
        Self {
            store,
            sources,
            client,
            seeded: Mutex::new(false),
        }
    }

    /// Seeds the local collections unless that already happened. Concurrent
    /// callers wait for the first one rather than fetching twice.
    pub async fn ensure_seeded(&self) -> SeedOutcome {
        let mut seeded = self.seeded.lock().await;
        if *seeded {
            return SeedOutcome::AlreadySeeded;
        }

        if Collection::ALL.iter().all(|c| self.store.has_records(*c)) {
            *seeded = true;
            return SeedOutcome::AlreadyPresent;
        }

        let mut causes = Vec::with_capacity(self.sources.len());
        for source in &self.sources {
            let result = match fetch_snapshot(source, &self.client).await {
                Ok(snapshot) => materialize(&self.store, &snapshot).map_err(SeedError::from),
                Err(e) => Err(e),
            };
            match result {
                Ok(counts) => {
                    info!(
                        "Seeded local store from {source}: {} employees, {} applications, {} departments, {} documents",
                        counts.employees, counts.applications, counts.departments, counts.documents
                    );
                    *seeded = true;
                    return SeedOutcome::Seeded {
                        source: source.to_string(),
                        counts,
                    };
                }
                Err(e) => {
                    warn!("Seed source {source} unavailable: {e}");
                    causes.push(format!("{source}: {e}"));
                }
            }
        }

        SeedOutcome::Unavailable { causes }
    }
}
