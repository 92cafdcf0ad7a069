//! Data access facade.
//!
//! Single entry point for the four record families. Each family is routed to
//! either the local store or the REST backend; remote-routed lists fall back
//! to the secondary backend and then to the local collection.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use crate::config::DataMode;
use crate::models::{ApplicationStatus, JobApplication, RecordId};
use crate::store::local::{LocalStore, StoreError};
use crate::store::remote::{RemoteError, RemoteStore};
use crate::store::seed::{SeedOutcome, Seeder};
use crate::store::{Collection, DeleteOutcome, Entity, Listing, SaveOutcome, Source};

#[derive(Debug, Error)]
pub enum DataError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("no backend configured for {0}")]
    NoBackend(Collection),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Local,
    Remote,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Local => "local",
            Backend::Remote => "remote",
        }
    }
}

/// Which adapter serves each collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Routing {
    pub employees: Backend,
    pub applications: Backend,
    pub departments: Backend,
    pub documents: Backend,
}

impl Routing {
    pub fn for_mode(mode: DataMode) -> Self {
        let shared = match mode {
            DataMode::Local => Backend::Local,
            DataMode::Remote => Backend::Remote,
        };
        Self {
            employees: shared,
            applications: shared,
            departments: shared,
            // The backend keeps no documents.
            documents: Backend::Local,
        }
    }

    pub fn backend(&self, collection: Collection) -> Backend {
        match collection {
            Collection::Employees => self.employees,
            Collection::Applications => self.applications,
            Collection::Departments => self.departments,
            Collection::Documents => self.documents,
        }
    }
}

struct Inner {
    local: LocalStore,
    /// Primary first, then the secondary backend if configured.
    remotes: Vec<RemoteStore>,
    routing: Routing,
    seeder: Seeder,
}

#[derive(Clone)]
pub struct DataFacade {
    inner: Arc<Inner>,
}

impl DataFacade {
    pub fn new(
        local: LocalStore,
        remotes: Vec<RemoteStore>,
        routing: Routing,
        seeder: Seeder,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                local,
                remotes,
                routing,
                seeder,
            }),
        }
    }

    pub fn routing(&self) -> Routing {
        self.inner.routing
    }

    /// Runs the one-time seed step if it has not run yet.
    pub async fn seed(&self) -> SeedOutcome {
        self.inner.seeder.ensure_seeded().await
    }

    /// Seeds ahead of a local write. If no snapshot can be read the write
    /// still goes ahead; a later seed only fills collections that are empty.
    async fn seed_before_write(&self, collection: Collection) {
        if let SeedOutcome::Unavailable { causes } = self.inner.seeder.ensure_seeded().await {
            warn!(
                "Writing {collection} to an unseeded local store: {}",
                causes.join("; ")
            );
        }
    }

    fn primary_remote<E: Entity>(&self) -> Result<&RemoteStore, DataError> {
        self.inner
            .remotes
            .first()
            .ok_or(DataError::NoBackend(E::COLLECTION))
    }

    pub async fn list<E: Entity>(&self) -> Listing<E> {
        let mut causes = Vec::new();

        if self.inner.routing.backend(E::COLLECTION) == Backend::Remote {
            for remote in &self.inner.remotes {
                match remote.list::<E>().await {
                    Ok(records) => {
                        return Listing::from_records(
                            records,
                            Source::Remote(remote.base_url().to_string()),
                        )
                    }
                    Err(e) => {
                        warn!(
                            "Listing {} from {} failed: {e}",
                            E::COLLECTION,
                            remote.base_url()
                        );
                        causes.push(format!("{}: {e}", remote.base_url()));
                    }
                }
            }
            debug!("Falling back to local {}", E::COLLECTION);
        }

        self.list_local(causes).await
    }

    async fn list_local<E: Entity>(&self, mut causes: Vec<String>) -> Listing<E> {
        let seed = self.inner.seeder.ensure_seeded().await;
        let records = self.inner.local.load::<E>();

        match seed {
            SeedOutcome::Unavailable { causes: seed_causes } if records.is_empty() => {
                causes.extend(seed_causes);
                Listing::Unavailable { causes }
            }
            _ => Listing::from_records(records, Source::Local),
        }
    }

    /// Inserts records without a usable id, updates the rest in place.
    pub async fn save<E: Entity>(&self, record: E) -> Result<SaveOutcome, DataError> {
        let outcome = match self.inner.routing.backend(E::COLLECTION) {
            Backend::Remote => self.primary_remote::<E>()?.save(&record).await?,
            Backend::Local => {
                self.seed_before_write(E::COLLECTION).await;
                self.inner.local.save(record)?
            }
        };
        debug!("Saved {}: {outcome:?}", E::COLLECTION);
        Ok(outcome)
    }

    /// Removes the record with `id`, if present. Related records are kept.
    pub async fn delete<E: Entity>(&self, id: &RecordId) -> Result<DeleteOutcome, DataError> {
        let outcome = match self.inner.routing.backend(E::COLLECTION) {
            Backend::Remote => self.primary_remote::<E>()?.delete::<E>(id).await?,
            Backend::Local => {
                self.seed_before_write(E::COLLECTION).await;
                self.inner.local.delete::<E>(id)?
            }
        };
        debug!("Deleted {} {id}: {outcome:?}", E::COLLECTION);
        Ok(outcome)
    }

    pub async fn update_application_status(
        &self,
        id: &RecordId,
        status: ApplicationStatus,
    ) -> Result<SaveOutcome, DataError> {
        match self.inner.routing.backend(Collection::Applications) {
            Backend::Remote => Ok(self
                .primary_remote::<JobApplication>()?
                .update_application_status(id, status)
                .await?),
            Backend::Local => {
                self.seed_before_write(Collection::Applications).await;
                let changed = self
                    .inner
                    .local
                    .modify::<JobApplication>(id, |app| app.status = status)?;
                Ok(if changed {
                    SaveOutcome::Updated(id.clone())
                } else {
                    SaveOutcome::Unmatched(id.clone())
                })
            }
        }
    }
}
