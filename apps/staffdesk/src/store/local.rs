use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use serde::Serialize;
use serde_json::Value;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::RecordId;
use crate::store::{Collection, DeleteOutcome, Entity, SaveOutcome};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O error on '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: io::Error,
    },

    #[error("malformed JSON under '{key}': {source}")]
    Parse {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize '{key}': {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Durable key/value storage: one JSON file per key inside a data directory.
///
/// Every write replaces the whole value. Callers that read, modify and write
/// back a collection are not serialized against each other; two concurrent
/// writers to the same collection can lose one update.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|source| StoreError::Io {
            key: root.display().to_string(),
            source,
        })?;
        Ok(Self { root })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }

    /// Raw stored text, or `None` if the key was never written.
    pub fn read_raw(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }

    pub fn parse_value(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let Some(text) = self.read_raw(key)? else {
            return Ok(None);
        };
        if text.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|source| StoreError::Parse {
                key: key.to_string(),
                source,
            })
    }

    /// Stored value with unreadable or malformed content treated as absent.
    pub fn read_value(&self, key: &str) -> Option<Value> {
        match self.parse_value(key) {
            Ok(value) => value,
            Err(e) => {
                warn!("Ignoring stored value: {e}");
                None
            }
        }
    }

    /// Replaces the value under `key` atomically.
    pub fn write_value<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let io_err = |source: io::Error| StoreError::Io {
            key: key.to_string(),
            source,
        };
        let body = serde_json::to_vec(value).map_err(|source| StoreError::Serialize {
            key: key.to_string(),
            source,
        })?;

        let mut tmp = NamedTempFile::new_in(&self.root).map_err(io_err)?;
        tmp.write_all(&body).map_err(io_err)?;
        tmp.flush().map_err(io_err)?;
        tmp.persist(self.path_for(key))
            .map_err(|e| io_err(e.error))?;

        debug!("Wrote {} bytes under '{key}'", body.len());
        Ok(())
    }

    pub fn remove(&self, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }

    /// All records of a collection. Absent or malformed collections are empty.
    pub fn load<E: Entity>(&self) -> Vec<E> {
        let key = E::COLLECTION.storage_key();
        match self.read_value(key) {
            Some(Value::Array(items)) => items
                .iter()
                .enumerate()
                .map(|(position, raw)| E::normalize(raw, position))
                .collect(),
            Some(_) => {
                warn!("Stored value under '{key}' is not a list; treating as empty");
                Vec::new()
            }
            None => Vec::new(),
        }
    }

    pub fn store<E: Entity>(&self, records: &[E]) -> Result<(), StoreError> {
        self.write_value(E::COLLECTION.storage_key(), records)
    }

    pub fn has_records(&self, collection: Collection) -> bool {
        matches!(
            self.read_value(collection.storage_key()),
            Some(Value::Array(items)) if !items.is_empty()
        )
    }

    /// Appends `record` under a freshly generated id.
    pub fn insert<E: Entity>(&self, mut record: E) -> Result<RecordId, StoreError> {
        let mut records = self.load::<E>();
        let id = RecordId::generate();
        record.set_id(id.clone());
        records.push(record);
        self.store(&records)?;
        Ok(id)
    }

    /// Replaces the record with the same id. Returns false, writing nothing,
    /// when no record matches.
    pub fn update<E: Entity>(&self, record: E) -> Result<bool, StoreError> {
        let mut records = self.load::<E>();
        let Some(slot) = records.iter_mut().find(|r| r.id() == record.id()) else {
            return Ok(false);
        };
        *slot = record;
        self.store(&records)?;
        Ok(true)
    }

    /// Applies `change` to the record with the given id, if any.
    pub fn modify<E: Entity>(
        &self,
        id: &RecordId,
        change: impl FnOnce(&mut E),
    ) -> Result<bool, StoreError> {
        let mut records = self.load::<E>();
        let Some(slot) = records.iter_mut().find(|r| r.id() == id) else {
            return Ok(false);
        };
        change(slot);
        self.store(&records)?;
        Ok(true)
    }

    /// Records without a usable id are inserted; the rest update in place.
    pub fn save<E: Entity>(&self, record: E) -> Result<SaveOutcome, StoreError> {
        if !record.id().is_assigned() {
            return self.insert(record).map(SaveOutcome::Inserted);
        }
        let id = record.id().clone();
        if self.update(record)? {
            Ok(SaveOutcome::Updated(id))
        } else {
            debug!("No {} record with id {id}; save ignored", E::COLLECTION);
            Ok(SaveOutcome::Unmatched(id))
        }
    }

    /// Removes at most one record. Nothing is written when the id is absent.
    pub fn delete<E: Entity>(&self, id: &RecordId) -> Result<DeleteOutcome, StoreError> {
        let mut records = self.load::<E>();
        let Some(index) = records.iter().position(|r| r.id() == id) else {
            return Ok(DeleteOutcome::Absent);
        };
        records.remove(index);
        self.store(&records)?;
        Ok(DeleteOutcome::Deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        ApplicationRole, ApplicationStatus, Department, DocumentCategory, DocumentRecord,
        Employee, EmployeeStatus, FileRef, JobApplication,
    };
    use chrono::{NaiveDate, TimeZone, Utc};
    use std::collections::HashSet;
    use tempfile::TempDir;

    fn store() -> (LocalStore, TempDir) {
        let dir = TempDir::new().unwrap();
        (LocalStore::open(dir.path()).unwrap(), dir)
    }

    fn dept(id: u64, name: &str) -> Department {
        Department {
            id: RecordId::from(id),
            name: name.into(),
        }
    }

    fn new_dept(name: &str) -> Department {
        Department {
            id: RecordId::default(),
            name: name.into(),
        }
    }

    #[test]
    fn test_missing_key_reads_as_absent() {
        let (store, _dir) = store();
        assert_eq!(store.read_raw("erd_auth_user").unwrap(), None);
        assert!(store.load::<Department>().is_empty());
        assert!(!store.has_records(Collection::Departments));
    }

    #[test]
    fn test_malformed_json_reads_as_empty() {
        let (store, dir) = store();
        fs::write(dir.path().join("erd_departments.json"), "[{\"id\": 1,").unwrap();
        assert!(matches!(
            store.parse_value("erd_departments"),
            Err(StoreError::Parse { .. })
        ));
        assert!(store.read_value("erd_departments").is_none());
        assert!(store.load::<Department>().is_empty());
    }

    #[test]
    fn test_employee_round_trip() {
        let (store, _dir) = store();
        let employees = vec![
            Employee {
                id: RecordId::from(1),
                name: "Aarav Sharma".into(),
                role: "Backend Developer".into(),
                department: "Engineering".into(),
                joining_date: NaiveDate::from_ymd_opt(2021, 4, 12).unwrap(),
                status: EmployeeStatus::OnLeave,
                email: "aarav@example.com".into(),
            },
            Employee {
                id: RecordId::new("e-2"),
                name: "Myra Iyer".into(),
                role: "UI/UX Designer".into(),
                department: "Design".into(),
                joining_date: NaiveDate::from_ymd_opt(2019, 11, 30).unwrap(),
                status: EmployeeStatus::Inactive,
                email: "myra@example.com".into(),
            },
        ];
        store.store(&employees).unwrap();
        assert_eq!(store.load::<Employee>(), employees);
    }

    #[test]
    fn test_application_round_trip_covers_every_role_and_status() {
        let (store, _dir) = store();
        let roles = [
            ApplicationRole::FrontendDeveloper,
            ApplicationRole::BackendDeveloper,
            ApplicationRole::Tester,
            ApplicationRole::BusinessAnalyst,
        ];
        let statuses = [
            ApplicationStatus::New,
            ApplicationStatus::Shortlisted,
            ApplicationStatus::Rejected,
        ];
        let mut applications = Vec::new();
        for (i, role) in roles.iter().enumerate() {
            for (j, status) in statuses.iter().enumerate() {
                let n = i * statuses.len() + j;
                applications.push(JobApplication {
                    id: if n % 2 == 0 {
                        RecordId::from(n as u64 + 1)
                    } else {
                        RecordId::generate()
                    },
                    name: format!("Candidate {n}"),
                    role: *role,
                    experience_years: n as u32,
                    status: *status,
                    email: format!("candidate{n}@example.com"),
                    contact: format!("+91-90000000{n:02}"),
                    resume_url: if n % 3 == 0 {
                        String::new()
                    } else {
                        format!("https://cv.example/{n}.pdf")
                    },
                });
            }
        }
        store.store(&applications).unwrap();
        assert_eq!(store.load::<JobApplication>(), applications);
    }

    #[test]
    fn test_document_round_trip_keeps_file_refs_and_subsecond_times() {
        let (store, _dir) = store();
        let documents = vec![
            DocumentRecord {
                id: RecordId::from(1),
                employee_id: RecordId::from(4),
                employee_name: "Ananya Iyer".into(),
                category: DocumentCategory::OfferLetter,
                file_name: "offer.pdf".into(),
                file_url: FileRef::Url("https://files.example.com/offer.pdf".into()),
                uploaded_at: Utc.timestamp_opt(1_704_445_200, 123_456_789).unwrap(),
            },
            DocumentRecord {
                id: RecordId::generate(),
                employee_id: RecordId::new("emp-9"),
                employee_name: "Kabir Rao".into(),
                category: DocumentCategory::IdProof,
                file_name: "id.png".into(),
                file_url: FileRef::Embedded("data:image/png;base64,iVBORw0KGgo=".into()),
                uploaded_at: Utc.timestamp_opt(1_673_870_400, 500_000_000).unwrap(),
            },
            DocumentRecord {
                id: RecordId::from(3),
                employee_id: RecordId::from(1),
                employee_name: "Aarav Sharma".into(),
                category: DocumentCategory::Nda,
                file_name: "nda.pdf".into(),
                file_url: FileRef::Url("https://files.example.com/nda.pdf".into()),
                uploaded_at: Utc.timestamp_opt(1_611_000_000, 0).unwrap(),
            },
        ];
        store.store(&documents).unwrap();
        let loaded = store.load::<DocumentRecord>();
        assert_eq!(loaded, documents);
        assert!(loaded[1].file_url.is_embedded());
    }

    #[test]
    fn test_department_round_trip() {
        let (store, _dir) = store();
        let departments = vec![
            dept(1, "Engineering"),
            dept(12, "IT Infrastructure"),
            Department {
                id: RecordId::new("d-x"),
                name: "Research & Development".into(),
            },
        ];
        store.store(&departments).unwrap();
        assert_eq!(store.load::<Department>(), departments);
    }

    #[test]
    fn test_insert_assigns_unique_ids() {
        let (store, _dir) = store();
        store.store(&[dept(1, "HR"), dept(2, "QA")]).unwrap();

        for name in ["Sales", "Finance", "Data"] {
            let before = store.load::<Department>().len();
            let outcome = store.save(new_dept(name)).unwrap();
            assert!(matches!(outcome, SaveOutcome::Inserted(_)));
            assert_eq!(store.load::<Department>().len(), before + 1);
        }

        let ids: HashSet<_> = store.load::<Department>().into_iter().map(|d| d.id).collect();
        assert_eq!(ids.len(), 5);
    }

    #[test]
    fn test_insert_after_delete_does_not_reuse_ids() {
        let (store, _dir) = store();
        store.store(&[dept(1, "HR"), dept(2, "QA"), dept(3, "Ops")]).unwrap();
        store.delete::<Department>(&RecordId::from(2)).unwrap();
        let SaveOutcome::Inserted(id) = store.save(new_dept("Legal")).unwrap() else {
            panic!("expected insert");
        };
        assert_ne!(id, RecordId::from(3));
        assert_eq!(
            store.load::<Department>().iter().filter(|d| d.id == id).count(),
            1
        );
    }

    #[test]
    fn test_update_replaces_matching_record_only() {
        let (store, _dir) = store();
        store.store(&[dept(1, "HR"), dept(2, "QA")]).unwrap();

        let outcome = store.save(dept(2, "Quality")).unwrap();
        assert_eq!(outcome, SaveOutcome::Updated(RecordId::from(2)));
        let depts = store.load::<Department>();
        assert_eq!(depts.len(), 2);
        assert_eq!(depts[1], dept(2, "Quality"));
        assert_eq!(depts[0], dept(1, "HR"));
    }

    #[test]
    fn test_update_without_match_is_noop() {
        let (store, _dir) = store();
        store.store(&[dept(1, "HR")]).unwrap();
        let outcome = store.save(dept(9, "Ghost")).unwrap();
        assert_eq!(outcome, SaveOutcome::Unmatched(RecordId::from(9)));
        assert_eq!(store.load::<Department>(), vec![dept(1, "HR")]);
    }

    #[test]
    fn test_delete_is_idempotent() {
        let (store, _dir) = store();
        store.store(&[dept(1, "HR"), dept(2, "QA")]).unwrap();
        let id = RecordId::from(1);
        assert_eq!(store.delete::<Department>(&id).unwrap(), DeleteOutcome::Deleted);
        assert_eq!(store.delete::<Department>(&id).unwrap(), DeleteOutcome::Absent);
        assert_eq!(store.load::<Department>(), vec![dept(2, "QA")]);
    }

    #[test]
    fn test_modify_touches_single_record() {
        let (store, _dir) = store();
        store.store(&[dept(1, "HR"), dept(2, "QA")]).unwrap();
        let changed = store
            .modify::<Department>(&RecordId::from(1), |d| d.name = "People".into())
            .unwrap();
        assert!(changed);
        assert!(!store
            .modify::<Department>(&RecordId::from(7), |d| d.name = "x".into())
            .unwrap());
        assert_eq!(store.load::<Department>()[0].name, "People");
    }

    #[test]
    fn test_remove_missing_key_is_ok() {
        let (store, _dir) = store();
        store.write_value("erd_auth_user", &serde_json::json!({ "id": "1" })).unwrap();
        store.remove("erd_auth_user").unwrap();
        store.remove("erd_auth_user").unwrap();
        assert_eq!(store.read_raw("erd_auth_user").unwrap(), None);
    }
}
