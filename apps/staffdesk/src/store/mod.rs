//! Storage adapters behind the data facade.
//!
//! `local` persists whole collections as JSON files, `remote` talks to the REST
//! backend, `seed` materializes the local collections from a bundled snapshot
//! and `normalize` turns loosely-shaped raw records into canonical ones.

pub mod local;
pub mod normalize;
pub mod remote;
pub mod seed;

use std::fmt;

use serde::{de::DeserializeOwned, Serialize, Serializer};
use serde_json::Value;

use crate::models::{Department, DocumentRecord, Employee, JobApplication, RecordId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Employees,
    Applications,
    Departments,
    Documents,
}

impl Collection {
    pub const ALL: [Collection; 4] = [
        Collection::Employees,
        Collection::Applications,
        Collection::Departments,
        Collection::Documents,
    ];

    /// Key the collection is persisted under in durable storage.
    pub fn storage_key(&self) -> &'static str {
        match self {
            Collection::Employees => "erd_employees",
            Collection::Applications => "erd_applications",
            Collection::Departments => "erd_departments",
            Collection::Documents => "erd_documents",
        }
    }

    /// REST resource path. Documents have no backend endpoint.
    pub fn remote_path(&self) -> Option<&'static str> {
        match self {
            Collection::Employees => Some("employees"),
            Collection::Applications => Some("applicants"),
            Collection::Departments => Some("departments"),
            Collection::Documents => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Collection::Employees => "employees",
            Collection::Applications => "applications",
            Collection::Departments => "departments",
            Collection::Documents => "documents",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A record family that can be listed, saved and deleted through the facade.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const COLLECTION: Collection;

    fn id(&self) -> &RecordId;

    fn set_id(&mut self, id: RecordId);

    /// Builds a canonical record from a raw JSON value. `position` is the
    /// record's index in the list it came from, used when no id is present.
    fn normalize(raw: &Value, position: usize) -> Self;

    /// Body sent to the backend on create/update. The id travels in the URL.
    fn remote_payload(&self) -> Value {
        let mut body = serde_json::to_value(self).unwrap_or(Value::Null);
        if let Some(map) = body.as_object_mut() {
            map.remove("id");
        }
        body
    }
}

impl Entity for Employee {
    const COLLECTION: Collection = Collection::Employees;

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn normalize(raw: &Value, position: usize) -> Self {
        normalize::employee(raw, position)
    }

    fn remote_payload(&self) -> Value {
        let mut body = serde_json::to_value(self).unwrap_or(Value::Null);
        if let Some(map) = body.as_object_mut() {
            map.remove("id");
            map.insert("status".into(), Value::from(self.status.backend_str()));
        }
        body
    }
}

impl Entity for JobApplication {
    const COLLECTION: Collection = Collection::Applications;

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn normalize(raw: &Value, position: usize) -> Self {
        normalize::application(raw, position)
    }
}

impl Entity for Department {
    const COLLECTION: Collection = Collection::Departments;

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn normalize(raw: &Value, position: usize) -> Self {
        normalize::department(raw, position)
    }
}

impl Entity for DocumentRecord {
    const COLLECTION: Collection = Collection::Documents;

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn normalize(raw: &Value, position: usize) -> Self {
        normalize::document(raw, position)
    }
}

/// Where a listing was served from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Local,
    Remote(String),
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Local => f.write_str("local"),
            Source::Remote(base) => write!(f, "remote:{base}"),
        }
    }
}

impl Serialize for Source {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Result of a list call. Keeps "nothing there" apart from "could not load".
#[derive(Debug, Clone, PartialEq)]
pub enum Listing<T> {
    Loaded { records: Vec<T>, source: Source },
    Empty { source: Source },
    Unavailable { causes: Vec<String> },
}

impl<T> Listing<T> {
    pub fn from_records(records: Vec<T>, source: Source) -> Self {
        if records.is_empty() {
            Listing::Empty { source }
        } else {
            Listing::Loaded { records, source }
        }
    }

    /// The loaded records (possibly none) and where they came from, or the
    /// causes when no source could be read.
    pub fn into_parts(self) -> Result<(Vec<T>, Source), Vec<String>> {
        match self {
            Listing::Loaded { records, source } => Ok((records, source)),
            Listing::Empty { source } => Ok((Vec::new(), source)),
            Listing::Unavailable { causes } => Err(causes),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "id", rename_all = "snake_case")]
pub enum SaveOutcome {
    Inserted(RecordId),
    Updated(RecordId),
    /// An update whose id matched nothing. Nothing was written.
    Unmatched(RecordId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteOutcome {
    Deleted,
    Absent,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EmployeeStatus;
    use chrono::NaiveDate;

    #[test]
    fn test_employee_remote_payload_uses_backend_status_and_drops_id() {
        let employee = Employee {
            id: RecordId::from(3),
            name: "Diya Mehta".into(),
            role: "Tester".into(),
            department: "QA".into(),
            joining_date: NaiveDate::from_ymd_opt(2022, 3, 1).unwrap(),
            status: EmployeeStatus::OnLeave,
            email: "diya@example.com".into(),
        };
        let body = employee.remote_payload();
        assert!(body.get("id").is_none());
        assert_eq!(body["status"], "on-leave");
        assert_eq!(body["joiningDate"], "2022-03-01");
    }

    #[test]
    fn test_listing_distinguishes_empty_from_unavailable() {
        let empty: Listing<Department> = Listing::from_records(vec![], Source::Local);
        assert!(matches!(empty, Listing::Empty { .. }));
        assert_eq!(empty.into_parts(), Ok((vec![], Source::Local)));

        let failed: Listing<Department> = Listing::Unavailable {
            causes: vec!["connection refused".into()],
        };
        assert_eq!(failed.into_parts(), Err(vec!["connection refused".to_string()]));
    }

    #[test]
    fn test_source_serializes_as_label() {
        let remote = Source::Remote("http://hr.internal/api".into());
        assert_eq!(
            serde_json::to_value(&remote).unwrap(),
            serde_json::json!("remote:http://hr.internal/api")
        );
        assert_eq!(Source::Local.to_string(), "local");
    }
}
