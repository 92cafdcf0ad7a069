use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::id::RecordId;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum DocumentCategory {
    Resume,
    #[serde(rename = "Offer Letter")]
    OfferLetter,
    #[serde(rename = "ID Proof")]
    IdProof,
    Payslip,
    #[serde(rename = "NDA")]
    Nda,
    #[default]
    Other,
}

impl DocumentCategory {
    pub const ALL: [DocumentCategory; 6] = [
        DocumentCategory::Resume,
        DocumentCategory::OfferLetter,
        DocumentCategory::IdProof,
        DocumentCategory::Payslip,
        DocumentCategory::Nda,
        DocumentCategory::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            DocumentCategory::Resume => "Resume",
            DocumentCategory::OfferLetter => "Offer Letter",
            DocumentCategory::IdProof => "ID Proof",
            DocumentCategory::Payslip => "Payslip",
            DocumentCategory::Nda => "NDA",
            DocumentCategory::Other => "Other",
        }
    }

    pub fn parse_lenient(raw: &str) -> Self {
        let raw = raw.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(raw))
            .unwrap_or_default()
    }
}

/// Where a document's bytes live: a remote link or an inline `data:` URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FileRef {
    Url(String),
    Embedded(String),
}

impl FileRef {
    pub fn as_str(&self) -> &str {
        match self {
            FileRef::Url(s) | FileRef::Embedded(s) => s,
        }
    }

    pub fn is_embedded(&self) -> bool {
        matches!(self, FileRef::Embedded(_))
    }
}

impl From<String> for FileRef {
    fn from(value: String) -> Self {
        if value.starts_with("data:") {
            FileRef::Embedded(value)
        } else {
            FileRef::Url(value)
        }
    }
}

impl From<FileRef> for String {
    fn from(value: FileRef) -> Self {
        match value {
            FileRef::Url(s) | FileRef::Embedded(s) => s,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRecord {
    #[serde(default)]
    pub id: RecordId,
    pub employee_id: RecordId,
    /// Copied at upload time; not refreshed when the employee is renamed.
    pub employee_name: String,
    pub category: DocumentCategory,
    pub file_name: String,
    pub file_url: FileRef,
    pub uploaded_at: DateTime<Utc>,
}
