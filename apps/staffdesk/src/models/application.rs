use serde::{Deserialize, Serialize};

use crate::models::id::RecordId;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ApplicationRole {
    #[serde(rename = "Frontend Developer")]
    FrontendDeveloper,
    #[serde(rename = "Backend Developer")]
    BackendDeveloper,
    Tester,
    #[serde(rename = "Business Analyst")]
    BusinessAnalyst,
}

impl ApplicationRole {
    /// Free-text role titles are bucketed by substring. Titles that match none
    /// of the engineering buckets fall into Business Analyst.
    pub fn classify(raw: &str) -> Self {
        let lower = raw.to_lowercase();
        if lower.contains("front") {
            ApplicationRole::FrontendDeveloper
        } else if lower.contains("back") {
            ApplicationRole::BackendDeveloper
        } else if lower.contains("test") || lower.contains("qa") {
            ApplicationRole::Tester
        } else {
            ApplicationRole::BusinessAnalyst
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ApplicationRole::FrontendDeveloper => "Frontend Developer",
            ApplicationRole::BackendDeveloper => "Backend Developer",
            ApplicationRole::Tester => "Tester",
            ApplicationRole::BusinessAnalyst => "Business Analyst",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum ApplicationStatus {
    #[default]
    New,
    Shortlisted,
    Rejected,
}

impl ApplicationStatus {
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "shortlisted" => ApplicationStatus::Shortlisted,
            "rejected" => ApplicationStatus::Rejected,
            _ => ApplicationStatus::New,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JobApplication {
    #[serde(default)]
    pub id: RecordId,
    pub name: String,
    pub role: ApplicationRole,
    pub experience_years: u32,
    pub status: ApplicationStatus,
    pub email: String,
    pub contact: String,
    pub resume_url: String,
}
