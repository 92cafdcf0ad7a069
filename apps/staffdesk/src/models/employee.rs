use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::id::RecordId;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum EmployeeStatus {
    #[default]
    Active,
    Inactive,
    #[serde(rename = "On Leave")]
    OnLeave,
}

impl EmployeeStatus {
    /// Maps free-text status values onto the three known states.
    /// Anything unrecognised is treated as active.
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "on-leave" | "on leave" | "on_leave" | "onleave" => EmployeeStatus::OnLeave,
            "inactive" => EmployeeStatus::Inactive,
            _ => EmployeeStatus::Active,
        }
    }

    /// Status spelling expected by the REST backend.
    pub fn backend_str(&self) -> &'static str {
        match self {
            EmployeeStatus::Active => "active",
            EmployeeStatus::Inactive => "inactive",
            EmployeeStatus::OnLeave => "on-leave",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    #[serde(default)]
    pub id: RecordId,
    pub name: String,
    pub role: String,
    pub department: String,
    pub joining_date: NaiveDate,
    pub status: EmployeeStatus,
    pub email: String,
}
