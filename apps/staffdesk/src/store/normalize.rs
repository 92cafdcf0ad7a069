//! Raw JSON -> canonical records.
//!
//! Seed files, older local collections and the REST backend all disagree on
//! field names (`joiningDate` vs `joining_date`), id types and enum spellings.
//! Every record crossing a storage boundary goes through here. Missing or
//! unusable fields take fixed defaults: empty string, zero, "Active", today.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;

use crate::models::{
    ApplicationRole, ApplicationStatus, Department, DocumentCategory, DocumentRecord, Employee,
    EmployeeStatus, FileRef, JobApplication, RecordId,
};

/// First present field among `keys`.
fn field<'a>(raw: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| raw.get(*k))
        .find(|v| !v.is_null())
}

fn text(raw: &Value, keys: &[&str]) -> String {
    match field(raw, keys) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn id_or_position(raw: &Value, keys: &[&str], position: usize) -> RecordId {
    keys.iter()
        .filter_map(|k| raw.get(*k))
        .find_map(RecordId::from_json)
        .unwrap_or_else(|| RecordId::from(position as u64 + 1))
}

/// Non-negative whole number. Negative and non-numeric inputs become zero;
/// fractions are truncated.
fn whole_number(raw: &Value, keys: &[&str]) -> u32 {
    let number = match field(raw, keys) {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match number {
        Some(n) if n.is_finite() && n > 0.0 => n.min(u32::MAX as f64) as u32,
        _ => 0,
    }
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.with_timezone(&Utc).date_naive())
        })
        .or_else(|| value.get(..10).and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()))
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

pub fn employee(raw: &Value, position: usize) -> Employee {
    let joining_date = parse_date(&text(raw, &["joiningDate", "joining_date"]))
        .unwrap_or_else(|| Utc::now().date_naive());
    let status = match field(raw, &["status"]) {
        Some(Value::String(s)) => EmployeeStatus::parse_lenient(s),
        _ => EmployeeStatus::Active,
    };

    Employee {
        id: id_or_position(raw, &["_id", "id"], position),
        name: text(raw, &["name"]),
        role: text(raw, &["role"]),
        department: text(raw, &["department"]),
        joining_date,
        status,
        email: text(raw, &["email"]),
    }
}

pub fn application(raw: &Value, position: usize) -> JobApplication {
    JobApplication {
        id: id_or_position(raw, &["id", "_id"], position),
        name: text(raw, &["name"]),
        role: ApplicationRole::classify(&text(raw, &["role", "appliedRole"])),
        experience_years: whole_number(raw, &["experienceYears", "experience_years"]),
        status: ApplicationStatus::parse_lenient(&text(raw, &["status"])),
        email: text(raw, &["email"]),
        contact: text(raw, &["contact"]),
        resume_url: text(raw, &["resumeUrl", "resume_url"]),
    }
}

pub fn department(raw: &Value, position: usize) -> Department {
    Department {
        id: id_or_position(raw, &["id", "_id"], position),
        name: text(raw, &["name"]),
    }
}

pub fn document(raw: &Value, position: usize) -> DocumentRecord {
    let employee_id = field(raw, &["employeeId", "employee_id"])
        .and_then(RecordId::from_json)
        .unwrap_or_default();
    let uploaded_at = parse_timestamp(&text(raw, &["uploadedAt", "uploaded_at"]))
        .unwrap_or_else(Utc::now);

    DocumentRecord {
        id: id_or_position(raw, &["id", "_id"], position),
        employee_id,
        employee_name: text(raw, &["employeeName", "employee_name"]),
        category: DocumentCategory::parse_lenient(&text(raw, &["category"])),
        file_name: text(raw, &["fileName", "file_name"]),
        file_url: FileRef::from(text(raw, &["fileUrl", "file_url"])),
        uploaded_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_qa_tester_maps_to_tester() {
        let app = application(&json!({ "id": 4, "name": "Ira Jain", "role": "QA Tester" }), 0);
        assert_eq!(app.role, ApplicationRole::Tester);
        assert_eq!(app.id, RecordId::from(4));
    }

    #[test]
    fn test_application_accepts_snake_case_and_clamps_experience() {
        let app = application(
            &json!({
                "_id": "a-9",
                "appliedRole": "backend engineer",
                "experience_years": -3,
                "status": "REJECTED",
                "resume_url": "https://cv.example/a-9.pdf"
            }),
            0,
        );
        assert_eq!(app.id, RecordId::new("a-9"));
        assert_eq!(app.role, ApplicationRole::BackendDeveloper);
        assert_eq!(app.experience_years, 0);
        assert_eq!(app.status, ApplicationStatus::Rejected);
        assert_eq!(app.resume_url, "https://cv.example/a-9.pdf");
        assert_eq!(app.contact, "");

        let fractional = application(&json!({ "experienceYears": 4.7 }), 0);
        assert_eq!(fractional.experience_years, 4);
    }

    #[test]
    fn test_employee_defaults_and_status_mapping() {
        let emp = employee(&json!({ "_id": "abc", "status": "on-leave" }), 2);
        assert_eq!(emp.id, RecordId::new("abc"));
        assert_eq!(emp.status, EmployeeStatus::OnLeave);
        assert_eq!(emp.name, "");
        assert_eq!(emp.joining_date, Utc::now().date_naive());

        let unknown = employee(&json!({ "status": "probation" }), 2);
        assert_eq!(unknown.status, EmployeeStatus::Active);
        assert_eq!(unknown.id, RecordId::from(3));
    }

    #[test]
    fn test_employee_prefers_mongo_style_id() {
        let emp = employee(&json!({ "_id": "m1", "id": 7 }), 0);
        assert_eq!(emp.id, RecordId::new("m1"));
    }

    #[test]
    fn test_employee_joining_date_formats() {
        let plain = employee(&json!({ "joiningDate": "2021-07-15" }), 0);
        assert_eq!(plain.joining_date, NaiveDate::from_ymd_opt(2021, 7, 15).unwrap());

        let stamped = employee(&json!({ "joining_date": "2020-01-02T10:00:00.000Z" }), 0);
        assert_eq!(stamped.joining_date, NaiveDate::from_ymd_opt(2020, 1, 2).unwrap());
    }

    #[test]
    fn test_document_file_reference_and_category() {
        let doc = document(
            &json!({
                "id": 12,
                "employeeId": 5,
                "employeeName": "Arjun Rao",
                "category": "Payslip",
                "fileName": "payslip.pdf",
                "fileUrl": "data:application/pdf;base64,AAAA",
                "uploadedAt": "2024-02-01T08:30:00Z"
            }),
            0,
        );
        assert_eq!(doc.employee_id, RecordId::from(5));
        assert_eq!(doc.category, DocumentCategory::Payslip);
        assert!(doc.file_url.is_embedded());
        assert_eq!(doc.uploaded_at.to_rfc3339(), "2024-02-01T08:30:00+00:00");
    }

    #[test]
    fn test_canonical_records_normalize_to_themselves() {
        let emp = employee(
            &json!({
                "id": "17", "name": "Sara Khan", "role": "Product Manager",
                "department": "Product", "joiningDate": "2023-05-09",
                "status": "On Leave", "email": "sara@example.com"
            }),
            0,
        );
        let again = employee(&serde_json::to_value(&emp).unwrap(), 99);
        assert_eq!(emp, again);

        let app = application(
            &json!({
                "id": "3", "name": "Riya Dutta", "role": "Business Analyst",
                "experienceYears": 6, "status": "Shortlisted",
                "email": "riya@example.com", "contact": "+91-5550101",
                "resumeUrl": "https://example.com/resume/riya.pdf"
            }),
            0,
        );
        let again = application(&serde_json::to_value(&app).unwrap(), 99);
        assert_eq!(app, again);
    }
}
