use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::data::dashboard::{summarize, DashboardFilter, DashboardSummary};
use crate::errors::AppError;
use crate::models::{
    ApplicationStatus, Department, DocumentCategory, DocumentRecord, Employee, FileRef,
    JobApplication, RecordId, UserRole,
};
use crate::session::handlers::authorize;
use crate::state::AppState;
use crate::store::{Collection, Entity, Listing, SaveOutcome, Source};

const STAFF: &[UserRole] = &[UserRole::Hr, UserRole::SuperAdmin];
const ADMIN: &[UserRole] = &[UserRole::SuperAdmin];
const ANY: &[UserRole] = &[];

fn read_roles(collection: Collection) -> &'static [UserRole] {
    match collection {
        Collection::Employees => STAFF,
        _ => ANY,
    }
}

fn write_roles(collection: Collection) -> &'static [UserRole] {
    match collection {
        Collection::Employees => STAFF,
        Collection::Departments => ADMIN,
        _ => ANY,
    }
}

#[derive(Serialize)]
pub struct ListResponse<E> {
    pub data: Vec<E>,
    pub source: Source,
}

fn into_response<E>(listing: Listing<E>) -> Result<ListResponse<E>, AppError> {
    let (data, source) = listing.into_parts().map_err(AppError::Unavailable)?;
    Ok(ListResponse { data, source })
}

fn updated_or_missing(outcome: SaveOutcome) -> Result<Json<SaveOutcome>, AppError> {
    match outcome {
        SaveOutcome::Unmatched(id) => Err(AppError::NotFound(format!("no record with id {id}"))),
        outcome => Ok(Json(outcome)),
    }
}

fn object_body(raw: &Value) -> Result<(), AppError> {
    if raw.is_object() {
        Ok(())
    } else {
        Err(AppError::Validation("request body must be a JSON object".into()))
    }
}

/// GET /api/v1/{collection}
pub async fn handle_list<E: Entity>(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ListResponse<E>>, AppError> {
    authorize(&state, &headers, read_roles(E::COLLECTION))?;
    Ok(Json(into_response(state.data.list::<E>().await)?))
}

/// POST /api/v1/{collection}
/// The body is normalized like stored data; any id it carries is ignored.
pub async fn handle_create<E: Entity>(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(raw): Json<Value>,
) -> Result<(StatusCode, Json<SaveOutcome>), AppError> {
    authorize(&state, &headers, write_roles(E::COLLECTION))?;
    object_body(&raw)?;
    let mut record = E::normalize(&raw, 0);
    record.set_id(RecordId::default());
    let outcome = state.data.save(record).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// PUT /api/v1/{collection}/:id
pub async fn handle_update<E: Entity>(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(raw): Json<Value>,
) -> Result<Json<SaveOutcome>, AppError> {
    authorize(&state, &headers, write_roles(E::COLLECTION))?;
    object_body(&raw)?;
    let id = RecordId::new(id);
    if !id.is_assigned() {
        return Err(AppError::Validation(format!("invalid id '{id}'")));
    }
    let mut record = E::normalize(&raw, 0);
    record.set_id(id);
    updated_or_missing(state.data.save(record).await?)
}

/// DELETE /api/v1/{collection}/:id
/// Deleting an id that is not there is not an error.
pub async fn handle_delete<E: Entity>(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    authorize(&state, &headers, write_roles(E::COLLECTION))?;
    state.data.delete::<E>(&RecordId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct StatusChange {
    pub status: String,
}

/// PATCH /api/v1/applications/:id/status
pub async fn handle_application_status(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(change): Json<StatusChange>,
) -> Result<Json<SaveOutcome>, AppError> {
    authorize(&state, &headers, write_roles(Collection::Applications))?;
    let status = ApplicationStatus::parse_lenient(&change.status);
    let outcome = state
        .data
        .update_application_status(&RecordId::new(id), status)
        .await?;
    updated_or_missing(outcome)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDocument {
    pub employee_id: RecordId,
    pub employee_name: String,
    #[serde(default)]
    pub category: Option<String>,
    pub file_name: String,
    pub file_url: String,
    #[serde(default)]
    pub uploaded_at: Option<DateTime<Utc>>,
}

impl NewDocument {
    fn into_record(self) -> Result<DocumentRecord, AppError> {
        if !self.employee_id.is_assigned() {
            return Err(AppError::Validation("employeeId is required".into()));
        }
        if self.file_name.trim().is_empty() {
            return Err(AppError::Validation("fileName is required".into()));
        }
        if self.file_url.trim().is_empty() {
            return Err(AppError::Validation("fileUrl is required".into()));
        }
        Ok(DocumentRecord {
            id: RecordId::default(),
            employee_id: self.employee_id,
            employee_name: self.employee_name.trim().to_string(),
            category: self
                .category
                .as_deref()
                .map(DocumentCategory::parse_lenient)
                .unwrap_or_default(),
            file_name: self.file_name.trim().to_string(),
            file_url: FileRef::from(self.file_url),
            uploaded_at: self.uploaded_at.unwrap_or_else(Utc::now),
        })
    }
}

/// POST /api/v1/documents
pub async fn handle_upload_document(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<NewDocument>,
) -> Result<(StatusCode, Json<SaveOutcome>), AppError> {
    authorize(&state, &headers, write_roles(Collection::Documents))?;
    let record = req.into_record()?;
    let outcome = state.data.save(record).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// GET /api/v1/dashboard?department=&role=
pub async fn handle_dashboard(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(filter): Query<DashboardFilter>,
) -> Result<Json<DashboardSummary>, AppError> {
    authorize(&state, &headers, ANY)?;
    let (employees, applications, departments) = tokio::join!(
        state.data.list::<Employee>(),
        state.data.list::<JobApplication>(),
        state.data.list::<Department>()
    );
    let employees = into_response(employees)?.data;
    let applications = into_response(applications)?.data;
    let departments = into_response(departments)?.data;
    Ok(Json(summarize(&employees, &applications, &departments, &filter)))
}
