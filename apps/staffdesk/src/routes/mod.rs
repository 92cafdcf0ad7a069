pub mod health;

use axum::{
    routing::{get, patch, post, put},
    Router,
};

use crate::data::handlers as data;
use crate::models::{Department, DocumentRecord, Employee, JobApplication};
use crate::session::handlers as session;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Session
        .route("/api/v1/auth/login", post(session::handle_login))
        .route("/api/v1/auth/logout", post(session::handle_logout))
        .route("/api/v1/auth/session", get(session::handle_current_session))
        .route("/api/v1/session/activity", post(session::handle_activity))
        .route("/api/v1/session/notice", get(session::handle_take_notice))
        // Employees
        .route(
            "/api/v1/employees",
            get(data::handle_list::<Employee>).post(data::handle_create::<Employee>),
        )
        .route(
            "/api/v1/employees/:id",
            put(data::handle_update::<Employee>).delete(data::handle_delete::<Employee>),
        )
        // Applications
        .route(
            "/api/v1/applications",
            get(data::handle_list::<JobApplication>).post(data::handle_create::<JobApplication>),
        )
        .route(
            "/api/v1/applications/:id",
            put(data::handle_update::<JobApplication>)
                .delete(data::handle_delete::<JobApplication>),
        )
        .route(
            "/api/v1/applications/:id/status",
            patch(data::handle_application_status),
        )
        // Departments
        .route(
            "/api/v1/departments",
            get(data::handle_list::<Department>).post(data::handle_create::<Department>),
        )
        .route(
            "/api/v1/departments/:id",
            put(data::handle_update::<Department>).delete(data::handle_delete::<Department>),
        )
        // Documents
        .route(
            "/api/v1/documents",
            get(data::handle_list::<DocumentRecord>).post(data::handle_upload_document),
        )
        .route(
            "/api/v1/documents/:id",
            axum::routing::delete(data::handle_delete::<DocumentRecord>),
        )
        .route("/api/v1/dashboard", get(data::handle_dashboard))
        .with_state(state)
}
