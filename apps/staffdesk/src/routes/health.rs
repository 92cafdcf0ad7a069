use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Returns service status, version and where each collection is served from.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let routing = state.data.routing();
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": env!("CARGO_PKG_NAME"),
        "dataMode": state.config.data_mode.as_str(),
        "routing": {
            "employees": routing.employees.as_str(),
            "applications": routing.applications.as_str(),
            "departments": routing.departments.as_str(),
            "documents": routing.documents.as_str(),
        }
    }))
}
