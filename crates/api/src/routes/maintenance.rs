//! Maintenance flag endpoints.

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use database::models::MaintenanceState;
use database::{audit_log, maintenance};

use crate::auth::AdminUser;
use crate::error::Result;
use crate::state::AppState;

/// `GET /maintenance` — public so the front end can poll the flag.
pub async fn get_state(State(state): State<AppState>) -> Result<Json<MaintenanceState>> {
    let current = maintenance::get_state(state.db.pool()).await?;
    Ok(Json(current))
}

#[derive(Debug, Deserialize)]
pub struct SetMaintenanceRequest {
    pub enabled: bool,
}

/// `PUT /maintenance` — admin, audited.
pub async fn set_state(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(body): Json<SetMaintenanceRequest>,
) -> Result<Json<MaintenanceState>> {
    let pool = state.db.pool();
    let updated = maintenance::set_enabled(pool, body.enabled, Some(&admin.id)).await?;
    audit_log::record(
        pool,
        &admin.id,
        "MAINTENANCE_UPDATED",
        "MAINTENANCE",
        "maintenance",
        json!({ "enabled": body.enabled }),
    )
    .await?;

    Ok(Json(updated))
}
