//! Maintenance flag storage (singleton row).

use sqlx::SqlitePool;

use crate::error::Result;
use crate::models::MaintenanceState;

const DEFAULT_ID: &str = "default";

/// True when maintenance mode is enabled. Missing row means disabled.
pub async fn is_active(pool: &SqlitePool) -> Result<bool> {
    let enabled: Option<bool> =
        sqlx::query_scalar("SELECT enabled FROM maintenance_state WHERE id = ?")
            .bind(DEFAULT_ID)
            .fetch_optional(pool)
            .await?;

    Ok(enabled.unwrap_or(false))
}

/// Read the current state, materializing the default row if absent.
pub async fn get_state(pool: &SqlitePool) -> Result<MaintenanceState> {
    sqlx::query(
        r#"
        INSERT INTO maintenance_state (id, enabled)
        VALUES (?, 0)
        ON CONFLICT(id) DO NOTHING
        "#,
    )
    .bind(DEFAULT_ID)
    .execute(pool)
    .await?;

    let state = sqlx::query_as::<_, MaintenanceState>(
        "SELECT enabled, updated_by, updated_at FROM maintenance_state WHERE id = ?",
    )
    .bind(DEFAULT_ID)
    .fetch_one(pool)
    .await?;

    Ok(state)
}

/// Set the flag, recording who flipped it.
pub async fn set_enabled(
    pool: &SqlitePool,
    enabled: bool,
    updated_by: Option<&str>,
) -> Result<MaintenanceState> {
    sqlx::query(
        r#"
        INSERT INTO maintenance_state (id, enabled, updated_by, updated_at)
        VALUES (?, ?, ?, datetime('now'))
        ON CONFLICT(id) DO UPDATE SET
            enabled = excluded.enabled,
            updated_by = excluded.updated_by,
            updated_at = datetime('now')
        "#,
    )
    .bind(DEFAULT_ID)
    .bind(enabled)
    .bind(updated_by)
    .execute(pool)
    .await?;

    get_state(pool).await
}
