//! Append-only admin audit trail.
//!
//! Entries are written as a side effect of every admin-mutating operation and
//! are never updated or deleted. The trail is a forensic record, not a source
//! of truth for current state.

use sqlx::types::Json;
use sqlx::SqlitePool;

use serde_json::Value;

use crate::error::Result;
use crate::models::AuditLogEntry;

/// Target ID recorded for bulk operations.
pub const BULK_TARGET: &str = "bulk";

/// Append one audit entry.
pub async fn record(
    pool: &SqlitePool,
    actor_user_id: &str,
    action: &str,
    target_type: &str,
    target_id: &str,
    payload: Value,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO admin_audit_logs (actor_user_id, action, target_type, target_id, payload)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(actor_user_id)
    .bind(action)
    .bind(target_type)
    .bind(target_id)
    .bind(Json(payload))
    .execute(pool)
    .await?;

    Ok(())
}

/// List entries newest first, with the actor's email joined in for display.
///
/// Returns the total entry count (ignoring pagination) and the requested
/// page.
pub async fn list(
    pool: &SqlitePool,
    page: i64,
    page_size: i64,
) -> Result<(i64, Vec<AuditLogEntry>)> {
    let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM admin_audit_logs")
        .fetch_one(pool)
        .await?;

    let entries = sqlx::query_as::<_, AuditLogEntry>(
        r#"
        SELECT a.id, a.actor_user_id, u.email AS actor_email, a.action,
               a.target_type, a.target_id, a.payload, a.created_at
        FROM admin_audit_logs a
        LEFT JOIN users u ON u.id = a.actor_user_id
        ORDER BY a.created_at DESC, a.id DESC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(page_size)
    .bind((page - 1) * page_size)
    .fetch_all(pool)
    .await?;

    Ok((total, entries))
}

/// Total number of entries.
pub async fn count(pool: &SqlitePool) -> Result<i64> {
    let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM admin_audit_logs")
        .fetch_one(pool)
        .await?;

    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{insert_user, test_db};
    use care_core::Role;
    use serde_json::json;

    #[tokio::test]
    async fn entries_list_newest_first_with_actor_email() {
        let db = test_db().await;
        insert_user(&db, "admin", "admin@example.com", Role::Admin).await;

        for i in 0..3 {
            record(
                db.pool(),
                "admin",
                "RESOURCE_MODERATED",
                "RESOURCE_PROFILE",
                &format!("rp-{i}"),
                json!({"publishStatus": "PUBLISHED"}),
            )
            .await
            .unwrap();
        }

        let (total, entries) = list(db.pool(), 1, 2).await.unwrap();
        assert_eq!(total, 3);
        assert_eq!(entries.len(), 2);
        // Same-second inserts fall back to the id tie-break.
        assert_eq!(entries[0].target_id, "rp-2");
        assert_eq!(entries[0].actor_email.as_deref(), Some("admin@example.com"));
        assert_eq!(
            entries[0].payload.0,
            json!({"publishStatus": "PUBLISHED"})
        );
    }

    #[tokio::test]
    async fn unknown_actor_still_lists() {
        let db = test_db().await;
        record(
            db.pool(),
            "gone",
            "USER_STATUS_UPDATED",
            "USER",
            "u1",
            json!({}),
        )
        .await
        .unwrap();

        let (total, entries) = list(db.pool(), 1, 10).await.unwrap();
        assert_eq!(total, 1);
        assert!(entries[0].actor_email.is_none());
    }

    #[tokio::test]
    async fn count_tracks_appends() {
        let db = test_db().await;
        assert_eq!(count(db.pool()).await.unwrap(), 0);
        record(db.pool(), "a", "X", "Y", BULK_TARGET, json!({"ids": ["1"]}))
            .await
            .unwrap();
        assert_eq!(count(db.pool()).await.unwrap(), 1);
    }
}
