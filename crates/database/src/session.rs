//! Bearer session tokens and password reset tokens.
//!
//! Tokens are opaque random strings stored server-side; validity is an
//! expiry check at lookup time. Password reset keeps at most one live token
//! per user, swapped atomically so a concurrent reader never sees two.

use sqlx::SqlitePool;

use crate::error::Result;
use crate::models::{User, UserRow};

fn ttl_modifier(ttl_seconds: i64) -> String {
    format!("{ttl_seconds} seconds")
}

/// Insert a session token valid for `ttl_seconds`.
pub async fn create_session(
    pool: &SqlitePool,
    token: &str,
    user_id: &str,
    ttl_seconds: i64,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO sessions (token, user_id, expires_at)
        VALUES (?, ?, datetime('now', ?))
        "#,
    )
    .bind(token)
    .bind(user_id)
    .bind(ttl_modifier(ttl_seconds))
    .execute(pool)
    .await?;

    Ok(())
}

/// Resolve an unexpired session token to its account.
pub async fn find_user_by_token(pool: &SqlitePool, token: &str) -> Result<Option<User>> {
    let row = sqlx::query_as::<_, UserRow>(
        r#"
        SELECT u.id, u.email, u.password_hash, u.role, u.status, u.created_at, u.updated_at
        FROM sessions s
        JOIN users u ON u.id = s.user_id
        WHERE s.token = ? AND s.expires_at > datetime('now')
        "#,
    )
    .bind(token)
    .fetch_optional(pool)
    .await?;

    row.map(User::try_from).transpose()
}

/// Delete a session token. Returns false when the token was unknown.
pub async fn delete_session(pool: &SqlitePool, token: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM sessions WHERE token = ?")
        .bind(token)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Delete every session belonging to a user. Used when a password changes.
pub async fn delete_sessions_for_user(pool: &SqlitePool, user_id: &str) -> Result<u64> {
    let result = sqlx::query("DELETE FROM sessions WHERE user_id = ?")
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

/// Swap an unexpired session token for a fresh one.
///
/// Returns the account when the old token was valid, `None` otherwise. The
/// delete-and-insert pair runs in one transaction.
pub async fn rotate_session(
    pool: &SqlitePool,
    old_token: &str,
    new_token: &str,
    ttl_seconds: i64,
) -> Result<Option<User>> {
    let mut tx = pool.begin().await?;

    let row = sqlx::query_as::<_, UserRow>(
        r#"
        SELECT u.id, u.email, u.password_hash, u.role, u.status, u.created_at, u.updated_at
        FROM sessions s
        JOIN users u ON u.id = s.user_id
        WHERE s.token = ? AND s.expires_at > datetime('now')
        "#,
    )
    .bind(old_token)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };
    let user: User = row.try_into()?;

    sqlx::query("DELETE FROM sessions WHERE token = ?")
        .bind(old_token)
        .execute(&mut *tx)
        .await?;

    sqlx::query(
        r#"
        INSERT INTO sessions (token, user_id, expires_at)
        VALUES (?, ?, datetime('now', ?))
        "#,
    )
    .bind(new_token)
    .bind(&user.id)
    .bind(ttl_modifier(ttl_seconds))
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(Some(user))
}

/// Store a fresh password reset token, replacing any prior one for the user.
/// Delete-then-insert runs in one transaction.
pub async fn replace_reset_token(
    pool: &SqlitePool,
    user_id: &str,
    token: &str,
    ttl_seconds: i64,
) -> Result<()> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM password_reset_tokens WHERE user_id = ?")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query(
        r#"
        INSERT INTO password_reset_tokens (token, user_id, expires_at)
        VALUES (?, ?, datetime('now', ?))
        "#,
    )
    .bind(token)
    .bind(user_id)
    .bind(ttl_modifier(ttl_seconds))
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}

/// Consume an unexpired reset token, returning the owning user ID. The token
/// is deleted in the same transaction, so it only works once.
pub async fn consume_reset_token(pool: &SqlitePool, token: &str) -> Result<Option<String>> {
    let mut tx = pool.begin().await?;

    let user_id: Option<String> = sqlx::query_scalar(
        r#"
        SELECT user_id FROM password_reset_tokens
        WHERE token = ? AND expires_at > datetime('now')
        "#,
    )
    .bind(token)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(user_id) = user_id else {
        return Ok(None);
    };

    sqlx::query("DELETE FROM password_reset_tokens WHERE token = ?")
        .bind(token)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(Some(user_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{insert_user, test_db};
    use care_core::Role;

    const WEEK: i64 = 7 * 24 * 3600;

    #[tokio::test]
    async fn session_round_trip_and_logout() {
        let db = test_db().await;
        insert_user(&db, "u1", "famille@example.com", Role::Family).await;

        create_session(db.pool(), "tok-1", "u1", WEEK).await.unwrap();
        let user = find_user_by_token(db.pool(), "tok-1").await.unwrap();
        assert_eq!(user.unwrap().id, "u1");

        assert!(delete_session(db.pool(), "tok-1").await.unwrap());
        assert!(find_user_by_token(db.pool(), "tok-1")
            .await
            .unwrap()
            .is_none());
        assert!(!delete_session(db.pool(), "tok-1").await.unwrap());
    }

    #[tokio::test]
    async fn expired_sessions_do_not_resolve() {
        let db = test_db().await;
        insert_user(&db, "u1", "famille@example.com", Role::Family).await;

        create_session(db.pool(), "tok-old", "u1", -60).await.unwrap();
        assert!(find_user_by_token(db.pool(), "tok-old")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn rotation_invalidates_the_old_token() {
        let db = test_db().await;
        insert_user(&db, "u1", "famille@example.com", Role::Family).await;
        create_session(db.pool(), "tok-1", "u1", WEEK).await.unwrap();

        let user = rotate_session(db.pool(), "tok-1", "tok-2", WEEK)
            .await
            .unwrap();
        assert_eq!(user.unwrap().id, "u1");

        assert!(find_user_by_token(db.pool(), "tok-1")
            .await
            .unwrap()
            .is_none());
        assert!(find_user_by_token(db.pool(), "tok-2")
            .await
            .unwrap()
            .is_some());

        // Rotating a dead token yields nothing.
        let none = rotate_session(db.pool(), "tok-1", "tok-3", WEEK)
            .await
            .unwrap();
        assert!(none.is_none());
    }

    #[tokio::test]
    async fn reset_tokens_replace_and_consume_once() {
        let db = test_db().await;
        insert_user(&db, "u1", "famille@example.com", Role::Family).await;

        replace_reset_token(db.pool(), "u1", "reset-1", 3600)
            .await
            .unwrap();
        replace_reset_token(db.pool(), "u1", "reset-2", 3600)
            .await
            .unwrap();

        // The first token was replaced.
        assert!(consume_reset_token(db.pool(), "reset-1")
            .await
            .unwrap()
            .is_none());

        let user_id = consume_reset_token(db.pool(), "reset-2").await.unwrap();
        assert_eq!(user_id.as_deref(), Some("u1"));

        // One-shot: a second consume fails.
        assert!(consume_reset_token(db.pool(), "reset-2")
            .await
            .unwrap()
            .is_none());
    }
}
