//! Family subscription storage.

use sqlx::SqlitePool;

use care_core::SubscriptionStatus;

use crate::error::Result;
use crate::models::{Subscription, SubscriptionRow};

const SUBSCRIPTION_COLUMNS: &str = "id, user_id, status, stripe_customer_id, \
     stripe_subscription_id, current_period_end, created_at, updated_at";

/// Activate a subscription reported by the payment provider.
///
/// When a row already exists for the provider subscription ID it is marked
/// ACTIVE in place; otherwise a new row is inserted. Runs in one transaction
/// so a concurrent reader never observes a half-applied upsert.
pub async fn mark_active(
    pool: &SqlitePool,
    id: &str,
    user_id: &str,
    stripe_customer_id: Option<&str>,
    stripe_subscription_id: Option<&str>,
) -> Result<()> {
    let mut tx = pool.begin().await?;

    let existing: Option<String> = match stripe_subscription_id {
        Some(provider_id) => {
            sqlx::query_scalar("SELECT id FROM subscriptions WHERE stripe_subscription_id = ?")
                .bind(provider_id)
                .fetch_optional(&mut *tx)
                .await?
        }
        None => None,
    };

    match existing {
        Some(existing_id) => {
            sqlx::query(
                r#"
                UPDATE subscriptions
                SET status = ?, stripe_customer_id = ?, updated_at = datetime('now')
                WHERE id = ?
                "#,
            )
            .bind(SubscriptionStatus::Active.as_str())
            .bind(stripe_customer_id)
            .bind(existing_id)
            .execute(&mut *tx)
            .await?;
        }
        None => {
            sqlx::query(
                r#"
                INSERT INTO subscriptions (id, user_id, status, stripe_customer_id, stripe_subscription_id)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(id)
            .bind(user_id)
            .bind(SubscriptionStatus::Active.as_str())
            .bind(stripe_customer_id)
            .bind(stripe_subscription_id)
            .execute(&mut *tx)
            .await?;
        }
    }

    tx.commit().await?;
    Ok(())
}

/// Set the status of a subscription by its provider ID.
pub async fn update_status_by_provider_id(
    pool: &SqlitePool,
    stripe_subscription_id: &str,
    status: SubscriptionStatus,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE subscriptions
        SET status = ?, updated_at = datetime('now')
        WHERE stripe_subscription_id = ?
        "#,
    )
    .bind(status.as_str())
    .bind(stripe_subscription_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// True when the user has at least one ACTIVE subscription row.
pub async fn has_active_subscription(pool: &SqlitePool, user_id: &str) -> Result<bool> {
    let row: Option<i32> = sqlx::query_scalar(
        r#"
        SELECT 1 FROM subscriptions
        WHERE user_id = ? AND status = 'ACTIVE'
        LIMIT 1
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.is_some())
}

/// The user's most recently updated subscription, if any.
pub async fn latest_for_user(pool: &SqlitePool, user_id: &str) -> Result<Option<Subscription>> {
    let row = sqlx::query_as::<_, SubscriptionRow>(&format!(
        r#"
        SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions
        WHERE user_id = ?
        ORDER BY updated_at DESC
        LIMIT 1
        "#
    ))
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    row.map(Subscription::try_from).transpose()
}
