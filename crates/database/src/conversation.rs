//! Conversation and message storage.
//!
//! There is exactly one conversation per (family, resource) pair, enforced by
//! a unique index and find-or-create semantics.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{Conversation, Message};

/// Find the conversation for a (family, resource) pair, creating it if
/// absent. `id` is only used when a new row is inserted; calling twice for
/// the same pair returns the same conversation.
pub async fn find_or_create(
    pool: &SqlitePool,
    id: &str,
    family_id: &str,
    resource_id: &str,
) -> Result<Conversation> {
    sqlx::query(
        r#"
        INSERT INTO conversations (id, family_id, resource_id)
        VALUES (?, ?, ?)
        ON CONFLICT(family_id, resource_id) DO NOTHING
        "#,
    )
    .bind(id)
    .bind(family_id)
    .bind(resource_id)
    .execute(pool)
    .await?;

    let conversation = sqlx::query_as::<_, Conversation>(
        r#"
        SELECT id, family_id, resource_id, created_at, updated_at
        FROM conversations
        WHERE family_id = ? AND resource_id = ?
        "#,
    )
    .bind(family_id)
    .bind(resource_id)
    .fetch_one(pool)
    .await?;

    Ok(conversation)
}

/// Get a conversation by ID.
pub async fn get(pool: &SqlitePool, id: &str) -> Result<Conversation> {
    sqlx::query_as::<_, Conversation>(
        r#"
        SELECT id, family_id, resource_id, created_at, updated_at
        FROM conversations
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Conversation",
        id: id.to_string(),
    })
}

/// List a family's conversations, most recently active first.
pub async fn list_for_family(pool: &SqlitePool, family_id: &str) -> Result<Vec<Conversation>> {
    let conversations = sqlx::query_as::<_, Conversation>(
        r#"
        SELECT id, family_id, resource_id, created_at, updated_at
        FROM conversations
        WHERE family_id = ?
        ORDER BY updated_at DESC
        "#,
    )
    .bind(family_id)
    .fetch_all(pool)
    .await?;

    Ok(conversations)
}

/// List a resource's conversations, most recently active first.
pub async fn list_for_resource(pool: &SqlitePool, resource_id: &str) -> Result<Vec<Conversation>> {
    let conversations = sqlx::query_as::<_, Conversation>(
        r#"
        SELECT id, family_id, resource_id, created_at, updated_at
        FROM conversations
        WHERE resource_id = ?
        ORDER BY updated_at DESC
        "#,
    )
    .bind(resource_id)
    .fetch_all(pool)
    .await?;

    Ok(conversations)
}

/// Append a message and bump the conversation's activity timestamp.
pub async fn append_message(
    pool: &SqlitePool,
    id: &str,
    conversation_id: &str,
    sender_user_id: &str,
    content: &str,
) -> Result<Message> {
    sqlx::query(
        r#"
        INSERT INTO messages (id, conversation_id, sender_user_id, content)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(id)
    .bind(conversation_id)
    .bind(sender_user_id)
    .bind(content)
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        UPDATE conversations SET updated_at = datetime('now') WHERE id = ?
        "#,
    )
    .bind(conversation_id)
    .execute(pool)
    .await?;

    let message = sqlx::query_as::<_, Message>(
        r#"
        SELECT id, conversation_id, sender_user_id, content, created_at
        FROM messages
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_one(pool)
    .await?;

    Ok(message)
}

/// List messages oldest first, capped at `limit`.
pub async fn list_messages(
    pool: &SqlitePool,
    conversation_id: &str,
    limit: i64,
) -> Result<Vec<Message>> {
    let messages = sqlx::query_as::<_, Message>(
        r#"
        SELECT id, conversation_id, sender_user_id, content, created_at
        FROM messages
        WHERE conversation_id = ?
        ORDER BY created_at ASC, id ASC
        LIMIT ?
        "#,
    )
    .bind(conversation_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(messages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{insert_user, test_db};
    use crate::{family_profile, resource_profile};
    use care_core::Role;

    async fn seed_pair(db: &crate::Database) {
        insert_user(db, "uf", "famille@example.com", Role::Family).await;
        insert_user(db, "ur", "ally@example.com", Role::Resource).await;
        family_profile::create(
            db.pool(),
            &family_profile::NewFamilyProfile {
                id: "fp1".to_string(),
                user_id: "uf".to_string(),
                display_name: "Famille".to_string(),
                postal_code: "H2X1Y4".to_string(),
                city: "Montreal".to_string(),
                region: "QC".to_string(),
                bio: None,
                needs_tags: vec![],
            },
        )
        .await
        .unwrap();
        resource_profile::create(
            db.pool(),
            &resource_profile::NewResourceProfile {
                id: "rp1".to_string(),
                user_id: "ur".to_string(),
                display_name: "Alex".to_string(),
                postal_code: "H2X2A1".to_string(),
                city: "Montreal".to_string(),
                region: "QC".to_string(),
                bio: None,
                skills_tags: vec![],
            },
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn find_or_create_is_idempotent_per_pair() {
        let db = test_db().await;
        seed_pair(&db).await;

        let first = find_or_create(db.pool(), "c1", "fp1", "rp1").await.unwrap();
        let second = find_or_create(db.pool(), "c2", "fp1", "rp1").await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(first.id, "c1");

        let listed = list_for_family(db.pool(), "fp1").await.unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn messages_append_in_order() {
        let db = test_db().await;
        seed_pair(&db).await;
        let conversation = find_or_create(db.pool(), "c1", "fp1", "rp1").await.unwrap();

        append_message(db.pool(), "m1", &conversation.id, "uf", "Bonjour!")
            .await
            .unwrap();
        append_message(db.pool(), "m2", &conversation.id, "ur", "Bonjour, bien sur.")
            .await
            .unwrap();

        let messages = list_messages(db.pool(), &conversation.id, 50).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].id, "m1");
        assert_eq!(messages[1].id, "m2");
        assert_eq!(messages[0].sender_user_id, "uf");
    }

    #[tokio::test]
    async fn get_missing_conversation_is_not_found() {
        let db = test_db().await;
        let result = get(db.pool(), "nope").await;
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
    }
}
