//! Family profile storage.

use sqlx::types::Json;
use sqlx::SqlitePool;

use serde_json::Value;

use crate::error::{DatabaseError, Result};
use crate::models::{FamilyProfile, FamilyProfileRow};

const FAMILY_COLUMNS: &str = "id, user_id, display_name, postal_code, city, region, bio, \
     needs_tags, availability, created_at, updated_at";

/// Fields required to create a family profile at registration.
#[derive(Debug, Clone)]
pub struct NewFamilyProfile {
    pub id: String,
    pub user_id: String,
    pub display_name: String,
    pub postal_code: String,
    pub city: String,
    pub region: String,
    pub bio: Option<String>,
    pub needs_tags: Vec<String>,
}

/// Partial self-service update. `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct FamilyProfileUpdate {
    pub display_name: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub bio: Option<String>,
    pub needs_tags: Option<Vec<String>>,
    pub availability: Option<Value>,
}

/// Create a family profile.
pub async fn create(pool: &SqlitePool, profile: &NewFamilyProfile) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO family_profiles (id, user_id, display_name, postal_code, city, region, bio, needs_tags)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&profile.id)
    .bind(&profile.user_id)
    .bind(&profile.display_name)
    .bind(&profile.postal_code)
    .bind(&profile.city)
    .bind(&profile.region)
    .bind(&profile.bio)
    .bind(Json(&profile.needs_tags))
    .execute(pool)
    .await?;

    Ok(())
}

/// Get the profile owned by a user.
pub async fn get_by_user(pool: &SqlitePool, user_id: &str) -> Result<FamilyProfile> {
    find_by_user(pool, user_id)
        .await?
        .ok_or_else(|| DatabaseError::NotFound {
            entity: "FamilyProfile",
            id: user_id.to_string(),
        })
}

/// Look up the profile owned by a user, if any.
pub async fn find_by_user(pool: &SqlitePool, user_id: &str) -> Result<Option<FamilyProfile>> {
    let row = sqlx::query_as::<_, FamilyProfileRow>(&format!(
        "SELECT {FAMILY_COLUMNS} FROM family_profiles WHERE user_id = ?"
    ))
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(FamilyProfile::from))
}

/// Get a family profile by ID.
pub async fn get(pool: &SqlitePool, id: &str) -> Result<FamilyProfile> {
    let row = sqlx::query_as::<_, FamilyProfileRow>(&format!(
        "SELECT {FAMILY_COLUMNS} FROM family_profiles WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "FamilyProfile",
        id: id.to_string(),
    })?;

    Ok(row.into())
}

/// Apply a partial update to the profile owned by `user_id`.
pub async fn update_by_user(
    pool: &SqlitePool,
    user_id: &str,
    update: &FamilyProfileUpdate,
) -> Result<FamilyProfile> {
    let result = sqlx::query(
        r#"
        UPDATE family_profiles
        SET display_name = COALESCE(?, display_name),
            postal_code = COALESCE(?, postal_code),
            city = COALESCE(?, city),
            region = COALESCE(?, region),
            bio = COALESCE(?, bio),
            needs_tags = COALESCE(?, needs_tags),
            availability = COALESCE(?, availability),
            updated_at = datetime('now')
        WHERE user_id = ?
        "#,
    )
    .bind(&update.display_name)
    .bind(&update.postal_code)
    .bind(&update.city)
    .bind(&update.region)
    .bind(&update.bio)
    .bind(update.needs_tags.as_ref().map(Json))
    .bind(update.availability.as_ref().map(Json))
    .bind(user_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "FamilyProfile",
            id: user_id.to_string(),
        });
    }

    get_by_user(pool, user_id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{insert_user, test_db};
    use care_core::Role;
    use serde_json::json;

    async fn seeded_profile(db: &crate::Database) -> FamilyProfile {
        insert_user(db, "u1", "famille@example.com", Role::Family).await;
        create(
            db.pool(),
            &NewFamilyProfile {
                id: "fp1".to_string(),
                user_id: "u1".to_string(),
                display_name: "Famille Demo".to_string(),
                postal_code: "H2X1Y4".to_string(),
                city: "Montreal".to_string(),
                region: "QC".to_string(),
                bio: Some("Nous cherchons de l'aide ponctuelle.".to_string()),
                needs_tags: vec!["repit".to_string(), "transport".to_string()],
            },
        )
        .await
        .unwrap();
        get_by_user(db.pool(), "u1").await.unwrap()
    }

    #[tokio::test]
    async fn create_and_fetch() {
        let db = test_db().await;
        let profile = seeded_profile(&db).await;
        assert_eq!(profile.display_name, "Famille Demo");
        assert_eq!(profile.needs_tags, vec!["repit", "transport"]);
        assert!(profile.availability.is_none());
    }

    #[tokio::test]
    async fn partial_update_keeps_unset_fields() {
        let db = test_db().await;
        seeded_profile(&db).await;

        let updated = update_by_user(
            db.pool(),
            "u1",
            &FamilyProfileUpdate {
                city: Some("Laval".to_string()),
                availability: Some(json!({"weekdays": "soir"})),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.city, "Laval");
        assert_eq!(updated.display_name, "Famille Demo");
        assert_eq!(updated.availability, Some(json!({"weekdays": "soir"})));
    }

    #[tokio::test]
    async fn update_missing_profile_is_not_found() {
        let db = test_db().await;
        let result = update_by_user(db.pool(), "ghost", &FamilyProfileUpdate::default()).await;
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
    }
}
