//! Account CRUD and the admin family listing.

use sqlx::SqlitePool;

use care_core::{Role, UserStatus};

use crate::error::{DatabaseError, Result};
use crate::listing::SortOrder;
use crate::models::{User, UserRow};

const USER_COLUMNS: &str = "id, email, password_hash, role, status, created_at, updated_at";

/// Fields required to create an account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub status: UserStatus,
}

/// Create a new account. Emails are unique.
pub async fn create_user(pool: &SqlitePool, user: &NewUser) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO users (id, email, password_hash, role, status)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&user.id)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.role.as_str())
    .bind(user.status.as_str())
    .execute(pool)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return DatabaseError::AlreadyExists {
                    entity: "User",
                    id: user.email.clone(),
                };
            }
        }
        DatabaseError::Sqlx(e)
    })?;

    Ok(())
}

/// Get an account by ID.
pub async fn get_user(pool: &SqlitePool, id: &str) -> Result<User> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "User",
        id: id.to_string(),
    })?;

    row.try_into()
}

/// Look up an account by email, if any. Lookups are case-insensitive because
/// emails are stored lowercased.
pub async fn find_user_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE email = ?"
    ))
    .bind(email.to_lowercase())
    .fetch_optional(pool)
    .await?;

    row.map(User::try_from).transpose()
}

/// Set an account's status.
pub async fn update_status(pool: &SqlitePool, id: &str, status: UserStatus) -> Result<User> {
    let result = sqlx::query(
        r#"
        UPDATE users
        SET status = ?, updated_at = datetime('now')
        WHERE id = ?
        "#,
    )
    .bind(status.as_str())
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "User",
            id: id.to_string(),
        });
    }

    get_user(pool, id).await
}

/// Set the status of several family accounts at once.
///
/// Ids that do not match a FAMILY account are silently skipped; the returned
/// count covers rows actually updated.
pub async fn bulk_update_status(
    pool: &SqlitePool,
    ids: &[String],
    status: UserStatus,
) -> Result<u64> {
    if ids.is_empty() {
        return Ok(0);
    }

    let placeholders = vec!["?"; ids.len()].join(", ");
    let query = format!(
        r#"
        UPDATE users
        SET status = ?, updated_at = datetime('now')
        WHERE role = 'FAMILY' AND id IN ({placeholders})
        "#
    );

    let mut q = sqlx::query(&query).bind(status.as_str());
    for id in ids {
        q = q.bind(id);
    }
    let result = q.execute(pool).await?;

    Ok(result.rows_affected())
}

/// Change an account's role.
pub async fn update_role(pool: &SqlitePool, id: &str, role: Role) -> Result<User> {
    let result = sqlx::query(
        r#"
        UPDATE users
        SET role = ?, updated_at = datetime('now')
        WHERE id = ?
        "#,
    )
    .bind(role.as_str())
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "User",
            id: id.to_string(),
        });
    }

    get_user(pool, id).await
}

/// Replace an account's password hash.
pub async fn update_password_hash(pool: &SqlitePool, id: &str, password_hash: &str) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE users
        SET password_hash = ?, updated_at = datetime('now')
        WHERE id = ?
        "#,
    )
    .bind(password_hash)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "User",
            id: id.to_string(),
        });
    }

    Ok(())
}

/// Delete an account. Profiles, subscriptions, sessions and conversations
/// cascade with it.
pub async fn delete_user(pool: &SqlitePool, id: &str) -> Result<()> {
    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "User",
            id: id.to_string(),
        });
    }

    Ok(())
}

/// Sort key for the family listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FamilySort {
    CreatedAt,
    Email,
    Status,
}

impl FamilySort {
    fn column(&self) -> &'static str {
        match self {
            FamilySort::CreatedAt => "u.created_at",
            FamilySort::Email => "u.email",
            FamilySort::Status => "u.status",
        }
    }

    /// Parse a console-supplied sort key, defaulting to creation time.
    pub fn parse(s: Option<&str>) -> Self {
        match s {
            Some("email") => FamilySort::Email,
            Some("status") => FamilySort::Status,
            _ => FamilySort::CreatedAt,
        }
    }
}

/// Filters for the admin family listing.
#[derive(Debug, Clone)]
pub struct FamilyListFilter {
    /// Free-text match over email, display name, city and postal prefix.
    pub query: String,
    pub status: Option<UserStatus>,
    pub page: i64,
    pub page_size: i64,
    pub sort: FamilySort,
    pub sort_order: SortOrder,
}

/// List family accounts for the admin console.
///
/// Returns the total count over the filter (ignoring pagination) and the
/// requested page.
pub async fn list_families(
    pool: &SqlitePool,
    filter: &FamilyListFilter,
) -> Result<(i64, Vec<User>)> {
    let needle = filter.query.trim().to_lowercase();
    let postal_needle: String = filter
        .query
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase();
    let status = filter.status.map(|s| s.as_str()).unwrap_or("");

    let where_clause = r#"
        u.role = 'FAMILY'
        AND (? = '' OR u.status = ?)
        AND (
            ? = ''
            OR lower(u.email) LIKE '%' || ? || '%'
            OR lower(f.display_name) LIKE '%' || ? || '%'
            OR lower(f.city) LIKE '%' || ? || '%'
            OR f.postal_code LIKE ? || '%'
        )
    "#;

    let count_query = format!(
        "SELECT COUNT(*) FROM users u LEFT JOIN family_profiles f ON f.user_id = u.id WHERE {where_clause}"
    );
    let total = sqlx::query_scalar::<_, i64>(&count_query)
        .bind(status)
        .bind(status)
        .bind(&needle)
        .bind(&needle)
        .bind(&needle)
        .bind(&needle)
        .bind(&postal_needle)
        .fetch_one(pool)
        .await?;

    let page_query = format!(
        r#"
        SELECT u.id, u.email, u.password_hash, u.role, u.status, u.created_at, u.updated_at
        FROM users u LEFT JOIN family_profiles f ON f.user_id = u.id
        WHERE {where_clause}
        ORDER BY {column} {order}
        LIMIT ? OFFSET ?
        "#,
        column = filter.sort.column(),
        order = filter.sort_order.as_sql(),
    );
    let rows = sqlx::query_as::<_, UserRow>(&page_query)
        .bind(status)
        .bind(status)
        .bind(&needle)
        .bind(&needle)
        .bind(&needle)
        .bind(&needle)
        .bind(&postal_needle)
        .bind(filter.page_size)
        .bind((filter.page - 1) * filter.page_size)
        .fetch_all(pool)
        .await?;

    let users = rows
        .into_iter()
        .map(User::try_from)
        .collect::<Result<Vec<_>>>()?;

    Ok((total, users))
}
