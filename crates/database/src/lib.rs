//! SQLite persistence layer for the care marketplace.
//!
//! This crate provides async database operations for accounts, profiles,
//! subscriptions, conversations and the admin audit trail using SQLx with
//! SQLite.
//!
//! # Example
//!
//! ```no_run
//! use database::{user, Database, NewUser};
//! use care_core::{Role, UserStatus};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect and run migrations
//!     let db = Database::connect("sqlite:care.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     let new_user = NewUser {
//!         id: "c27fb365-0c84-4cf2-8555-814bb065e448".to_string(),
//!         email: "famille@example.com".to_string(),
//!         password_hash: "$argon2id$...".to_string(),
//!         role: Role::Family,
//!         status: UserStatus::Active,
//!     };
//!     user::create_user(db.pool(), &new_user).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod audit_log;
pub mod conversation;
pub mod error;
pub mod family_profile;
pub mod listing;
pub mod maintenance;
pub mod models;
pub mod resource_profile;
pub mod session;
pub mod subscription;
pub mod user;
pub mod validation;

pub use error::{DatabaseError, Result};
pub use models::{
    AuditLogEntry, Conversation, FamilyProfile, MaintenanceState, Message, Subscription, User,
};
pub use user::NewUser;
pub use validation::ValidationError;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Database connection wrapper.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Default pool size for database connections.
    const DEFAULT_POOL_SIZE: u32 = 20;

    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    /// Use `?mode=rwc` to create the database file if it doesn't exist, or
    /// `sqlite::memory:` for tests.
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_pool_size(url, Self::DEFAULT_POOL_SIZE).await
    }

    /// Connect to a SQLite database with a custom pool size.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(options)
            .await?;

        tracing::info!("Connected to database: {} (pool size: {})", url, pool_size);

        Ok(Self { pool })
    }

    /// Run database migrations.
    ///
    /// This should be called once after connecting to ensure the schema is up
    /// to date.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Running database migrations...");

        sqlx::migrate!("./migrations").run(&self.pool).await?;

        tracing::info!("Migrations complete");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use care_core::{Role, UserStatus};

    pub async fn test_db() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    pub async fn insert_user(db: &Database, id: &str, email: &str, role: Role) -> models::User {
        let new_user = NewUser {
            id: id.to_string(),
            email: email.to_string(),
            password_hash: "$argon2id$test".to_string(),
            role,
            status: UserStatus::Active,
        };
        user::create_user(db.pool(), &new_user).await.unwrap();
        user::get_user(db.pool(), id).await.unwrap()
    }
}
