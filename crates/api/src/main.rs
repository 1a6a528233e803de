//! HTTP JSON API for the care marketplace.
//!
//! Serves the public directory search, profile and messaging endpoints plus
//! the admin moderation console over axum, backed by the SQLite persistence
//! crate.

mod auth;
mod config;
mod error;
mod guard;
mod mailer;
mod rate_limit;
mod routes;
mod state;

use care_core::{Role, UserStatus};
use database::{user, Database, NewUser};
use tracing::info;
use uuid::Uuid;

use crate::config::Config;
use crate::mailer::Mailer;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    // Load configuration
    let config = Config::from_env()?;
    info!(addr = %config.addr, "Starting API server");

    // Connect to database
    let db = Database::connect(&config.database_url).await?;
    db.migrate().await?;

    // Seed the admin account when configured
    seed_admin(&db, &config).await?;

    // Build application state
    let mailer = Mailer::new(config.smtp.as_ref());
    let addr = config.addr;
    let state = AppState::new(db, mailer, config);

    // Build router
    let app = routes::router(state);

    // Start server
    info!(addr = %addr, "API server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the configured admin account if it does not exist yet.
async fn seed_admin(db: &Database, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) else {
        return Ok(());
    };

    if user::find_user_by_email(db.pool(), email).await?.is_some() {
        return Ok(());
    }

    let admin = NewUser {
        id: Uuid::new_v4().to_string(),
        email: email.to_lowercase(),
        password_hash: auth::hash_password(password)?,
        role: Role::Admin,
        status: UserStatus::Active,
    };
    user::create_user(db.pool(), &admin).await?;
    info!(email = %admin.email, "Seeded admin account");

    Ok(())
}
