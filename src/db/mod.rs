//! Database module for SQLite persistence.
//!
//! SQLite is the source of truth for all application data.

mod reports;
mod repository;

pub use reports::*;
pub use repository::*;

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

/// Initialize the database connection pool and run migrations.
pub async fn init_database(db_path: &Path) -> Result<SqlitePool, sqlx::Error> {
    // Ensure the parent directory exists
    if let Some(parent) = db_path.parent() {
        tokio::fs::create_dir_all(parent).await.ok();
    }

    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

    let options = SqliteConnectOptions::from_str(&db_url)?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

/// Timestamps are stored as RFC 3339 UTC text with millisecond precision so
/// that string order matches time order.
pub(crate) fn ts(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Current time truncated to what `ts` keeps, so returned models match stored rows.
pub(crate) fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Run database migrations.
async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            username TEXT NOT NULL UNIQUE,
            full_name TEXT,
            role TEXT NOT NULL DEFAULT 'collector' CHECK (role IN ('admin', 'collector')),
            password_hash TEXT NOT NULL,
            created_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sessions (
            token TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            created_at TEXT NOT NULL,
            expires_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS campaigns (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            location TEXT NOT NULL,
            start_date TEXT NOT NULL,
            end_date TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'active' CHECK (status IN ('active', 'finished')),
            created_by TEXT NOT NULL,
            created_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    // No uniqueness on (campaign_id, user_id): the store permits repeated rows.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS campaign_participants (
            id TEXT PRIMARY KEY,
            campaign_id TEXT NOT NULL,
            user_id TEXT NOT NULL,
            joined_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS contacts (
            id TEXT PRIMARY KEY,
            campaign_id TEXT NOT NULL,
            collector_id TEXT NOT NULL,
            neighborhood TEXT NOT NULL,
            first_name TEXT NOT NULL,
            phone TEXT NOT NULL,
            demand TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS app_settings (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            registration_open INTEGER NOT NULL DEFAULT 1,
            default_campaign_end_time TEXT NOT NULL DEFAULT '18:00'
        );

        INSERT OR IGNORE INTO app_settings (id, registration_open, default_campaign_end_time)
        VALUES (1, 1, '18:00');
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes for common queries
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_sessions_user_id ON sessions(user_id);
        CREATE INDEX IF NOT EXISTS idx_campaigns_status ON campaigns(status);
        CREATE INDEX IF NOT EXISTS idx_campaigns_created_at ON campaigns(created_at);
        CREATE INDEX IF NOT EXISTS idx_participants_user_id ON campaign_participants(user_id, joined_at);
        CREATE INDEX IF NOT EXISTS idx_participants_campaign_id ON campaign_participants(campaign_id);
        CREATE INDEX IF NOT EXISTS idx_contacts_campaign_id ON contacts(campaign_id);
        CREATE INDEX IF NOT EXISTS idx_contacts_collector_id ON contacts(collector_id);
        CREATE INDEX IF NOT EXISTS idx_contacts_created_at ON contacts(created_at);
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
