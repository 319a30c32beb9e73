//! Database module for SQLite persistence.
//!
//! SQLite is the source of truth: the app-version revision index, the blob
//! store, and the POI/user tables all live here.

mod repository;

pub use repository::*;

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

    // Run embedded migrations
    run_migrations(&pool).await?;

    Ok(pool)
}

/// Run database migrations.
async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    // Revision index: at most one entry per app version. The UNIQUE
    // constraint backs the invariant that readers also check explicitly.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS app_revisions (
            id TEXT PRIMARY KEY,
            app_version TEXT NOT NULL UNIQUE,
            revision INTEGER NOT NULL,
            revision_id TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Blob store: payloads are immutable once written and never deleted,
    // superseded revisions included.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS blobs (
            id TEXT PRIMARY KEY,
            payload TEXT NOT NULL,
            created_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS pois (
            id TEXT PRIMARY KEY,
            park_id TEXT NOT NULL,
            name TEXT NOT NULL,
            coordinate_x REAL,
            coordinate_y REAL,
            types TEXT,
            subtitle TEXT,
            height_requirement INTEGER,
            description TEXT,
            details TEXT,
            thumbnail_url TEXT,
            picture_url TEXT
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            group_id INTEGER,
            name TEXT NOT NULL,
            email TEXT,
            device_id TEXT,
            phone_number TEXT,
            picture_url TEXT,
            current_location_x REAL,
            current_location_y REAL,
            favorites TEXT,
            notifications_received TEXT
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes for common queries
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_blobs_created_at ON blobs(created_at);
        CREATE INDEX IF NOT EXISTS idx_pois_park_id ON pois(park_id);
        CREATE INDEX IF NOT EXISTS idx_users_group_id ON users(group_id);
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
