//! Database repository for the revision index, blob store, POIs and users.
//!
//! The sync-protocol operations live here: the update check, blob ingestion
//! with its per-app-version revision bump, and the history read. Blob
//! ingestion deliberately performs two independent writes (blob insert,
//! index write) with no transaction across them; a failure in between leaves
//! an orphaned blob behind, which the history endpoint still exposes.

use chrono::Utc;
use serde_json::Value;
use sqlx::{Row, SqlitePool};

use crate::errors::AppError;
use crate::models::{
    AppVersionEntry, BlobHistory, BlobRecord, CreatePoiRequest, CreateUserRequest, Poi,
    UpdateCheck, User,
};

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ==================== SYNC PROTOCOL ====================

    /// Decide whether a client at (app_version, revision) needs a newer blob.
    ///
    /// Read-only. A stale client gets the current blob with its revision
    /// number attached; an up-to-date client gets no payload at all.
    pub async fn check_blob_update(
        &self,
        app_version: &str,
        revision: i64,
    ) -> Result<UpdateCheck, AppError> {
        let entry = self.single_app_version_entry(app_version).await?;

        if entry.revision <= revision {
            return Ok(UpdateCheck {
                is_up_to_date: true,
                blob: None,
            });
        }

        let blob = self.get_blob(&entry.revision_id).await?.ok_or_else(|| {
            AppError::RevisionIndex(format!(
                "revision index for app version {} references missing blob {}",
                app_version, entry.revision_id
            ))
        })?;

        Ok(UpdateCheck {
            is_up_to_date: false,
            blob: Some(blob.into_revision_document(entry.revision)),
        })
    }

    /// Ingest a new blob for an app version and bump its revision.
    ///
    /// First blob for a version creates the index entry (revision defaults
    /// to 1); later blobs must strictly increase the revision when one is
    /// supplied, and auto-increment when it is not. The index write is
    /// conditional on the previously read revision, so a concurrent
    /// ingestion for the same version surfaces as a conflict instead of
    /// silently losing a revision bump.
    pub async fn insert_data_blob(
        &self,
        blob: &Value,
        app_version: &str,
        revision: Option<i64>,
    ) -> Result<AppVersionEntry, AppError> {
        let mut entries = self.get_app_version_entries(app_version).await?;
        if entries.len() > 1 {
            return Err(AppError::RevisionIndex(format!(
                "no data revisions found for app version: {}",
                app_version
            )));
        }

        match entries.pop() {
            Some(entry) => self.ingest_for_entry(entry, blob, revision).await,
            None => {
                let next_revision = revision.unwrap_or(1);
                let saved = self.insert_blob(blob).await?;
                self.insert_app_version_entry(app_version, next_revision, &saved.id)
                    .await
            }
        }
    }

    /// Ingest a later blob for a known version: validate the requested
    /// revision against the entry as read, store the blob, then bump the
    /// index entry conditionally on that same read revision.
    async fn ingest_for_entry(
        &self,
        entry: AppVersionEntry,
        blob: &Value,
        revision: Option<i64>,
    ) -> Result<AppVersionEntry, AppError> {
        if let Some(requested) = revision {
            if requested <= entry.revision {
                return Err(AppError::Validation(format!(
                    "new revision must be greater than current. Current revision: {}",
                    entry.revision
                )));
            }
        }
        let next_revision = revision.unwrap_or(entry.revision + 1);

        let saved = self.insert_blob(blob).await?;

        let affected = sqlx::query(
            "UPDATE app_revisions SET revision = ?, revision_id = ? WHERE id = ? AND revision = ?",
        )
        .bind(next_revision)
        .bind(&saved.id)
        .bind(&entry.id)
        .bind(entry.revision)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if affected == 0 {
            // Lost the conditional write to a concurrent ingestion.
            let current = self
                .get_app_version_entries(&entry.app_version)
                .await?
                .into_iter()
                .next()
                .map(|e| e.revision)
                .unwrap_or(entry.revision);
            return Err(AppError::Conflict(format!(
                "concurrent revision update detected. Current revision: {}",
                current
            )));
        }

        Ok(AppVersionEntry {
            revision: next_revision,
            revision_id: saved.id,
            ..entry
        })
    }

    /// Full contents of the revision index and the blob store, for audit
    /// tooling. Two independent full-table reads; the first error wins.
    pub async fn blob_history(&self) -> Result<BlobHistory, AppError> {
        let entries = self.list_app_version_entries().await?;
        let blobs = self.list_blobs().await?;

        Ok(BlobHistory {
            app_version_matches: entries,
            blobs: blobs.into_iter().map(BlobRecord::into_document).collect(),
        })
    }

    // ==================== REVISION INDEX ====================

    /// All index entries matching an app version. The schema enforces
    /// uniqueness, but readers still fetch all matches so a duplicate is
    /// surfaced as an invariant breach instead of silently resolved.
    pub async fn get_app_version_entries(
        &self,
        app_version: &str,
    ) -> Result<Vec<AppVersionEntry>, AppError> {
        let rows = sqlx::query(
            "SELECT id, app_version, revision, revision_id FROM app_revisions WHERE app_version = ?",
        )
        .bind(app_version)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(app_version_entry_from_row).collect())
    }

    /// List all index entries, ordered by app version.
    pub async fn list_app_version_entries(&self) -> Result<Vec<AppVersionEntry>, AppError> {
        let rows = sqlx::query(
            "SELECT id, app_version, revision, revision_id FROM app_revisions ORDER BY app_version",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(app_version_entry_from_row).collect())
    }

    /// The single index entry for an app version; zero or multiple matches
    /// are an error worth surfacing.
    async fn single_app_version_entry(
        &self,
        app_version: &str,
    ) -> Result<AppVersionEntry, AppError> {
        let mut entries = self.get_app_version_entries(app_version).await?;
        if entries.len() != 1 {
            return Err(AppError::RevisionIndex(format!(
                "no data revisions found for app version: {}",
                app_version
            )));
        }
        Ok(entries.remove(0))
    }

    async fn insert_app_version_entry(
        &self,
        app_version: &str,
        revision: i64,
        revision_id: &str,
    ) -> Result<AppVersionEntry, AppError> {
        let id = uuid::Uuid::new_v4().to_string();

        let result = sqlx::query(
            "INSERT INTO app_revisions (id, app_version, revision, revision_id) VALUES (?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(app_version)
        .bind(revision)
        .bind(revision_id)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(AppVersionEntry {
                id,
                app_version: app_version.to_string(),
                revision,
                revision_id: revision_id.to_string(),
            }),
            // Two first-time ingestions raced; the second one loses.
            Err(err) if is_unique_violation(&err) => Err(AppError::Conflict(format!(
                "app version {} was registered concurrently",
                app_version
            ))),
            Err(err) => Err(err.into()),
        }
    }

    // ==================== BLOBS ====================

    /// Insert a blob payload. Blobs are immutable and never deleted.
    pub async fn insert_blob(&self, payload: &Value) -> Result<BlobRecord, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        let payload_json = serde_json::to_string(payload)?;

        sqlx::query("INSERT INTO blobs (id, payload, created_at) VALUES (?, ?, ?)")
            .bind(&id)
            .bind(&payload_json)
            .bind(&now)
            .execute(&self.pool)
            .await?;

        Ok(BlobRecord {
            id,
            created_at: now,
            payload: payload.clone(),
        })
    }

    /// Get a blob by id.
    pub async fn get_blob(&self, id: &str) -> Result<Option<BlobRecord>, AppError> {
        let row = sqlx::query("SELECT id, payload, created_at FROM blobs WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(blob_from_row).transpose()
    }

    /// List all blobs, ordered by insertion time.
    pub async fn list_blobs(&self) -> Result<Vec<BlobRecord>, AppError> {
        let rows = sqlx::query("SELECT id, payload, created_at FROM blobs ORDER BY created_at, id")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(blob_from_row).collect()
    }

    // ==================== POI OPERATIONS ====================

    /// Save a POI. The store assigns the id.
    pub async fn insert_poi(&self, request: &CreatePoiRequest) -> Result<Poi, AppError> {
        let park_id = required_field(request.park_id.as_deref(), "parkId")?;
        let name = required_field(request.name.as_deref(), "name")?;

        let id = uuid::Uuid::new_v4().to_string();
        let types_json = request
            .types
            .as_ref()
            .map(|t| serde_json::to_string(t).unwrap_or_default());
        let details_json = request
            .details
            .as_ref()
            .map(|d| serde_json::to_string(d).unwrap_or_default());

        sqlx::query(
            r#"INSERT INTO pois
                (id, park_id, name, coordinate_x, coordinate_y, types, subtitle,
                 height_requirement, description, details, thumbnail_url, picture_url)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&id)
        .bind(&park_id)
        .bind(&name)
        .bind(request.coordinate_x)
        .bind(request.coordinate_y)
        .bind(&types_json)
        .bind(&request.subtitle)
        .bind(request.height_requirement)
        .bind(&request.description)
        .bind(&details_json)
        .bind(&request.thumbnail_url)
        .bind(&request.picture_url)
        .execute(&self.pool)
        .await?;

        Ok(Poi {
            id,
            park_id,
            name,
            coordinate_x: request.coordinate_x,
            coordinate_y: request.coordinate_y,
            types: request.types.clone(),
            subtitle: request.subtitle.clone(),
            height_requirement: request.height_requirement,
            description: request.description.clone(),
            details: request.details.clone(),
            thumbnail_url: request.thumbnail_url.clone(),
            picture_url: request.picture_url.clone(),
        })
    }

    /// List all POIs.
    pub async fn list_pois(&self) -> Result<Vec<Poi>, AppError> {
        let rows = sqlx::query(
            r#"SELECT id, park_id, name, coordinate_x, coordinate_y, types, subtitle,
                      height_requirement, description, details, thumbnail_url, picture_url
               FROM pois ORDER BY park_id, name"#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(poi_from_row).collect()
    }

    /// List the POIs of one park.
    pub async fn list_park_pois(&self, park_id: &str) -> Result<Vec<Poi>, AppError> {
        let rows = sqlx::query(
            r#"SELECT id, park_id, name, coordinate_x, coordinate_y, types, subtitle,
                      height_requirement, description, details, thumbnail_url, picture_url
               FROM pois WHERE park_id = ? ORDER BY name"#,
        )
        .bind(park_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(poi_from_row).collect()
    }

    // ==================== USER OPERATIONS ====================

    /// Save a user. Any client-supplied id is discarded; the store assigns
    /// a fresh one.
    pub async fn insert_user(&self, request: &CreateUserRequest) -> Result<User, AppError> {
        let name = required_field(request.name.as_deref(), "name")?;

        let id = uuid::Uuid::new_v4().to_string();
        let favorites_json = request
            .favorites
            .as_ref()
            .map(|f| serde_json::to_string(f).unwrap_or_default());
        let notifications_json = request
            .notifications_received
            .as_ref()
            .map(|n| serde_json::to_string(n).unwrap_or_default());

        sqlx::query(
            r#"INSERT INTO users
                (id, group_id, name, email, device_id, phone_number, picture_url,
                 current_location_x, current_location_y, favorites, notifications_received)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&id)
        .bind(request.group)
        .bind(&name)
        .bind(&request.email)
        .bind(&request.device_id)
        .bind(&request.phone_number)
        .bind(&request.picture_url)
        .bind(request.current_location_x)
        .bind(request.current_location_y)
        .bind(&favorites_json)
        .bind(&notifications_json)
        .execute(&self.pool)
        .await?;

        Ok(User {
            id,
            group: request.group,
            name,
            email: request.email.clone(),
            device_id: request.device_id.clone(),
            phone_number: request.phone_number.clone(),
            picture_url: request.picture_url.clone(),
            current_location_x: request.current_location_x,
            current_location_y: request.current_location_y,
            favorites: request.favorites.clone(),
            notifications_received: request.notifications_received.clone(),
        })
    }

    /// Get a user by id.
    pub async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query(
            r#"SELECT id, group_id, name, email, device_id, phone_number, picture_url,
                      current_location_x, current_location_y, favorites, notifications_received
               FROM users WHERE id = ?"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    /// List all users.
    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let rows = sqlx::query(
            r#"SELECT id, group_id, name, email, device_id, phone_number, picture_url,
                      current_location_x, current_location_y, favorites, notifications_received
               FROM users ORDER BY name"#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(user_from_row).collect()
    }

    /// List the users of one group.
    pub async fn list_group_users(&self, group_id: i64) -> Result<Vec<User>, AppError> {
        let rows = sqlx::query(
            r#"SELECT id, group_id, name, email, device_id, phone_number, picture_url,
                      current_location_x, current_location_y, favorites, notifications_received
               FROM users WHERE group_id = ? ORDER BY name"#,
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(user_from_row).collect()
    }
}

fn required_field(value: Option<&str>, field: &str) -> Result<String, AppError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(AppError::Validation(format!("{} is required", field))),
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err.as_database_error().map(|d| d.kind()),
        Some(sqlx::error::ErrorKind::UniqueViolation)
    )
}

// Helper functions for row conversion

fn app_version_entry_from_row(row: &sqlx::sqlite::SqliteRow) -> AppVersionEntry {
    AppVersionEntry {
        id: row.get("id"),
        app_version: row.get("app_version"),
        revision: row.get("revision"),
        revision_id: row.get("revision_id"),
    }
}

fn blob_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<BlobRecord, AppError> {
    let payload_json: String = row.get("payload");
    let payload = serde_json::from_str(&payload_json)?;

    Ok(BlobRecord {
        id: row.get("id"),
        created_at: row.get("created_at"),
        payload,
    })
}

fn poi_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Poi, AppError> {
    let types_str: Option<String> = row.get("types");
    let details_str: Option<String> = row.get("details");

    Ok(Poi {
        id: row.get("id"),
        park_id: row.get("park_id"),
        name: row.get("name"),
        coordinate_x: row.get("coordinate_x"),
        coordinate_y: row.get("coordinate_y"),
        types: types_str.as_deref().map(parse_json_array).transpose()?,
        subtitle: row.get("subtitle"),
        height_requirement: row.get("height_requirement"),
        description: row.get("description"),
        details: details_str.as_deref().map(parse_json_array).transpose()?,
        thumbnail_url: row.get("thumbnail_url"),
        picture_url: row.get("picture_url"),
    })
}

fn user_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<User, AppError> {
    let favorites_str: Option<String> = row.get("favorites");
    let notifications_str: Option<String> = row.get("notifications_received");

    Ok(User {
        id: row.get("id"),
        group: row.get("group_id"),
        name: row.get("name"),
        email: row.get("email"),
        device_id: row.get("device_id"),
        phone_number: row.get("phone_number"),
        picture_url: row.get("picture_url"),
        current_location_x: row.get("current_location_x"),
        current_location_y: row.get("current_location_y"),
        favorites: favorites_str.as_deref().map(parse_id_array).transpose()?,
        notifications_received: notifications_str.as_deref().map(parse_id_array).transpose()?,
    })
}

// A malformed array column is a store failure, not an empty list.

fn parse_json_array(s: &str) -> Result<Vec<String>, AppError> {
    Ok(serde_json::from_str(s)?)
}

fn parse_id_array(s: &str) -> Result<Vec<i64>, AppError> {
    Ok(serde_json::from_str(s)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_database;
    use serde_json::json;
    use tempfile::TempDir;

    async fn test_repo() -> (Repository, TempDir) {
        let dir = TempDir::new().unwrap();
        let pool = init_database(&dir.path().join("test.sqlite")).await.unwrap();
        (Repository::new(pool), dir)
    }

    #[tokio::test]
    async fn test_lost_revision_race_is_a_conflict() {
        let (repo, _dir) = test_repo().await;

        repo.insert_data_blob(&json!({ "pois": [] }), "0.2.1123", None)
            .await
            .unwrap();
        let stale = repo.single_app_version_entry("0.2.1123").await.unwrap();

        // A second ingestion lands between the stale read and its write.
        repo.insert_data_blob(&json!({ "pois": [1] }), "0.2.1123", None)
            .await
            .unwrap();

        let err = repo
            .ingest_for_entry(stale, &json!({ "pois": [2] }), None)
            .await
            .unwrap_err();
        match err {
            AppError::Conflict(message) => assert_eq!(
                message,
                "concurrent revision update detected. Current revision: 2"
            ),
            other => panic!("expected a conflict, got {:?}", other),
        }

        // The winning bump stays in place.
        let entry = repo.single_app_version_entry("0.2.1123").await.unwrap();
        assert_eq!(entry.revision, 2);
    }

    #[tokio::test]
    async fn test_duplicate_version_registration_is_a_conflict() {
        let (repo, _dir) = test_repo().await;

        let blob = repo.insert_blob(&json!({ "pois": [] })).await.unwrap();
        repo.insert_app_version_entry("0.3.0", 1, &blob.id)
            .await
            .unwrap();

        // Same version registered again, as a racing first-time ingestion
        // that lost to the first insert would.
        let err = repo
            .insert_app_version_entry("0.3.0", 1, &blob.id)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_corrupt_array_column_is_surfaced() {
        let (repo, _dir) = test_repo().await;

        sqlx::query("INSERT INTO users (id, name, favorites) VALUES (?, ?, ?)")
            .bind("user-1")
            .bind("Kai")
            .bind("not an array")
            .execute(&repo.pool)
            .await
            .unwrap();

        assert!(repo.get_user("user-1").await.is_err());
        assert!(repo.list_users().await.is_err());
    }
}
