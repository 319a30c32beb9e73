//! On-device sync consumer for the demo dataset.
//!
//! The companion app ships with a bundled seed dataset. At launch it imports
//! whichever dataset is newest on disk (a previously synced cache wins over
//! the seed), then asks the backend whether a newer blob exists for its app
//! version and writes it to the cache as soon as it arrives, so the running
//! session can re-import it.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::UpdateCheck;

/// Errors from the sync consumer.
#[derive(Debug)]
pub enum SyncError {
    /// Reading or writing the seed/cache files failed
    Io(std::io::Error),
    /// A dataset on disk or on the wire was not valid JSON
    Json(serde_json::Error),
    /// The update-check request itself failed
    Http(reqwest::Error),
    /// The backend answered with an error envelope
    Server(String),
}

impl std::fmt::Display for SyncError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncError::Io(err) => write!(f, "io error: {}", err),
            SyncError::Json(err) => write!(f, "json error: {}", err),
            SyncError::Http(err) => write!(f, "http error: {}", err),
            SyncError::Server(msg) => write!(f, "server error: {}", msg),
        }
    }
}

impl std::error::Error for SyncError {}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::Io(err)
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::Json(err)
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        SyncError::Http(err)
    }
}

/// A dataset as stored on the device: the payload plus the revision it
/// corresponds to. The bundled seed counts as revision 0.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedDataset {
    pub revision: i64,
    pub data: Value,
}

/// Outcome of one refresh against the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The local dataset already matches the server's revision
    UpToDate { revision: i64 },
    /// A newer blob was fetched and written to the cache
    Updated { revision: i64 },
}

/// Sync consumer for one app install.
///
/// Explicitly constructed and passed where needed; one instance per app
/// process, no shared global state.
pub struct SyncClient {
    base_url: String,
    app_version: String,
    api_key: Option<String>,
    seed_path: PathBuf,
    cache_path: PathBuf,
    http: reqwest::Client,
}

impl SyncClient {
    pub fn new(
        base_url: impl Into<String>,
        app_version: impl Into<String>,
        api_key: Option<String>,
        seed_path: impl Into<PathBuf>,
        cache_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            app_version: app_version.into(),
            api_key,
            seed_path: seed_path.into(),
            cache_path: cache_path.into(),
            http: reqwest::Client::new(),
        }
    }

    /// Load the dataset the app should import at launch.
    ///
    /// A previously synced cache takes precedence over the bundled seed, so
    /// server data survives a relaunch instead of being reset every time.
    pub fn load_dataset(&self) -> Result<CachedDataset, SyncError> {
        if self.cache_path.exists() {
            let raw = std::fs::read_to_string(&self.cache_path)?;
            return Ok(serde_json::from_str(&raw)?);
        }

        let raw = std::fs::read_to_string(&self.seed_path)?;
        Ok(CachedDataset {
            revision: 0,
            data: serde_json::from_str(&raw)?,
        })
    }

    /// Ask the backend whether a newer blob exists for this app version and,
    /// if so, write it to the cache immediately.
    pub async fn refresh(&self) -> Result<SyncOutcome, SyncError> {
        let current = self.load_dataset()?;
        let revision = current.revision.to_string();

        let url = format!("{}/api/demo/blob/update", self.base_url);
        let mut request = self.http.get(&url).query(&[
            ("appVersion", self.app_version.as_str()),
            ("revision", revision.as_str()),
        ]);
        if let Some(key) = &self.api_key {
            request = request.header("x-api-key", key);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body: Value = response.json().await.unwrap_or_default();
            let message = body
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            return Err(SyncError::Server(format!("{}: {}", status, message)));
        }

        let envelope: UpdateEnvelope = response.json().await?;
        let check = envelope.data;

        if check.is_up_to_date {
            tracing::debug!(revision = current.revision, "Demo dataset is up to date");
            return Ok(SyncOutcome::UpToDate {
                revision: current.revision,
            });
        }

        let mut blob = check.blob.ok_or_else(|| {
            SyncError::Server("stale response is missing the blob payload".to_string())
        })?;
        let revision = blob
            .get("revision")
            .and_then(Value::as_i64)
            .ok_or_else(|| {
                SyncError::Server("update response is missing a revision number".to_string())
            })?;
        if let Some(map) = blob.as_object_mut() {
            map.remove("revision");
        }

        self.write_cache(&CachedDataset {
            revision,
            data: blob,
        })?;

        tracing::info!(revision, "Fetched and cached new demo dataset");
        Ok(SyncOutcome::Updated { revision })
    }

    fn write_cache(&self, dataset: &CachedDataset) -> Result<(), SyncError> {
        if let Some(parent) = self.cache_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.cache_path, serde_json::to_string_pretty(dataset)?)?;
        Ok(())
    }
}

/// Wire envelope around the update check.
#[derive(Debug, Deserialize)]
struct UpdateEnvelope {
    data: UpdateCheck,
}
