//! Revision index and blob models for the demo-data sync protocol.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Index record mapping an app version to its current data revision.
///
/// At most one entry exists per distinct `app_version`. The entry is created
/// on the first ingestion for a version and updated in place on every later
/// one; it is never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppVersionEntry {
    pub id: String,
    pub app_version: String,
    pub revision: i64,
    /// Id of the blob currently associated with this app version.
    pub revision_id: String,
}

/// A stored demo dataset snapshot.
///
/// The payload is opaque to the backend; its shape is defined by the mobile
/// app's import format (POIs, users, challenges, notifications, ads, ...).
#[derive(Debug, Clone)]
pub struct BlobRecord {
    pub id: String,
    pub created_at: String,
    pub payload: Value,
}

impl BlobRecord {
    /// Render the record as its wire document: the stored payload with the
    /// assigned `id` and `createdAt` merged in.
    pub fn into_document(self) -> Value {
        let mut doc = self.payload;
        if let Some(map) = doc.as_object_mut() {
            map.insert("id".to_string(), Value::String(self.id));
            map.insert("createdAt".to_string(), Value::String(self.created_at));
        }
        doc
    }

    /// Wire document with the current revision number attached, as returned
    /// by the update check.
    pub fn into_revision_document(self, revision: i64) -> Value {
        let mut doc = self.into_document();
        if let Some(map) = doc.as_object_mut() {
            map.insert("revision".to_string(), Value::from(revision));
        }
        doc
    }
}

/// Result of an update check for a given (appVersion, revision) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCheck {
    pub is_up_to_date: bool,
    /// Present only when the caller is stale; carries the current blob with
    /// its revision number attached.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blob: Option<Value>,
}

/// Request body for ingesting a new blob.
///
/// Required fields are optional here so missing ones surface as validation
/// errors with the documented messages instead of body-rejection noise.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertBlobRequest {
    #[serde(default)]
    pub blob: Option<Value>,
    #[serde(default)]
    pub app_version: Option<String>,
    #[serde(default)]
    pub revision: Option<i64>,
}

/// Full contents of both stores, for audit and debug tooling.
///
/// Index entries are ordered by app version and blobs by insertion time;
/// callers must not rely on any ordering beyond that.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlobHistory {
    pub app_version_matches: Vec<AppVersionEntry>,
    pub blobs: Vec<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_blob_document_merges_identity() {
        let record = BlobRecord {
            id: "b1".to_string(),
            created_at: "2015-08-01T00:00:00Z".to_string(),
            payload: json!({ "pois": [1, 2] }),
        };

        let doc = record.into_document();
        assert_eq!(doc["id"], "b1");
        assert_eq!(doc["createdAt"], "2015-08-01T00:00:00Z");
        assert_eq!(doc["pois"], json!([1, 2]));
    }

    #[test]
    fn test_revision_document_carries_revision() {
        let record = BlobRecord {
            id: "b5".to_string(),
            created_at: "2015-08-01T00:00:00Z".to_string(),
            payload: json!({ "users": [] }),
        };

        let doc = record.into_revision_document(5);
        assert_eq!(doc["revision"], 5);
        assert_eq!(doc["id"], "b5");
    }

    #[test]
    fn test_update_check_omits_blob_when_up_to_date() {
        let check = UpdateCheck {
            is_up_to_date: true,
            blob: None,
        };

        let value = serde_json::to_value(&check).unwrap();
        assert_eq!(value, json!({ "isUpToDate": true }));
    }
}
