//! Store export/import for restarting the server without losing running games.

use super::{Document, StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Schema version for snapshot format compatibility
pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

/// Serializable copy of every document. Subscriptions are runtime-only and not included.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub schema_version: u32,
    /// Export timestamp (ISO8601)
    pub exported_at: String,
    /// Documents keyed by `collection/id`
    pub documents: HashMap<String, Document>,
}

impl StoreSnapshot {
    pub fn new(documents: HashMap<String, Document>) -> Self {
        Self {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            exported_at: chrono::Utc::now().to_rfc3339(),
            documents,
        }
    }

    pub fn validate(&self) -> StoreResult<()> {
        if self.schema_version > SNAPSHOT_SCHEMA_VERSION {
            return Err(StoreError::InvalidDocument(format!(
                "Snapshot schema version {} is newer than supported version {}",
                self.schema_version, SNAPSHOT_SCHEMA_VERSION
            )));
        }

        for (key, doc) in &self.documents {
            if !key.ends_with(&format!("/{}", doc.id)) {
                return Err(StoreError::InvalidDocument(format!(
                    "Snapshot key '{}' does not match document id '{}'",
                    key, doc.id
                )));
            }
            if !doc.data.is_object() {
                return Err(StoreError::InvalidDocument(format!(
                    "Snapshot document '{}' is not a JSON object",
                    key
                )));
            }
        }
        Ok(())
    }

    /// Write as pretty JSON, replacing the target atomically via a sibling temp file
    pub fn save(&self, path: &Path) -> StoreResult<()> {
        let json = serde_json::to_vec_pretty(self)?;
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    pub fn load(path: &Path) -> StoreResult<Self> {
        let bytes = std::fs::read(path)?;
        let snapshot: Self = serde_json::from_slice(&bytes)?;
        snapshot.validate()?;
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> StoreSnapshot {
        let mut documents = HashMap::new();
        documents.insert(
            "games/ABC123".to_string(),
            Document {
                id: "ABC123".to_string(),
                version: 4,
                data: json!({"status": "voting"}),
            },
        );
        StoreSnapshot::new(documents)
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        sample().save(&path).unwrap();
        let loaded = StoreSnapshot::load(&path).unwrap();

        assert_eq!(loaded.schema_version, SNAPSHOT_SCHEMA_VERSION);
        let doc = &loaded.documents["games/ABC123"];
        assert_eq!(doc.version, 4);
        assert_eq!(doc.data["status"], "voting");
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_newer_schema_rejected() {
        let mut snapshot = sample();
        snapshot.schema_version = SNAPSHOT_SCHEMA_VERSION + 1;
        let result = snapshot.validate();
        assert!(result.unwrap_err().to_string().contains("newer"));
    }

    #[test]
    fn test_mismatched_key_rejected() {
        let mut snapshot = sample();
        let doc = snapshot.documents.remove("games/ABC123").unwrap();
        snapshot.documents.insert("games/OTHER1".to_string(), doc);
        assert!(snapshot.validate().is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = StoreSnapshot::load(&dir.path().join("absent.json"));
        assert!(matches!(result, Err(StoreError::Io(_))));
    }
}
