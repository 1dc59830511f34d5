use super::{
    Document, DocumentStore, Precondition, StoreError, StoreResult, StoreSnapshot, Subscription,
};
use async_trait::async_trait;
use rand::Rng;
use serde_json::{Map, Value};
use std::collections::HashMap;
use tokio::sync::{broadcast, RwLock};

const ID_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
const ID_LENGTH: usize = 20;
const CHANNEL_CAPACITY: usize = 64;

/// Documents keyed by `collection/id`
fn key(collection: &str, id: &str) -> String {
    format!("{}/{}", collection.trim_end_matches('/'), id)
}

/// In-process document store. Cloning is not supported; share it behind an `Arc`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: RwLock<HashMap<String, Document>>,
    channels: RwLock<HashMap<String, broadcast::Sender<Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a write to its subscribers. Callers hold the `documents` write lock,
    /// so pushes for one document leave in version order.
    async fn publish(&self, key: &str, doc: &Document) {
        let mut channels = self.channels.write().await;
        let abandoned = match channels.get(key) {
            Some(tx) => tx.send(doc.clone()).is_err(),
            None => false,
        };
        if abandoned {
            // Every receiver is gone
            channels.remove(key);
        }
    }

    /// Copy of every stored document
    pub async fn export(&self) -> StoreSnapshot {
        StoreSnapshot::new(self.documents.read().await.clone())
    }

    /// Replace the store contents with a snapshot. Existing subscribers are kept.
    pub async fn import(&self, snapshot: StoreSnapshot) -> StoreResult<usize> {
        snapshot.validate()?;
        let count = snapshot.documents.len();
        *self.documents.write().await = snapshot.documents;
        self.channels
            .write()
            .await
            .retain(|_, tx| tx.receiver_count() > 0);
        tracing::info!("Imported {} documents from snapshot", count);
        Ok(count)
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn new_document_id(&self) -> String {
        let mut rng = rand::rng();
        (0..ID_LENGTH)
            .map(|_| ID_CHARS[rng.random_range(0..ID_CHARS.len())] as char)
            .collect()
    }

    async fn create_document(
        &self,
        collection: &str,
        id: Option<&str>,
        data: Value,
        precondition: Precondition,
    ) -> StoreResult<String> {
        if !data.is_object() {
            return Err(StoreError::InvalidDocument(
                "document data must be a JSON object".to_string(),
            ));
        }
        let id = match id {
            Some(id) => id.to_string(),
            None => self.new_document_id(),
        };
        let key = key(collection, &id);

        let mut documents = self.documents.write().await;
        let current = documents.get(&key).map(|d| d.version).unwrap_or(0);
        precondition.check(current)?;

        let doc = Document {
            id: id.clone(),
            version: current + 1,
            data,
        };
        documents.insert(key.clone(), doc.clone());
        self.publish(&key, &doc).await;
        Ok(id)
    }

    async fn get_document(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        Ok(self.documents.read().await.get(&key(collection, id)).cloned())
    }

    async fn update_document(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
        precondition: Precondition,
    ) -> StoreResult<u64> {
        let key = key(collection, id);

        let mut documents = self.documents.write().await;
        let doc = documents.get_mut(&key).ok_or_else(|| StoreError::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        })?;
        precondition.check(doc.version)?;

        let object = doc.data.as_object_mut().ok_or_else(|| {
            StoreError::InvalidDocument(format!("{} is not a JSON object", key))
        })?;
        object.extend(fields);
        doc.version += 1;
        let doc = doc.clone();

        self.publish(&key, &doc).await;
        Ok(doc.version)
    }

    async fn subscribe(&self, collection: &str, id: &str) -> StoreResult<Subscription> {
        let key = key(collection, id);
        let mut channels = self.channels.write().await;
        channels.retain(|_, tx| tx.receiver_count() > 0);
        let tx = channels
            .entry(key)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0);
        Ok(Subscription::new(tx.subscribe()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    const GAMES: &str = "artifacts/test/public/data/games";

    fn fields(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_generated_ids() {
        let store = MemoryStore::new();
        let a = store.new_document_id();
        let b = store.new_document_id();
        assert_eq!(a.len(), ID_LENGTH);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let store = MemoryStore::new();
        let id = store
            .create_document(
                GAMES,
                Some("ABC123"),
                json!({"status": "lobby"}),
                Precondition::None,
            )
            .await
            .unwrap();
        assert_eq!(id, "ABC123");

        let doc = store.get_document(GAMES, "ABC123").await.unwrap().unwrap();
        assert_eq!(doc.version, 1);
        assert_eq!(doc.data["status"], "lobby");

        assert!(store.get_document(GAMES, "NOPE00").await.unwrap().is_none());
        assert!(store.get_document("other", "ABC123").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_without_id_generates_one() {
        let store = MemoryStore::new();
        let id = store
            .create_document(GAMES, None, json!({}), Precondition::None)
            .await
            .unwrap();
        assert_eq!(id.len(), ID_LENGTH);
        assert!(store.get_document(GAMES, &id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_create_rejects_non_objects() {
        let store = MemoryStore::new();
        let result = store
            .create_document(GAMES, Some("X"), json!([1, 2]), Precondition::None)
            .await;
        assert!(matches!(result, Err(StoreError::InvalidDocument(_))));
    }

    #[tokio::test]
    async fn test_update_merges_top_level_fields() {
        let store = MemoryStore::new();
        store
            .create_document(
                GAMES,
                Some("G"),
                json!({"status": "lobby", "words": []}),
                Precondition::None,
            )
            .await
            .unwrap();

        let version = store
            .update_document(GAMES, "G", fields(json!({"status": "playing"})), Precondition::None)
            .await
            .unwrap();
        assert_eq!(version, 2);

        let doc = store.get_document(GAMES, "G").await.unwrap().unwrap();
        assert_eq!(doc.data, json!({"status": "playing", "words": []}));
    }

    #[tokio::test]
    async fn test_update_missing_document() {
        let store = MemoryStore::new();
        let result = store
            .update_document(GAMES, "missing", Map::new(), Precondition::None)
            .await;
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_stale_version_rejected() {
        let store = MemoryStore::new();
        store
            .create_document(GAMES, Some("G"), json!({"votes": {}}), Precondition::None)
            .await
            .unwrap();

        store
            .update_document(GAMES, "G", fields(json!({"votes": {"a": "b"}})), Precondition::Version(1))
            .await
            .unwrap();

        let result = store
            .update_document(GAMES, "G", fields(json!({"votes": {"c": "d"}})), Precondition::Version(1))
            .await;
        assert!(matches!(
            result,
            Err(StoreError::VersionConflict {
                expected: 1,
                actual: 2
            })
        ));

        let doc = store.get_document(GAMES, "G").await.unwrap().unwrap();
        assert_eq!(doc.data["votes"], json!({"a": "b"}));
    }

    #[tokio::test]
    async fn test_subscription_receives_writes() {
        let store = MemoryStore::new();
        store
            .create_document(GAMES, Some("G"), json!({"n": 0}), Precondition::None)
            .await
            .unwrap();

        let mut sub = store.subscribe(GAMES, "G").await.unwrap();
        store
            .update_document(GAMES, "G", fields(json!({"n": 1})), Precondition::None)
            .await
            .unwrap();

        let doc = sub.recv().await.unwrap();
        assert_eq!(doc.version, 2);
        assert_eq!(doc.data["n"], 1);
    }

    #[tokio::test]
    async fn test_unsubscribe_is_idempotent() {
        let store = MemoryStore::new();
        let mut sub = store.subscribe(GAMES, "G").await.unwrap();
        assert!(sub.is_active());

        sub.unsubscribe();
        sub.unsubscribe();
        assert!(!sub.is_active());
        assert!(sub.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_export_import() {
        let store = MemoryStore::new();
        store
            .create_document(GAMES, Some("G"), json!({"n": 7}), Precondition::None)
            .await
            .unwrap();
        let snapshot = store.export().await;

        let restored = MemoryStore::new();
        assert_eq!(restored.import(snapshot).await.unwrap(), 1);
        let doc = restored.get_document(GAMES, "G").await.unwrap().unwrap();
        assert_eq!(doc.data["n"], 7);
        assert_eq!(doc.version, 1);
    }

    #[tokio::test]
    async fn test_create_if_absent() {
        let store = MemoryStore::new();
        store
            .create_document(GAMES, Some("G"), json!({"owner": "a"}), Precondition::Absent)
            .await
            .unwrap();

        let result = store
            .create_document(GAMES, Some("G"), json!({"owner": "b"}), Precondition::Absent)
            .await;
        assert!(matches!(
            result,
            Err(StoreError::VersionConflict {
                expected: 0,
                actual: 1
            })
        ));

        let doc = store.get_document(GAMES, "G").await.unwrap().unwrap();
        assert_eq!(doc.data["owner"], "a");
        assert_eq!(doc.version, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_writes_push_in_version_order() {
        let store = Arc::new(MemoryStore::new());
        let writers = 16;

        for round in 0..200 {
            let id = format!("G{}", round);
            store
                .create_document(GAMES, Some(&id), json!({"n": 0}), Precondition::None)
                .await
                .unwrap();
            let mut sub = store.subscribe(GAMES, &id).await.unwrap();

            let mut tasks = Vec::new();
            for n in 0..writers {
                let store = store.clone();
                let id = id.clone();
                tasks.push(tokio::spawn(async move {
                    store
                        .update_document(GAMES, &id, fields(json!({"n": n})), Precondition::None)
                        .await
                }));
            }
            for task in tasks {
                task.await.unwrap().unwrap();
            }

            let mut last = 1;
            for _ in 0..writers {
                let doc = sub.recv().await.unwrap();
                assert!(doc.version > last, "push v{} after v{}", doc.version, last);
                last = doc.version;
            }
            let stored = store.get_document(GAMES, &id).await.unwrap().unwrap();
            assert_eq!(last, stored.version);
        }
    }

    #[tokio::test]
    async fn test_dead_channels_are_dropped() {
        let store = MemoryStore::new();
        store
            .create_document(GAMES, Some("G"), json!({"n": 0}), Precondition::None)
            .await
            .unwrap();

        let mut sub = store.subscribe(GAMES, "G").await.unwrap();
        assert_eq!(store.channels.read().await.len(), 1);

        sub.unsubscribe();
        store
            .update_document(GAMES, "G", fields(json!({"n": 1})), Precondition::None)
            .await
            .unwrap();
        assert!(store.channels.read().await.is_empty());

        // Subscribing elsewhere also sweeps channels nobody listens to
        let _other = store.subscribe(GAMES, "H").await.unwrap();
        let mut gone = store.subscribe(GAMES, "G").await.unwrap();
        gone.unsubscribe();
        let _again = store.subscribe(GAMES, "I").await.unwrap();
        let channels = store.channels.read().await;
        assert_eq!(channels.len(), 2);
        assert!(!channels.contains_key(&key(GAMES, "G")));
    }
}
