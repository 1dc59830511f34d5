mod identity;
mod session;

use crate::config::ServerConfig;
use crate::game::{GameError, GameResult};
use crate::store::{
    Document, DocumentStore, MemoryStore, Precondition, StoreError, StoreSnapshot, Subscription,
};
use crate::types::*;
use crate::words::WordBank;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::{Map, Value};
use std::sync::{Arc, Mutex, PoisonError};

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Game(#[from] GameError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Session document is corrupt: {0}")]
    Corrupt(#[source] serde_json::Error),

    #[error("Session {code} is too busy, gave up after {attempts} attempts")]
    Contention { code: SessionCode, attempts: u32 },
}

impl ServiceError {
    /// Stable code for clients
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::Game(e) => e.code(),
            ServiceError::Store(_) => "STORE_ERROR",
            ServiceError::Corrupt(_) => "CORRUPT_SESSION",
            ServiceError::Contention { .. } => "CONTENTION",
        }
    }
}

/// Shared application state: runs engine transitions against the session store
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    /// Set when the store is the in-process one, for snapshot export
    memory: Option<Arc<MemoryStore>>,
    collection: String,
    identities: String,
    words: WordBank,
    rng: Mutex<StdRng>,
    max_update_attempts: u32,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, config: &ServerConfig, words: WordBank) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Self {
            store,
            memory: None,
            collection: config.collection_path(),
            identities: config.identity_collection_path(),
            words,
            rng: Mutex::new(rng),
            max_update_attempts: config.max_update_attempts.max(1),
        }
    }

    /// State over an in-process store, which also enables snapshot export
    pub fn with_memory_store(store: Arc<MemoryStore>, config: &ServerConfig, words: WordBank) -> Self {
        let mut state = Self::new(store.clone(), config, words);
        state.memory = Some(store);
        state
    }

    /// Fresh in-memory state with default config and the curated words
    pub fn in_memory() -> Self {
        Self::with_memory_store(
            Arc::new(MemoryStore::new()),
            &ServerConfig::default(),
            WordBank::curated(),
        )
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn words(&self) -> &WordBank {
        &self.words
    }

    /// Snapshot of the in-process store, if that is what backs this state
    pub async fn export(&self) -> Option<StoreSnapshot> {
        match &self.memory {
            Some(memory) => Some(memory.export().await),
            None => None,
        }
    }

    /// Read a session by its code. Typed codes are trimmed and uppercased.
    pub async fn get_session(&self, code: &str) -> ServiceResult<VersionedSession> {
        let code = crate::game::normalize_code(code);
        let doc = self
            .store
            .get_document(&self.collection, &code)
            .await?
            .ok_or_else(|| GameError::NotFound(code.clone()))?;
        decode(&doc)
    }

    /// Change feed of a session document
    pub async fn subscribe(&self, code: &str) -> ServiceResult<Subscription> {
        let code = crate::game::normalize_code(code);
        Ok(self.store.subscribe(&self.collection, &code).await?)
    }

    /// Read-transition-write with optimistic concurrency.
    ///
    /// The transition runs against the latest snapshot and is written only if
    /// the document is still at the version it was read at. On conflict the
    /// session is re-read and the transition re-applied, so concurrent appends
    /// to `words`/`votes` are never lost and a phase change happens once.
    pub(crate) async fn update_session<F>(
        &self,
        code: &str,
        transition: F,
    ) -> ServiceResult<VersionedSession>
    where
        F: Fn(&Session, &WordBank, &mut StdRng) -> GameResult<Session>,
    {
        let code = crate::game::normalize_code(code);

        for attempt in 1..=self.max_update_attempts {
            let current = self.get_session(&code).await?;

            let next = {
                let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
                transition(&current.session, &self.words, &mut *rng)?
            };

            if next == current.session {
                return Ok(current);
            }

            let fields = changed_fields(&current.session, &next)?;
            match self
                .store
                .update_document(
                    &self.collection,
                    &code,
                    fields,
                    Precondition::Version(current.version),
                )
                .await
            {
                Ok(version) => {
                    if current.session.status != next.status {
                        tracing::info!(
                            "Session {} moved {:?} -> {:?}",
                            code,
                            current.session.status,
                            next.status
                        );
                    }
                    return Ok(VersionedSession {
                        version,
                        session: next,
                    });
                }
                Err(StoreError::VersionConflict { expected, actual }) => {
                    tracing::debug!(
                        "Session {} changed underneath us (v{} -> v{}), attempt {}",
                        code,
                        expected,
                        actual,
                        attempt
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }

        tracing::warn!(
            "Giving up on session {} after {} conflicting attempts",
            code,
            self.max_update_attempts
        );
        Err(ServiceError::Contention {
            code,
            attempts: self.max_update_attempts,
        })
    }
}

/// Parse a stored document into a session
pub fn decode(doc: &Document) -> ServiceResult<VersionedSession> {
    let session = serde_json::from_value(doc.data.clone()).map_err(ServiceError::Corrupt)?;
    Ok(VersionedSession {
        version: doc.version,
        session,
    })
}

fn to_object(session: &Session) -> ServiceResult<Map<String, Value>> {
    match serde_json::to_value(session).map_err(ServiceError::Corrupt)? {
        Value::Object(map) => Ok(map),
        _ => Err(StoreError::InvalidDocument("session is not a JSON object".to_string()).into()),
    }
}

/// Top-level fields whose value differs between the two sessions
fn changed_fields(before: &Session, after: &Session) -> ServiceResult<Map<String, Value>> {
    let before = to_object(before)?;
    Ok(to_object(after)?
        .into_iter()
        .filter(|(key, value)| before.get(key) != Some(value))
        .collect())
}
