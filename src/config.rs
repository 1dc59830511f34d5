//! Server configuration from environment variables

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_BIND: &str = "0.0.0.0:8080";
const DEFAULT_APP_ID: &str = "default-imposter-game";
const DEFAULT_MAX_UPDATE_ATTEMPTS: u32 = 8;
const DEFAULT_SNAPSHOT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Namespaces the session collection
    pub app_id: String,
    /// How often a conflicting session update is re-read and retried
    pub max_update_attempts: u32,
    /// Restore from / periodically write to this file (None = no persistence)
    pub snapshot_path: Option<PathBuf>,
    pub snapshot_interval: Duration,
    /// Newline-separated list replacing the curated words
    pub words_file: Option<PathBuf>,
    /// Fixed seed for reproducible draws (None = OS entropy)
    pub rng_seed: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            app_id: DEFAULT_APP_ID.to_string(),
            max_update_attempts: DEFAULT_MAX_UPDATE_ATTEMPTS,
            snapshot_path: None,
            snapshot_interval: Duration::from_secs(DEFAULT_SNAPSHOT_SECS),
            words_file: None,
            rng_seed: None,
        }
    }
}

/// Non-empty trimmed value of an env var
fn env_value(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Parse an env var, falling back to `default` with a warning when it doesn't parse
fn env_parse<T: FromStr>(name: &str, default: T) -> T {
    match env_value(name) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring invalid {}={:?}, using default", name, raw);
            default
        }),
        None => default,
    }
}

impl ServerConfig {
    /// Load config from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let bind_addr = env_parse(
            "IMPOSTER_BIND",
            DEFAULT_BIND.parse().unwrap_or(defaults.bind_addr),
        );

        let app_id = env_value("IMPOSTER_APP_ID").unwrap_or(defaults.app_id);

        let max_update_attempts =
            env_parse("IMPOSTER_MAX_UPDATE_ATTEMPTS", DEFAULT_MAX_UPDATE_ATTEMPTS).max(1);

        let snapshot_path = env_value("IMPOSTER_SNAPSHOT_PATH").map(PathBuf::from);

        let snapshot_interval = Duration::from_secs(
            env_parse("IMPOSTER_SNAPSHOT_SECS", DEFAULT_SNAPSHOT_SECS).max(1),
        );

        let words_file = env_value("IMPOSTER_WORDS_FILE").map(PathBuf::from);

        let rng_seed = env_value("IMPOSTER_RNG_SEED").and_then(|raw| match raw.parse() {
            Ok(seed) => Some(seed),
            Err(_) => {
                tracing::warn!("Ignoring invalid IMPOSTER_RNG_SEED={:?}", raw);
                None
            }
        });

        if rng_seed.is_some() {
            tracing::warn!("IMPOSTER_RNG_SEED is set - role and word draws are reproducible");
        }

        Self {
            bind_addr,
            app_id,
            max_update_attempts,
            snapshot_path,
            snapshot_interval,
            words_file,
            rng_seed,
        }
    }

    /// Collection holding the session documents
    pub fn collection_path(&self) -> String {
        format!("artifacts/{}/public/data/games", self.app_id)
    }

    /// Collection mapping private resume tokens to uids
    pub fn identity_collection_path(&self) -> String {
        format!("artifacts/{}/private/identities", self.app_id)
    }
}
