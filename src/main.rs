use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use imposter::{
    api, auth::AdminAuth, broadcast, config::ServerConfig, state::AppState, store::MemoryStore,
    store::StoreSnapshot, words::WordBank,
};

#[tokio::main]
async fn main() {
    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if .env doesn't exist, only log if it's a different issue
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "imposter=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Imposter...");

    let config = ServerConfig::from_env();
    let admin = Arc::new(AdminAuth::from_env());
    if !admin.is_enabled() {
        tracing::info!("Admin credentials not set, /api/state/export is disabled");
    }

    let words = match &config.words_file {
        Some(path) => match WordBank::from_file(path) {
            Ok(bank) => {
                tracing::info!("Loaded {} words from {:?}", bank.len(), path);
                bank
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to load words from {:?}: {}. Using the curated list.",
                    path,
                    e
                );
                WordBank::curated()
            }
        },
        None => WordBank::curated(),
    };

    let store = Arc::new(MemoryStore::new());
    if let Some(path) = &config.snapshot_path {
        if path.exists() {
            match StoreSnapshot::load(path) {
                Ok(snapshot) => {
                    if let Err(e) = store.import(snapshot).await {
                        tracing::error!("Failed to import snapshot {:?}: {}", path, e);
                    }
                }
                Err(e) => tracing::error!("Failed to read snapshot {:?}: {}", path, e),
            }
        }
    }

    let state = Arc::new(AppState::with_memory_store(store, &config, words));

    if let Some(path) = config.snapshot_path.clone() {
        tracing::info!(
            "Writing snapshots to {:?} every {:?}",
            path,
            config.snapshot_interval
        );
        broadcast::spawn_snapshot_writer(state.clone(), path, config.snapshot_interval);
    }

    let app = api::router(state, admin);

    tracing::info!("Listening on http://{}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .unwrap();
    axum::serve(listener, app).await.unwrap();
}
