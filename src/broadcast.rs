use crate::state::AppState;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Spawn a background task that periodically writes the store snapshot to `path`
pub fn spawn_snapshot_writer(
    state: Arc<AppState>,
    path: PathBuf,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut last_written: Option<usize> = None;

        loop {
            tokio::time::sleep(interval).await;

            let snapshot = match state.export().await {
                Some(s) => s,
                None => {
                    tracing::warn!("Store does not support snapshots, stopping writer");
                    return;
                }
            };

            // Skip the write when nothing is stored and nothing was before
            let count = snapshot.documents.len();
            if count == 0 && last_written.is_none() {
                continue;
            }

            let target = path.clone();
            let result =
                tokio::task::spawn_blocking(move || snapshot.save(&target)).await;
            match result {
                Ok(Ok(())) => {
                    tracing::debug!("Wrote snapshot of {} documents to {:?}", count, path);
                    last_written = Some(count);
                }
                Ok(Err(e)) => tracing::error!("Failed to write snapshot: {}", e),
                Err(e) => tracing::error!("Snapshot task panicked: {}", e),
            }
        }
    })
}
