use crate::adapters::session::MemorySessionStore;
use std::sync::Arc;
use std::time::Duration;

/// Periodically drops expired entries from the in-memory session store.
#[derive(Debug)]
pub struct SessionCleanupWorker {
    store: Arc<MemorySessionStore>,
    cleanup_interval_secs: u64,
}

impl SessionCleanupWorker {
    #[must_use]
    pub const fn new(store: Arc<MemorySessionStore>, cleanup_interval_secs: u64) -> Self {
        Self { store, cleanup_interval_secs }
    }

    pub async fn run(self, mut shutdown: tokio::sync::watch::Receiver<bool>) {
        if self.cleanup_interval_secs == 0 {
            tracing::info!("Session cleanup is disabled (interval = 0)");
            return;
        }

        let mut interval = tokio::time::interval(Duration::from_secs(self.cleanup_interval_secs));

        while !*shutdown.borrow() {
            tokio::select! {
                _ = interval.tick() => {
                    self.perform_cleanup();
                }
                _ = shutdown.changed() => {}
            }
        }
        tracing::info!("Session cleanup loop shutting down...");
    }

    /// Removes expired sessions and returns how many were dropped.
    #[tracing::instrument(skip(self), fields(expired_deleted = tracing::field::Empty))]
    pub fn perform_cleanup(&self) -> usize {
        let count = self.store.purge_expired();
        if count > 0 {
            tracing::info!(count, remaining = self.store.len(), "Deleted expired sessions");
            tracing::Span::current().record("expired_deleted", count);
        }
        count
    }
}
