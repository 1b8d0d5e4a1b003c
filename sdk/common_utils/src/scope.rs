//! Structured concurrency scope handed to delegates by their hosting component.

// std::sync::Mutex is fine here, the lock is never held across an .await point.
use std::sync::{Arc, Mutex, PoisonError};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Cloneable handle on a cancellation domain and the tasks launched inside it.
///
/// Every task started with [`ComponentScope::launch`] stops at its next suspension point once the
/// scope (or any of its ancestors) is cancelled.
#[derive(Clone, Debug, Default)]
pub struct ComponentScope {
    token: CancellationToken,
    handles: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl ComponentScope {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a scope that is cancelled together with `self` but can also be cancelled on its own.
    #[must_use]
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            handles: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn launch<F>(&self, future: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let token = self.token.clone();
        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = future => {}
            }
        });

        let mut guard = self.handles.lock().unwrap_or_else(PoisonError::into_inner);
        guard.retain(|h| !h.is_finished());
        guard.push(handle);
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the scope is cancelled.
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }

    pub fn active_tasks(&self) -> usize {
        let mut guard = self.handles.lock().unwrap_or_else(PoisonError::into_inner);
        guard.retain(|h| !h.is_finished());
        guard.len()
    }

    /// Waits for every task launched so far.
    pub async fn join(&self) {
        let handles: Vec<_> =
            std::mem::take(&mut *self.handles.lock().unwrap_or_else(PoisonError::into_inner));

        for handle in handles {
            if let Err(error) = handle.await {
                tracing::warn!(%error, "scope task panicked");
            }
        }
    }
}
