//! Remote backup document stores.
//!
//! The remote copy is a single [`RemoteProgressDocument`] per install,
//! written last-write-wins. Every call may fail; callers treat a failure as
//! "offline" and carry on with local state.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use cosmolex_types::{InstallId, RemoteProgressDocument};

use crate::dragonfly::DragonflyRemoteStore;
use crate::error::RemoteError;

/// Asynchronous access to the remote backup document.
pub trait RemoteDocumentStore: Send + Sync + 'static {
    /// Fetch the document for `install`, or `None` if none was ever pushed.
    fn fetch(
        &self,
        install: InstallId,
    ) -> impl Future<Output = Result<Option<RemoteProgressDocument>, RemoteError>> + Send;

    /// Replace the document for `install`.
    fn push(
        &self,
        install: InstallId,
        document: RemoteProgressDocument,
    ) -> impl Future<Output = Result<(), RemoteError>> + Send;
}

// ---------------------------------------------------------------------------
// MemoryRemoteStore
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct MemoryRemoteInner {
    documents: Mutex<BTreeMap<InstallId, RemoteProgressDocument>>,
    unavailable: AtomicBool,
    fetches: AtomicU64,
    pushes: AtomicU64,
}

/// In-process remote store.
///
/// Clones share the same documents. Simulates connectivity loss and slow
/// networks in tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryRemoteStore {
    inner: Arc<MemoryRemoteInner>,
    latency: Option<Duration>,
}

impl MemoryRemoteStore {
    /// Create an empty, available store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every call by `latency`.
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Store `document` for `install` directly.
    pub fn seed(&self, install: InstallId, document: RemoteProgressDocument) {
        self.inner
            .documents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(install, document);
    }

    /// Current document for `install`.
    pub fn document(&self, install: InstallId) -> Option<RemoteProgressDocument> {
        self.inner
            .documents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&install)
            .cloned()
    }

    /// Simulate connectivity (`true`) or an outage (`false`).
    pub fn set_available(&self, available: bool) {
        self.inner.unavailable.store(!available, Ordering::SeqCst);
    }

    /// Number of fetch calls received.
    pub fn fetch_count(&self) -> u64 {
        self.inner.fetches.load(Ordering::SeqCst)
    }

    /// Number of push calls received.
    pub fn push_count(&self) -> u64 {
        self.inner.pushes.load(Ordering::SeqCst)
    }

    async fn delay(&self) -> Result<(), RemoteError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.inner.unavailable.load(Ordering::SeqCst) {
            return Err(RemoteError::Unavailable("memory remote is offline".to_owned()));
        }
        Ok(())
    }
}

impl RemoteDocumentStore for MemoryRemoteStore {
    fn fetch(
        &self,
        install: InstallId,
    ) -> impl Future<Output = Result<Option<RemoteProgressDocument>, RemoteError>> + Send {
        let this = self.clone();
        async move {
            this.inner.fetches.fetch_add(1, Ordering::SeqCst);
            this.delay().await?;
            Ok(this.document(install))
        }
    }

    fn push(
        &self,
        install: InstallId,
        document: RemoteProgressDocument,
    ) -> impl Future<Output = Result<(), RemoteError>> + Send {
        let this = self.clone();
        async move {
            this.inner.pushes.fetch_add(1, Ordering::SeqCst);
            this.delay().await?;
            this.seed(install, document);
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// RemoteBackend
// ---------------------------------------------------------------------------

/// How long one connection attempt may take before the call fails.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

/// A `Dragonfly` connection opened on first use.
///
/// A failed connect is reported as [`RemoteError::Unavailable`] and
/// re-attempted by the next call. A call that fails on an open connection
/// drops it, so the following call reconnects.
#[derive(Clone)]
pub struct LazyDragonfly {
    url: Arc<str>,
    slot: Arc<tokio::sync::Mutex<Option<DragonflyRemoteStore>>>,
}

impl LazyDragonfly {
    /// A backend for `url` with no connection yet.
    pub fn new(url: &str) -> Self {
        Self {
            url: Arc::from(url),
            slot: Arc::new(tokio::sync::Mutex::new(None)),
        }
    }

    /// Whether a connection is currently open.
    pub async fn is_connected(&self) -> bool {
        self.slot.lock().await.is_some()
    }

    /// The open connection, connecting first if there is none.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::Config`] for an unparseable URL and
    /// [`RemoteError::Unavailable`] when the server cannot be reached.
    pub async fn connection(&self) -> Result<DragonflyRemoteStore, RemoteError> {
        let mut slot = self.slot.lock().await;
        if let Some(store) = slot.as_ref() {
            return Ok(store.clone());
        }
        let store =
            match tokio::time::timeout(CONNECT_TIMEOUT, DragonflyRemoteStore::connect(&self.url))
                .await
            {
                Ok(Ok(store)) => store,
                Ok(Err(e @ RemoteError::Config(_))) => return Err(e),
                Ok(Err(e)) => {
                    return Err(RemoteError::Unavailable(format!(
                        "cannot connect to Dragonfly: {e}"
                    )));
                }
                Err(elapsed) => {
                    return Err(RemoteError::Unavailable(format!(
                        "Dragonfly connect timed out: {elapsed}"
                    )));
                }
            };
        *slot = Some(store.clone());
        Ok(store)
    }

    /// Drop the connection after a failed call on it.
    async fn forget_on_error<T>(&self, result: Result<T, RemoteError>) -> Result<T, RemoteError> {
        if let Err(RemoteError::Dragonfly(e)) = &result {
            tracing::warn!(error = %e, "Dragonfly call failed, reconnecting on next use");
            *self.slot.lock().await = None;
        }
        result
    }
}

/// The remote backend chosen from configuration.
#[derive(Clone)]
pub enum RemoteBackend {
    /// `Dragonfly` at the configured URL.
    Dragonfly(LazyDragonfly),
    /// No remote configured. Every call fails with
    /// [`RemoteError::NotConfigured`], so sync status reports it.
    Offline,
}

impl RemoteBackend {
    /// `Dragonfly` when a URL is given, otherwise [`Self::Offline`].
    pub fn from_url(url: Option<&str>) -> Self {
        url.map_or(Self::Offline, |url| Self::Dragonfly(LazyDragonfly::new(url)))
    }
}

impl core::fmt::Debug for RemoteBackend {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Dragonfly(_) => f.write_str("RemoteBackend::Dragonfly"),
            Self::Offline => f.write_str("RemoteBackend::Offline"),
        }
    }
}

impl RemoteDocumentStore for RemoteBackend {
    fn fetch(
        &self,
        install: InstallId,
    ) -> impl Future<Output = Result<Option<RemoteProgressDocument>, RemoteError>> + Send {
        let this = self.clone();
        async move {
            match this {
                Self::Dragonfly(lazy) => {
                    let store = lazy.connection().await?;
                    lazy.forget_on_error(store.fetch(install).await).await
                }
                Self::Offline => Err(RemoteError::NotConfigured),
            }
        }
    }

    fn push(
        &self,
        install: InstallId,
        document: RemoteProgressDocument,
    ) -> impl Future<Output = Result<(), RemoteError>> + Send {
        let this = self.clone();
        async move {
            match this {
                Self::Dragonfly(lazy) => {
                    let store = lazy.connection().await?;
                    lazy.forget_on_error(store.push(install, document).await).await
                }
                Self::Offline => Err(RemoteError::NotConfigured),
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::Utc;
    use cosmolex_types::PlanetKey;

    use super::*;

    fn document(stars: u32) -> RemoteProgressDocument {
        RemoteProgressDocument {
            total_stars: stars,
            unlocked_planets: BTreeSet::from([PlanetKey::from("coloria_prime")]),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn push_then_fetch() {
        let remote = MemoryRemoteStore::new();
        let install = InstallId::new();
        assert!(remote.fetch(install).await.unwrap().is_none());
        remote.push(install, document(12)).await.unwrap();
        let fetched = remote.fetch(install).await.unwrap().unwrap();
        assert_eq!(fetched.total_stars, 12);
        assert_eq!(remote.fetch_count(), 2);
        assert_eq!(remote.push_count(), 1);
    }

    #[tokio::test]
    async fn outage_fails_calls() {
        let remote = MemoryRemoteStore::new();
        let install = InstallId::new();
        remote.set_available(false);
        assert!(matches!(
            remote.push(install, document(1)).await,
            Err(RemoteError::Unavailable(_))
        ));
        assert!(remote.document(install).is_none());
        remote.set_available(true);
        remote.push(install, document(1)).await.unwrap();
        assert!(remote.document(install).is_some());
    }

    #[tokio::test]
    async fn unconfigured_backend_always_fails() {
        let backend = RemoteBackend::from_url(None);
        let install = InstallId::new();
        assert!(matches!(
            backend.push(install, document(7)).await,
            Err(RemoteError::NotConfigured)
        ));
        assert!(matches!(
            backend.fetch(install).await,
            Err(RemoteError::NotConfigured)
        ));
    }

    #[tokio::test]
    async fn unreachable_dragonfly_is_unavailable_and_retried() {
        let lazy = LazyDragonfly::new("redis://127.0.0.1:1");
        let backend = RemoteBackend::Dragonfly(lazy.clone());
        let install = InstallId::new();
        for _ in 0..2 {
            assert!(matches!(
                backend.fetch(install).await,
                Err(RemoteError::Unavailable(_))
            ));
            assert!(!lazy.is_connected().await);
        }
    }

    #[tokio::test]
    async fn malformed_dragonfly_url_is_a_config_error() {
        let backend = RemoteBackend::from_url(Some("not a url"));
        assert!(matches!(
            backend.fetch(InstallId::new()).await,
            Err(RemoteError::Config(_))
        ));
    }
}
