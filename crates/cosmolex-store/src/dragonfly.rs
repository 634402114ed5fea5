//! `Dragonfly` (Redis-compatible) remote document store.
//!
//! # Key Patterns
//!
//! | Pattern | Type | Description |
//! |---------|------|-------------|
//! | `remote:progress:{install}` | JSON | [`RemoteProgressDocument`] for one install |

use std::future::Future;

use cosmolex_types::{InstallId, RemoteProgressDocument};
use fred::prelude::*;

use crate::error::RemoteError;
use crate::keys::remote_key;
use crate::remote::RemoteDocumentStore;

/// Connection handle to a `Dragonfly` (Redis-compatible) instance.
#[derive(Clone)]
pub struct DragonflyRemoteStore {
    client: Client,
}

impl DragonflyRemoteStore {
    /// Connect to `Dragonfly` at the given URL.
    ///
    /// The URL should follow the Redis URL scheme:
    /// `redis://host:port` or `redis://host:port/db`
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::Config`] if the URL cannot be parsed.
    /// Returns [`RemoteError::Dragonfly`] if the connection fails.
    pub async fn connect(url: &str) -> Result<Self, RemoteError> {
        let config = Config::from_url(url)
            .map_err(|e| RemoteError::Config(format!("Invalid Dragonfly URL: {e}")))?;

        let client = Builder::from_config(config).build()?;
        client.init().await?;

        tracing::info!("Connected to Dragonfly");
        Ok(Self { client })
    }
}

impl RemoteDocumentStore for DragonflyRemoteStore {
    fn fetch(
        &self,
        install: InstallId,
    ) -> impl Future<Output = Result<Option<RemoteProgressDocument>, RemoteError>> + Send {
        let client = self.client.clone();
        async move {
            let value: Option<String> = client.get(remote_key(install)).await?;
            value
                .map(|s| serde_json::from_str(&s))
                .transpose()
                .map_err(RemoteError::from)
        }
    }

    fn push(
        &self,
        install: InstallId,
        document: RemoteProgressDocument,
    ) -> impl Future<Output = Result<(), RemoteError>> + Send {
        let client = self.client.clone();
        async move {
            let json = serde_json::to_string(&document)?;
            let _: () = client
                .set(remote_key(install), json.as_str(), None, None, false)
                .await?;
            tracing::debug!(install = %install, stars = document.total_stars, "Pushed remote document");
            Ok(())
        }
    }
}
