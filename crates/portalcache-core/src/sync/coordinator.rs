use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::api::RemoteClient;
use crate::cache::LocalStore;
use crate::error::PortalError;

use super::race::{first_then_authoritative, Outcome, Update};
use super::resource::Resource;

/// Decides between the local store and the server for every portal read.
///
/// Plain reads are strictly cache-first: a cached value is returned as is,
/// however old. Forced reads always go to the server and replace the cached
/// rows of the resource in one transaction. Racing reads do both at once.
#[derive(Clone)]
pub struct SyncCoordinator {
    remote: Arc<dyn RemoteClient>,
    store: Arc<dyn LocalStore>,
}

impl SyncCoordinator {
    pub fn new(remote: Arc<dyn RemoteClient>, store: Arc<dyn LocalStore>) -> Self {
        Self { remote, store }
    }

    pub fn store(&self) -> &Arc<dyn LocalStore> {
        &self.store
    }

    pub fn remote(&self) -> &Arc<dyn RemoteClient> {
        &self.remote
    }

    /// Cached value of `resource`. Read and mapping errors count as a miss.
    pub async fn read_cached<R: Resource>(&self, resource: &R) -> Option<R::Output> {
        let scope = resource.scope();
        let tables = match self.store.read_many(&scope, resource.kinds()).await {
            Ok(tables) => tables,
            Err(e) => {
                warn!(%scope, error = %e, "Cache read failed, treating as empty");
                return None;
            }
        };

        match resource.from_tables(tables) {
            Ok(Some(value)) => {
                debug!(%scope, "Cache hit");
                Some(value)
            }
            Ok(None) => {
                debug!(%scope, "Cache miss");
                None
            }
            Err(e) => {
                warn!(%scope, error = %e, "Cached rows unreadable, treating as empty");
                None
            }
        }
    }

    /// Fetch from the server and replace the cached rows.
    ///
    /// A failed fetch leaves the cache untouched. A failed write is logged
    /// and the fresh value is still returned.
    pub async fn refresh<R: Resource>(&self, resource: &R) -> Result<R::Output, PortalError> {
        let scope = resource.scope();
        let value = resource.download(self.remote.as_ref()).await?;

        match resource.to_tables(&value) {
            Ok(tables) => {
                if let Err(e) = self.store.replace_many(&scope, tables).await {
                    warn!(%scope, error = %e, "Failed to write cache");
                } else {
                    info!(%scope, "Cache refreshed");
                }
            }
            Err(e) => warn!(%scope, error = %e, "Failed to convert fresh data for the cache"),
        }

        Ok(value)
    }

    /// Cache-first read; `force_reload` skips the cache
    pub async fn fetch<R: Resource>(&self, resource: &R, force_reload: bool) -> Result<R::Output, PortalError> {
        if !force_reload {
            if let Some(value) = self.read_cached(resource).await {
                return Ok(value);
            }
        }
        self.refresh(resource).await
    }

    /// Read the cache and the server concurrently, publishing the cached value
    /// as provisional and the server's as final.
    pub async fn fetch_racing<R: Resource>(
        &self,
        resource: &R,
        updates: &mpsc::Sender<Update<R::Output>>,
    ) -> Result<Outcome<R::Output, PortalError>, PortalError> {
        let outcome =
            first_then_authoritative(self.read_cached(resource), self.refresh(resource), updates).await?;

        match &outcome {
            Outcome::Stale { error, .. } => {
                warn!(scope = %resource.scope(), error = %error, "Refresh failed, keeping cached value")
            }
            Outcome::Cancelled => debug!(scope = %resource.scope(), "Racing read cancelled"),
            Outcome::Fresh(_) => {}
        }
        Ok(outcome)
    }
}
