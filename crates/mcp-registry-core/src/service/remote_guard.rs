//! Duplicate remote endpoint guard
//!
//! Two distinct logical servers may never advertise the same remote URL.
//! Earlier versions of the same server reusing their own endpoint are fine.

use std::sync::Arc;
use tracing::info;

use crate::domain::ServerFilter;
use crate::error::{RegistryError, RegistryResult};
use crate::registry::ServerJson;
use crate::repository::ServerRepository;

/// Records fetched per page while scanning owners of a URL
const SCAN_PAGE_SIZE: usize = 50;

pub struct RemoteUrlGuard {
    repo: Arc<dyn ServerRepository>,
}

impl RemoteUrlGuard {
    pub fn new(repo: Arc<dyn ServerRepository>) -> Self {
        Self { repo }
    }

    /// Reject `server` if any of its remote URLs belongs to another server name.
    pub async fn check(&self, server: &ServerJson) -> RegistryResult<()> {
        for url in server.remote_urls() {
            if let Some(owner) = self.foreign_owner(url, &server.name).await? {
                info!(
                    url = url,
                    name = %server.name,
                    owner = %owner,
                    "[RemoteUrlGuard] Remote URL already claimed"
                );
                return Err(RegistryError::DuplicateRemoteUrl {
                    url: url.to_string(),
                    owner,
                });
            }
        }
        Ok(())
    }

    /// Name of a server other than `name` that advertises `url`, if any.
    async fn foreign_owner(&self, url: &str, name: &str) -> RegistryResult<Option<String>> {
        let filter = ServerFilter::new().with_remote_url(url);
        let mut cursor: Option<String> = None;

        loop {
            let page = self
                .repo
                .list(&filter, cursor.as_deref(), SCAN_PAGE_SIZE)
                .await?;

            if let Some(other) = page.items.iter().find(|r| r.name() != name) {
                return Ok(Some(other.name().to_string()));
            }

            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => return Ok(None),
            }
        }
    }
}
