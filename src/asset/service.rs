//! Ties the handler registry to the content cache.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::debug;

use super::{Asset, AssetRegistry};
use crate::cache::{CacheTicket, ContentCache, UrlSet};
use crate::config::CacheConfig;
use crate::error::Result;
use crate::payload::{fragment_type, walk_fragments};

/// Front door for payload caching and asset construction.
///
/// The service walks a payload with the registry to discover every URL it
/// needs, hands the set to the content cache, and later builds typed assets
/// for individual fragments out of the cached files.
#[derive(Debug)]
pub struct AssetService {
    registry: Arc<AssetRegistry>,
    cache: ContentCache,
}

impl AssetService {
    /// Creates a service from an assembled registry and cache.
    pub fn new(registry: Arc<AssetRegistry>, cache: ContentCache) -> Self {
        Self { registry, cache }
    }

    /// Opens a service with the built-in handlers and an HTTP transport,
    /// rooted at `config`'s cache directory.
    ///
    /// Must be called within a Tokio runtime.
    pub fn open(config: &CacheConfig) -> Result<Self> {
        Ok(Self::new(
            Arc::new(AssetRegistry::with_builtin_handlers()),
            ContentCache::open(config)?,
        ))
    }

    /// Every URL the payload's recognized fragments need cached.
    ///
    /// Fragments without a type tag, with an unregistered tag, or missing
    /// their required fields contribute nothing.
    pub fn discover_urls(&self, payload: &Value) -> UrlSet {
        let mut urls = UrlSet::new();
        walk_fragments(payload, &mut |fragment| {
            if let Some(tag) = fragment_type(fragment)
                && let Some(handler) = self.registry.handler(tag)
                && let Some(found) = handler.cache_urls(fragment)
            {
                urls.extend(found);
            }
        });
        urls
    }

    /// Schedules every URL the payload needs and returns the ticket that
    /// resolves once all of them are terminal.
    pub fn cache_payload(&self, payload: &Value) -> CacheTicket {
        self.cache.cache(self.discover_urls(payload))
    }

    /// Builds the typed asset for one fragment.
    ///
    /// Returns `None` when the fragment is untyped, its type has no handler,
    /// or its content never made it to disk.
    pub async fn build_asset(&self, fragment: &Map<String, Value>) -> Option<Box<dyn Asset>> {
        let tag = fragment_type(fragment)?;
        let Some(handler) = self.registry.handler(tag) else {
            debug!(%tag, "no handler registered for asset type");
            return None;
        };
        handler.build_asset(fragment, &self.cache).await
    }

    /// Drops every URL the payload references from the cache.
    pub async fn clear_payload(&self, payload: &Value) {
        let urls = self.discover_urls(payload);
        self.cache.clear(&urls).await;
    }

    /// Stops the underlying cache. See [`ContentCache::stop`].
    pub async fn stop(&self) {
        self.cache.stop().await;
    }
}
