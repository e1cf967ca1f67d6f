//! Typed assets and the handlers that build them.
//!
//! Every object fragment in a card payload may declare an asset type through
//! its `_type` field. A registered [`AssetHandler`] covers one such type: it
//! names the remote content the fragment needs up front and, once that
//! content is local, builds the typed [`Asset`] the presentation layer
//! renders. [`AssetRegistry`] maps type tags to handlers, and
//! [`AssetService`] ties a registry to a content cache.

pub mod handlers;
pub mod registry;
pub mod service;

pub use registry::AssetRegistry;
pub use service::AssetService;

use std::any::Any;
use std::fmt;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::cache::{CachedContent, UrlSet};

/// A typed asset constructed from a payload fragment once its remote content
/// is locally available.
pub trait Asset: fmt::Debug + Send + Sync {
    /// The type tag this asset was built under.
    fn type_tag(&self) -> &str;

    /// Downcasting hook for the presentation layer.
    fn as_any(&self) -> &dyn Any;
}

/// Strategy for one asset type.
///
/// [`cache_urls`](Self::cache_urls) names the remote content a fragment
/// depends on; [`build_asset`](Self::build_asset) is only expected to succeed
/// once each of those URLs has been resolved by the cache.
#[async_trait]
pub trait AssetHandler: Send + Sync {
    /// Returns every URL that must be cached before the fragment's asset can
    /// be built, or `None` when the fragment needs no remote content or is
    /// missing required fields.
    fn cache_urls(&self, fragment: &Map<String, Value>) -> Option<UrlSet>;

    /// Builds the typed asset for `fragment`, resolving files through
    /// `content`. Returns `None` for malformed fragments or when required
    /// content never made it to disk.
    async fn build_asset(
        &self,
        fragment: &Map<String, Value>,
        content: &dyn CachedContent,
    ) -> Option<Box<dyn Asset>>;
}
