//! Maps declared asset types to their handlers.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use super::AssetHandler;
use super::handlers::{ColorAssetHandler, GifAssetHandler, ImageAssetHandler, VideoAssetHandler};

/// Registry of [`AssetHandler`]s keyed by type tag.
///
/// Registration happens while the service is assembled; afterwards the
/// registry is shared immutably, typically behind an [`Arc`], so lookups need
/// no locking.
pub struct AssetRegistry {
    handlers: HashMap<String, Arc<dyn AssetHandler>>,
}

impl AssetRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Creates a registry with the built-in handler set.
    pub fn with_builtin_handlers() -> Self {
        let mut registry = Self::new();
        registry.register(ImageAssetHandler::TYPE, Arc::new(ImageAssetHandler));
        registry.register(GifAssetHandler::TYPE, Arc::new(GifAssetHandler));
        registry.register(ColorAssetHandler::TYPE, Arc::new(ColorAssetHandler));
        registry.register(VideoAssetHandler::TYPE, Arc::new(VideoAssetHandler));
        registry
    }

    /// Registers `handler` under `tag`, replacing any previous registration
    /// for that tag.
    pub fn register(&mut self, tag: impl Into<String>, handler: Arc<dyn AssetHandler>) {
        let tag = tag.into();
        if self.handlers.insert(tag.clone(), handler).is_some() {
            debug!(%tag, "replaced asset handler");
        }
    }

    /// Looks up the handler registered under `tag`.
    pub fn handler(&self, tag: &str) -> Option<Arc<dyn AssetHandler>> {
        self.handlers.get(tag).cloned()
    }

    /// Registered type tags in sorted order.
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }
}

impl Default for AssetRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AssetRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetRegistry")
            .field("tags", &self.tags())
            .finish()
    }
}
