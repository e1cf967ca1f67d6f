//! Animated GIF assets.

use std::any::Any;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::{fragment_url, single_url};
use crate::asset::{Asset, AssetHandler};
use crate::cache::{CachedContent, UrlSet};

/// Handler for fragments tagged `"GIF"`.
#[derive(Debug, Default, Clone, Copy)]
pub struct GifAssetHandler;

impl GifAssetHandler {
    /// Type tag this handler registers under.
    pub const TYPE: &str = "GIF";
}

/// An animated GIF whose bytes live in the content cache. Frame decoding is
/// the presentation layer's concern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GifAsset {
    file: PathBuf,
}

impl GifAsset {
    /// Cached file backing this GIF.
    pub fn file(&self) -> &Path {
        &self.file
    }
}

impl Asset for GifAsset {
    fn type_tag(&self) -> &str {
        GifAssetHandler::TYPE
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[async_trait]
impl AssetHandler for GifAssetHandler {
    fn cache_urls(&self, fragment: &Map<String, Value>) -> Option<UrlSet> {
        single_url(fragment)
    }

    async fn build_asset(
        &self,
        fragment: &Map<String, Value>,
        content: &dyn CachedContent,
    ) -> Option<Box<dyn Asset>> {
        let url = fragment_url(fragment)?;
        let file = content.cached_file(&url).await?;
        Some(Box::new(GifAsset { file }))
    }
}
