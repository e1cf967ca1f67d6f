//! Video assets.

use std::any::Any;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::{fragment_url, single_url};
use crate::asset::{Asset, AssetHandler};
use crate::cache::{CachedContent, UrlSet};

/// Handler for fragments tagged `"Video"`.
#[derive(Debug, Default, Clone, Copy)]
pub struct VideoAssetHandler;

impl VideoAssetHandler {
    /// Type tag this handler registers under.
    pub const TYPE: &str = "Video";
}

/// A video clip whose bytes live in the content cache. Playback reads the
/// file directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoAsset {
    file: PathBuf,
}

impl VideoAsset {
    /// Cached file backing this clip.
    pub fn file(&self) -> &Path {
        &self.file
    }
}

impl Asset for VideoAsset {
    fn type_tag(&self) -> &str {
        VideoAssetHandler::TYPE
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[async_trait]
impl AssetHandler for VideoAssetHandler {
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
        Some(Box::new(VideoAsset { file }))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use url::Url;

    use super::*;

    #[test]
    fn cache_urls_reads_the_url_field() {
        let handler = VideoAssetHandler;

        let doc = json!({ "_type": "Video", "url": "http://cdn.example.com/hero.mp4" });
        let urls = handler.cache_urls(doc.as_object().unwrap()).unwrap();
        assert!(urls.contains(&Url::parse("http://cdn.example.com/hero.mp4").unwrap()));

        let garbage = json!({ "_type": "Video", "url": 9000 });
        assert!(handler.cache_urls(garbage.as_object().unwrap()).is_none());
    }
}
