//! Still image assets.

use std::any::Any;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::{fragment_url, single_url};
use crate::asset::{Asset, AssetHandler};
use crate::cache::{CachedContent, UrlSet};

/// Handler for fragments tagged `"Image"`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageAssetHandler;

impl ImageAssetHandler {
    /// Type tag this handler registers under.
    pub const TYPE: &str = "Image";
}

/// A still image whose bytes live in the content cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAsset {
    file: PathBuf,
}

impl ImageAsset {
    /// Cached file backing this image.
    pub fn file(&self) -> &Path {
        &self.file
    }
}

impl Asset for ImageAsset {
    fn type_tag(&self) -> &str {
        ImageAssetHandler::TYPE
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[async_trait]
impl AssetHandler for ImageAssetHandler {
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
        Some(Box::new(ImageAsset { file }))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use url::Url;

    use super::*;

    struct FixedContent(Option<PathBuf>);

    #[async_trait]
    impl CachedContent for FixedContent {
        async fn cached_file(&self, _url: &Url) -> Option<PathBuf> {
            self.0.clone()
        }
    }

    #[test]
    fn cache_urls_requires_a_parsable_url() {
        let handler = ImageAssetHandler;

        let doc = json!({ "_type": "Image", "url": "http://cdn.example.com/a.png" });
        let urls = handler.cache_urls(doc.as_object().unwrap()).unwrap();
        assert_eq!(urls.len(), 1);
        assert!(urls.contains(&Url::parse("http://cdn.example.com/a.png").unwrap()));

        let missing = json!({ "_type": "Image" });
        assert!(handler.cache_urls(missing.as_object().unwrap()).is_none());

        let garbage = json!({ "_type": "Image", "url": "not a url" });
        assert!(handler.cache_urls(garbage.as_object().unwrap()).is_none());
    }

    #[tokio::test]
    async fn build_asset_resolves_through_the_cache() {
        let handler = ImageAssetHandler;
        let doc = json!({ "_type": "Image", "url": "http://cdn.example.com/a.png" });
        let fragment = doc.as_object().unwrap();

        let cached = FixedContent(Some(PathBuf::from("/cache/0a1b")));
        let asset = handler.build_asset(fragment, &cached).await.unwrap();
        assert_eq!(asset.type_tag(), ImageAssetHandler::TYPE);
        let image = asset.as_any().downcast_ref::<ImageAsset>().unwrap();
        assert_eq!(image.file(), Path::new("/cache/0a1b"));

        let absent = FixedContent(None);
        assert!(handler.build_asset(fragment, &absent).await.is_none());
    }
}
