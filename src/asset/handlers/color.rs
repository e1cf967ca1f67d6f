//! Solid color assets.

use std::any::Any;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::asset::{Asset, AssetHandler};
use crate::cache::{CachedContent, UrlSet};

/// Field carrying the `RRGGBBAA` color string.
pub const RGBA_HEX_KEY: &str = "rgbaHex";

/// Handler for fragments tagged `"Color"`.
///
/// Colors reference no remote content, so the handler contributes no cache
/// URLs and can always build immediately.
#[derive(Debug, Default, Clone, Copy)]
pub struct ColorAssetHandler;

impl ColorAssetHandler {
    /// Type tag this handler registers under.
    pub const TYPE: &str = "Color";
}

/// A solid color decoded from a payload fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorAsset {
    argb: u32,
}

impl ColorAsset {
    /// The color with alpha in the high byte.
    pub fn argb(&self) -> u32 {
        self.argb
    }
}

impl Asset for ColorAsset {
    fn type_tag(&self) -> &str {
        ColorAssetHandler::TYPE
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Decodes an `RRGGBBAA` string, with an optional leading `#`, into an
/// alpha-first color value. Malformed input decodes to transparent black.
pub fn argb_from_rgba_hex(input: &str) -> u32 {
    let digits = input.strip_prefix('#').unwrap_or(input);
    if digits.len() != 8 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return 0;
    }
    // The payload writes alpha last; the stored value carries it first.
    u32::from_str_radix(digits, 16).map_or(0, |rgba| rgba.rotate_right(8))
}

#[async_trait]
impl AssetHandler for ColorAssetHandler {
    fn cache_urls(&self, _fragment: &Map<String, Value>) -> Option<UrlSet> {
        None
    }

    async fn build_asset(
        &self,
        fragment: &Map<String, Value>,
        _content: &dyn CachedContent,
    ) -> Option<Box<dyn Asset>> {
        let raw = fragment.get(RGBA_HEX_KEY).and_then(Value::as_str)?;
        Some(Box::new(ColorAsset {
            argb: argb_from_rgba_hex(raw),
        }))
    }
}
