//! Built-in asset handlers.
//!
//! Image, GIF, and video fragments carry a single remote `url` and build into
//! file-backed assets. Color fragments are degenerate: they reference no
//! remote content and decode entirely from the payload.

pub mod color;
pub mod gif;
pub mod image;
pub mod video;

pub use color::{ColorAsset, ColorAssetHandler, argb_from_rgba_hex};
pub use gif::{GifAsset, GifAssetHandler};
pub use image::{ImageAsset, ImageAssetHandler};
pub use video::{VideoAsset, VideoAssetHandler};

use serde_json::{Map, Value};
use url::Url;

use crate::cache::UrlSet;

/// Field naming the remote content of URL-backed fragments.
pub const URL_KEY: &str = "url";

fn fragment_url(fragment: &Map<String, Value>) -> Option<Url> {
    let raw = fragment.get(URL_KEY).and_then(Value::as_str)?;
    Url::parse(raw).ok()
}

fn single_url(fragment: &Map<String, Value>) -> Option<UrlSet> {
    fragment_url(fragment).map(|url| UrlSet::from([url]))
}
