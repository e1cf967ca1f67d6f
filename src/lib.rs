//! # Cardstock
//!
//! Content caching for push cards: small declarative UI payloads delivered
//! alongside push notifications. Before a card can render, every remote
//! image, GIF, and video it references must be on disk; this crate discovers
//! those references, downloads each one exactly once, and reports readiness
//! to the caller.
//!
//! ## Overview
//!
//! - **Payload walking**: finds every typed fragment in an arbitrarily
//!   nested card document
//! - **Asset handlers**: pluggable per-type strategies for URL discovery and
//!   typed asset construction
//! - **Content cache**: digest-addressed flat directory of downloaded files,
//!   deduplicating fetches per key across overlapping requests
//! - **Fetch worker**: a single background task that downloads one URL at a
//!   time and treats failures as terminal
//! - **Version gating**: refuses card documents newer than the supported
//!   schema revision
//!
//! ## Architecture
//!
//! - [`payload`]: JSON envelope parsing, fragment traversal, version checks
//! - [`asset`]: the [`Asset`] and [`AssetHandler`] seams, built-in handlers,
//!   and the [`AssetService`] front door
//! - [`cache`]: the [`ContentCache`] coordinator, disk store, and fetch
//!   worker
//! - [`config`]: cache directory configuration
//! - [`error`]: the crate-wide error type
//!
//! ## Examples
//!
//! ```no_run
//! use cardstock::{AssetService, CacheConfig};
//! use serde_json::json;
//!
//! async fn warm_card() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = CacheConfig::new("/tmp/card-content");
//!     let service = AssetService::open(&config)?;
//!
//!     let card = json!({
//!         "version": "1.0",
//!         "hero": { "_type": "Image", "url": "https://cdn.example.com/hero.png" },
//!         "background": { "_type": "Color", "rgbaHex": "#336699FF" },
//!     });
//!
//!     let report = service.cache_payload(&card).ready().await?;
//!     if let Some(hero) = card["hero"].as_object()
//!         && report.fully_cached()
//!     {
//!         let asset = service.build_asset(hero).await;
//!         println!("hero ready: {}", asset.is_some());
//!     }
//!
//!     service.stop().await;
//!     Ok(())
//! }
//! ```

/// Typed assets, their handlers, and the asset service
pub mod asset;

/// Content-addressed disk cache and fetch coordination
pub mod cache;

/// Cache directory configuration
pub mod config;

/// Error types shared across the crate
pub mod error;

/// Payload parsing, traversal, and version gating
pub mod payload;

pub use asset::{Asset, AssetHandler, AssetRegistry, AssetService};
pub use cache::{
    CacheReport, CacheTicket, CachedContent, ContentCache, ContentKey, ContentTransport,
    HttpTransport, UrlSet,
};
pub use config::CacheConfig;
pub use error::{CardError, Result};
pub use payload::{MAX_SUPPORTED_VERSION, PayloadVersion, ensure_supported, walk_fragments};
