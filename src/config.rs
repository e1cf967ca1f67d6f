//! Host-facing configuration for the content cache.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Default directory name used when the host does not pick one.
pub const DEFAULT_CACHE_DIR_NAME: &str = "card-content";

/// Where cached card content lives on disk.
///
/// Hosts typically embed this in their own configuration file; it only
/// carries the cache root because the layout below it (one file per
/// content key) is fixed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Directory holding one file per cached URL.
    #[serde(default = "default_cache_root")]
    pub root: PathBuf,
}

fn default_cache_root() -> PathBuf {
    PathBuf::from(DEFAULT_CACHE_DIR_NAME)
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            root: default_cache_root(),
        }
    }
}

impl CacheConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn cache_root(&self) -> &Path {
        &self.root
    }

    pub fn ensure_directories(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root)?;
        Ok(())
    }

    /// Canonicalize the root so stored file paths stay stable across
    /// working-directory changes. Requires the directory to exist.
    pub fn normalize_paths(&mut self) -> Result<()> {
        self.root = std::fs::canonicalize(&self.root)?;
        Ok(())
    }
}
