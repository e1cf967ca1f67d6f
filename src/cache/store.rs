use std::{
    fmt,
    path::{Path, PathBuf},
};

use tracing::warn;

use crate::cache::key::ContentKey;
use crate::error::Result;

/// Root directory of the content store.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct CacheRoot(PathBuf);

impl CacheRoot {
    pub fn new(path: PathBuf) -> Self {
        Self(path)
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }
}

impl fmt::Debug for CacheRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CacheRoot").field(&self.0).finish()
    }
}

/// File-per-key blob store under a single flat directory.
///
/// Writes happen in the fetch worker (tmp + rename); this type covers the
/// path derivation, lookup, removal, and listing shared by the
/// coordinator. No sharding and no metadata companions: the filename is
/// the key, the bytes are the value.
#[derive(Clone, Debug)]
pub struct ContentStore {
    root: CacheRoot,
}

impl ContentStore {
    /// Open the store, creating the root directory if needed.
    pub fn open(root: CacheRoot) -> Result<Self> {
        std::fs::create_dir_all(root.as_path())?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &CacheRoot {
        &self.root
    }

    pub fn path_for(&self, key: &ContentKey) -> PathBuf {
        self.root.as_path().join(key.as_str())
    }

    pub async fn exists(&self, key: &ContentKey) -> bool {
        tokio::fs::try_exists(self.path_for(key))
            .await
            .unwrap_or(false)
    }

    /// Delete a blob. Failures are logged and swallowed: a leftover file
    /// is harmless and the next fetch of the same key overwrites it.
    pub async fn remove(&self, key: &ContentKey) {
        let path = self.path_for(key);
        if let Err(err) = tokio::fs::remove_file(&path).await
            && err.kind() != std::io::ErrorKind::NotFound
        {
            warn!(key = %key, error = %err, "failed to remove cached content");
        }
    }

    /// Scan the root once and report every well-formed key present.
    ///
    /// Non-key filenames (in-progress temp files, foreign artifacts) are
    /// skipped. Sync on purpose: this runs once while the coordinator is
    /// being constructed, never on a request path.
    pub fn list_keys(&self) -> Result<Vec<ContentKey>> {
        let mut keys = Vec::new();
        for entry in std::fs::read_dir(self.root.as_path())? {
            let entry = entry?;
            if let Some(key) = entry
                .file_name()
                .to_str()
                .and_then(ContentKey::from_file_name)
            {
                keys.push(key);
            }
        }
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn key_for(url: &str) -> ContentKey {
        ContentKey::for_url(&Url::parse(url).unwrap())
    }

    #[test]
    fn open_creates_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("content");
        let store = ContentStore::open(CacheRoot::new(root.clone())).unwrap();
        assert!(root.is_dir());
        assert_eq!(store.root().as_path(), root);
    }

    #[test]
    fn path_for_is_flat() {
        let dir = tempfile::tempdir().unwrap();
        let store =
            ContentStore::open(CacheRoot::new(dir.path().to_path_buf())).unwrap();
        let key = key_for("https://cdn.example.com/hero.png");
        assert_eq!(store.path_for(&key), dir.path().join(key.as_str()));
    }

    #[test]
    fn list_keys_skips_temp_and_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        let store =
            ContentStore::open(CacheRoot::new(dir.path().to_path_buf())).unwrap();
        let key = key_for("https://cdn.example.com/hero.png");

        std::fs::write(store.path_for(&key), b"blob").unwrap();
        std::fs::write(
            dir.path().join(format!("{key}.tmp-74ad81f2")),
            b"partial",
        )
        .unwrap();
        std::fs::write(dir.path().join(".DS_Store"), b"").unwrap();

        let listed = store.list_keys().unwrap();
        assert_eq!(listed, vec![key]);
    }

    #[tokio::test]
    async fn exists_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store =
            ContentStore::open(CacheRoot::new(dir.path().to_path_buf())).unwrap();
        let key = key_for("https://cdn.example.com/hero.png");

        assert!(!store.exists(&key).await);
        std::fs::write(store.path_for(&key), b"blob").unwrap();
        assert!(store.exists(&key).await);

        store.remove(&key).await;
        assert!(!store.exists(&key).await);

        // Removing an absent key is a quiet no-op.
        store.remove(&key).await;
    }
}
