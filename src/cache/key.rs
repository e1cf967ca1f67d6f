use std::fmt;

use sha2::{Digest, Sha256};
use url::Url;

/// Rendered key length in hex characters (16 digest bytes).
const KEY_LEN: usize = 32;

/// Identity of one cached URL: the leading 16 bytes of the SHA-256 digest
/// of the URL string, rendered as lowercase hex.
///
/// The key doubles as the on-disk filename, so it must stay stable across
/// releases and safe for any filesystem. Two cache handles pointed at the
/// same directory derive identical keys for identical URLs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentKey(String);

impl ContentKey {
    /// Derive the key for a URL.
    pub fn for_url(url: &Url) -> Self {
        let digest = Sha256::digest(url.as_str().as_bytes());
        Self(hex::encode(&digest[..KEY_LEN / 2]))
    }

    /// Re-admit a rendered key, e.g. a filename found in the cache
    /// directory. Returns `None` for anything that cannot be a key
    /// (temp files, foreign artifacts).
    pub fn from_file_name(name: &str) -> Option<Self> {
        if Self::is_valid(name) {
            Some(Self(name.to_string()))
        } else {
            None
        }
    }

    pub fn is_valid(candidate: &str) -> bool {
        candidate.len() == KEY_LEN
            && candidate
                .as_bytes()
                .iter()
                .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn same_url_same_key() {
        let a = ContentKey::for_url(&url("https://cdn.example.com/hero.png"));
        let b = ContentKey::for_url(&url("https://cdn.example.com/hero.png"));
        assert_eq!(a, b);
    }

    #[test]
    fn distinct_urls_distinct_keys() {
        let a = ContentKey::for_url(&url("https://cdn.example.com/hero.png"));
        let b = ContentKey::for_url(&url("https://cdn.example.com/hero2.png"));
        assert_ne!(a, b);
    }

    #[test]
    fn key_is_lowercase_hex() {
        let key = ContentKey::for_url(&url("https://cdn.example.com/a.gif"));
        assert_eq!(key.as_str().len(), 32);
        assert!(ContentKey::is_valid(key.as_str()));
    }

    #[test]
    fn rejects_non_key_file_names() {
        assert!(ContentKey::from_file_name("not-a-key").is_none());
        assert!(ContentKey::from_file_name("ABCDEF0123456789ABCDEF0123456789").is_none());
        let key = ContentKey::for_url(&url("https://cdn.example.com/a.gif"));
        let tmp = format!("{key}.tmp-0f3a");
        assert!(ContentKey::from_file_name(&tmp).is_none());
        assert_eq!(
            ContentKey::from_file_name(key.as_str()),
            Some(key.clone())
        );
    }

    #[test]
    fn display_matches_file_name() {
        let key = ContentKey::for_url(&url("https://cdn.example.com/a.gif"));
        assert_eq!(key.to_string(), key.as_str());
    }
}
