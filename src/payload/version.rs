//! Schema version gating for card payloads.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::error::{CardError, Result};

/// Newest schema revision this crate knows how to render.
pub const MAX_SUPPORTED_VERSION: PayloadVersion = PayloadVersion::new(1, 0, 0);

/// Field naming the schema revision inside a card document.
pub const VERSION_KEY: &str = "version";

/// Schema revision declared by a card payload.
///
/// Ordering is lexicographic over `(major, minor, patch)`, which is exactly
/// how revisions are compared when gating a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PayloadVersion {
    /// Incompatible schema generation.
    pub major: u32,
    /// Backwards-compatible additions within a generation.
    pub minor: u32,
    /// Clarifications that change no wire format.
    pub patch: u32,
}

impl PayloadVersion {
    /// Builds a version from its components.
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parses a `major.minor` or `major.minor.patch` string.
    ///
    /// A missing patch component defaults to zero. Anything else, including a
    /// bare major, trailing separators, or extra components, is rejected.
    pub fn parse(input: &str) -> Option<Self> {
        let mut parts = input.trim().split('.');
        let major = parts.next()?.parse().ok()?;
        let minor = parts.next()?.parse().ok()?;
        let patch = match parts.next() {
            Some(raw) => raw.parse().ok()?,
            None => 0,
        };
        if parts.next().is_some() {
            return None;
        }
        Some(Self::new(major, minor, patch))
    }
}

impl FromStr for PayloadVersion {
    type Err = CardError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s).ok_or_else(|| {
            CardError::InvalidPayload(format!("unrecognized version string {s:?}"))
        })
    }
}

impl fmt::Display for PayloadVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Checks the revision a card document declares against
/// [`MAX_SUPPORTED_VERSION`].
///
/// A document with no [`VERSION_KEY`] field, an unparsable revision, or a
/// revision newer than the supported maximum is refused. Older revisions pass
/// the gate; handlers degrade gracefully on fields they do not know.
pub fn ensure_supported(card: &Value) -> Result<PayloadVersion> {
    let declared = card
        .get(VERSION_KEY)
        .and_then(Value::as_str)
        .ok_or_else(|| {
            CardError::UnsupportedVersion("card document declares no version".to_string())
        })?;
    let version = PayloadVersion::parse(declared).ok_or_else(|| {
        CardError::UnsupportedVersion(format!("unrecognized version string {declared:?}"))
    })?;
    if version > MAX_SUPPORTED_VERSION {
        return Err(CardError::UnsupportedVersion(format!(
            "{version} is newer than the supported {MAX_SUPPORTED_VERSION}"
        )));
    }
    Ok(version)
}
