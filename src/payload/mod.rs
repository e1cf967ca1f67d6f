//! Card payload parsing, traversal, and version gating.
//!
//! A push notification delivers the card inside a JSON envelope. The envelope
//! stores two documents as JSON strings: push metadata under
//! [`PUSH_PAYLOAD_KEY`] and the card itself under [`CARD_PAYLOAD_KEY`]. Any
//! object fragment inside the card document may declare an asset type through
//! its [`TYPE_TAG`] field; [`walk_fragments`] finds those fragments wherever
//! the document nests them.

pub mod version;
pub mod walk;

pub use version::{MAX_SUPPORTED_VERSION, PayloadVersion, ensure_supported};
pub use walk::walk_fragments;

use serde_json::{Map, Value};

use crate::error::{CardError, Result};

/// Envelope key holding the push metadata document as a JSON string.
pub const PUSH_PAYLOAD_KEY: &str = "fb_push_payload";

/// Envelope key holding the card document as a JSON string.
pub const CARD_PAYLOAD_KEY: &str = "fb_push_card";

/// Field naming the asset type of a payload fragment.
pub const TYPE_TAG: &str = "_type";

/// Parses a raw JSON document.
pub fn parse(raw: &str) -> Result<Value> {
    Ok(serde_json::from_str(raw)?)
}

/// Whether a notification envelope carries a card document.
pub fn has_card(envelope: &Value) -> bool {
    envelope.get(CARD_PAYLOAD_KEY).is_some()
}

/// Extracts and parses the card document from a notification envelope.
pub fn card_payload(envelope: &Value) -> Result<Value> {
    embedded_document(envelope, CARD_PAYLOAD_KEY)
}

/// Extracts and parses the push metadata document from a notification
/// envelope.
pub fn push_payload(envelope: &Value) -> Result<Value> {
    embedded_document(envelope, PUSH_PAYLOAD_KEY)
}

/// Returns the asset type a fragment declares, if any.
pub fn fragment_type(fragment: &Map<String, Value>) -> Option<&str> {
    fragment.get(TYPE_TAG).and_then(Value::as_str)
}

fn embedded_document(envelope: &Value, key: &str) -> Result<Value> {
    let raw = envelope
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| CardError::InvalidPayload(format!("envelope has no {key} string")))?;
    parse(raw)
}
