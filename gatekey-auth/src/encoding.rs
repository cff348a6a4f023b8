//! Base64url helpers shared by the transport and persisted types.
//!
//! U2F encodes every binary field as URL-safe base64 without padding.
//! Some browsers pad anyway, so decoding tolerates trailing `=`.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

use crate::error::U2fError;

/// Encode bytes as unpadded base64url.
#[must_use]
pub fn encode(bytes: impl AsRef<[u8]>) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Decode base64url, with or without padding.
///
/// # Errors
///
/// Returns `U2fError::Format` naming `field` if the input is not base64url.
pub fn decode(input: &str, field: &str) -> Result<Vec<u8>, U2fError> {
    URL_SAFE_NO_PAD
        .decode(input.trim_end_matches('='))
        .map_err(|e| U2fError::format(format!("{field}: invalid base64url: {e}")))
}

/// `#[serde(with = "...")]` adapter for `Vec<u8>` fields.
pub(crate) mod bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::encode(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        super::decode(&s, "bytes").map_err(serde::de::Error::custom)
    }
}

/// `#[serde(with = "...")]` adapter for fixed 32-byte fields.
pub(crate) mod array32 {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &[u8; 32], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::encode(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<[u8; 32], D::Error> {
        let s = String::deserialize(deserializer)?;
        let bytes = super::decode(&s, "bytes").map_err(serde::de::Error::custom)?;
        bytes.try_into().map_err(|v: Vec<u8>| {
            serde::de::Error::invalid_length(v.len(), &"32 bytes")
        })
    }
}
