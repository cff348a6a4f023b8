//! Authenticator key handles.

use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use crate::encoding;
use crate::error::U2fError;

/// Maximum key handle length; the wire format uses a one-byte length.
pub const MAX_KEY_HANDLE_LEN: usize = 255;

/// An opaque key handle assigned by the authenticator at registration.
///
/// Identifies one authenticator credential within one app ID. Serialized as
/// unpadded base64url.
///
/// # Security
///
/// Equality is constant-time. Hashing is not.
#[derive(Clone, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
#[allow(clippy::derived_hash_with_manual_eq)]
pub struct KeyHandle(Vec<u8>);

impl KeyHandle {
    /// Create a key handle from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns `U2fError::Format` if longer than 255 bytes.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self, U2fError> {
        let bytes = bytes.into();
        if bytes.len() > MAX_KEY_HANDLE_LEN {
            return Err(U2fError::format(format!(
                "key handle: {} bytes exceeds {MAX_KEY_HANDLE_LEN}",
                bytes.len()
            )));
        }
        Ok(Self(bytes))
    }

    /// Decode a base64url key handle.
    ///
    /// # Errors
    ///
    /// Returns `U2fError::Format` on invalid base64url or excess length.
    pub fn from_base64(encoded: &str) -> Result<Self, U2fError> {
        Self::from_bytes(encoding::decode(encoded, "keyHandle")?)
    }

    /// Encode as unpadded base64url.
    #[must_use]
    pub fn to_base64(&self) -> String {
        encoding::encode(&self.0)
    }

    /// The raw bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the key handle is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl PartialEq for KeyHandle {
    fn eq(&self, other: &Self) -> bool {
        self.0.ct_eq(&other.0).into()
    }
}

impl TryFrom<String> for KeyHandle {
    type Error = U2fError;

    fn try_from(encoded: String) -> Result<Self, Self::Error> {
        Self::from_base64(&encoded)
    }
}

impl From<KeyHandle> for String {
    fn from(handle: KeyHandle) -> Self {
        handle.to_base64()
    }
}

impl AsRef<[u8]> for KeyHandle {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Display for KeyHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_base64())
    }
}

impl std::fmt::Debug for KeyHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "KeyHandle({})", self.to_base64())
    }
}
