//! Registration response types and the raw message parser.

use serde::{Deserialize, Serialize};

use super::KeyHandle;
use crate::cert::AttestationCertificate;
use crate::crypto::{PublicKey, Signature, PUBLIC_KEY_LEN};
use crate::error::U2fError;

/// Reserved first byte of a registration message.
pub const REGISTRATION_RESERVED_BYTE: u8 = 0x05;

/// A registration response as returned by the browser.
///
/// This is a data transfer object: nothing is checked until it is passed to
/// [`register`](super::register).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    /// Base64url raw registration message.
    pub registration_data: String,
    /// Base64url client data JSON.
    pub client_data: String,
    /// Protocol version reported by the browser.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
}

/// A parsed raw registration message.
///
/// Wire format:
///
/// | Field            | Size | Description                               |
/// |------------------|------|-------------------------------------------|
/// | reserved         | 1    | Always 0x05                               |
/// | public_key       | 65   | Uncompressed P-256 point                  |
/// | key_handle_len   | 1    | Length L of the key handle                |
/// | key_handle       | L    | Opaque key handle                         |
/// | certificate      | var  | DER X.509 attestation certificate         |
/// | signature        | rest | DER ECDSA signature                       |
#[derive(Debug, Clone)]
pub(crate) struct RegistrationData {
    pub public_key: PublicKey,
    pub raw_public_key: [u8; PUBLIC_KEY_LEN],
    pub key_handle: KeyHandle,
    pub certificate: AttestationCertificate,
    pub signature: Signature,
}

impl RegistrationData {
    /// Parse the raw registration message.
    ///
    /// # Errors
    ///
    /// Returns `U2fError::Format` if any field is missing or malformed.
    pub fn parse(bytes: &[u8]) -> Result<Self, U2fError> {
        let (&reserved, rest) = bytes
            .split_first()
            .ok_or_else(|| U2fError::format("registrationData: empty"))?;
        if reserved != REGISTRATION_RESERVED_BYTE {
            return Err(U2fError::format(format!(
                "registrationData: reserved byte is {reserved:#04x}, expected {REGISTRATION_RESERVED_BYTE:#04x}"
            )));
        }

        if rest.len() < PUBLIC_KEY_LEN {
            return Err(U2fError::format("registrationData: truncated public key"));
        }
        let (key_bytes, rest) = rest.split_at(PUBLIC_KEY_LEN);
        let public_key = PublicKey::from_bytes(key_bytes)?;
        let mut raw_public_key = [0u8; PUBLIC_KEY_LEN];
        raw_public_key.copy_from_slice(key_bytes);

        let (&key_handle_len, rest) = rest
            .split_first()
            .ok_or_else(|| U2fError::format("registrationData: missing key handle length"))?;
        let key_handle_len = usize::from(key_handle_len);
        if rest.len() < key_handle_len {
            return Err(U2fError::format("registrationData: truncated key handle"));
        }
        let (key_handle, rest) = rest.split_at(key_handle_len);
        let key_handle = KeyHandle::from_bytes(key_handle)?;

        let (certificate, rest) = AttestationCertificate::parse_prefix(rest)?;
        let signature = Signature::from_der(rest)?;

        Ok(Self {
            public_key,
            raw_public_key,
            key_handle,
            certificate,
            signature,
        })
    }
}

/// Build the message signed by the attestation key.
///
/// Format: `0x00 || app_param(32) || challenge_param(32) || key_handle(L) || public_key(65)`
pub(crate) fn build_registration_message(
    app_param: &[u8; 32],
    challenge_param: &[u8; 32],
    key_handle: &KeyHandle,
    public_key: &[u8; PUBLIC_KEY_LEN],
) -> Vec<u8> {
    let mut msg = Vec::with_capacity(1 + 32 + 32 + key_handle.len() + PUBLIC_KEY_LEN);
    msg.push(0x00);
    msg.extend_from_slice(app_param);
    msg.extend_from_slice(challenge_param);
    msg.extend_from_slice(key_handle.as_bytes());
    msg.extend_from_slice(public_key);
    msg
}
