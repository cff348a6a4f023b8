//! Client data decoding and validation.
//!
//! Every U2F response carries a JSON "client data" envelope written by the
//! browser. Its SHA-256 digest is part of what the authenticator signs, so
//! checking the envelope and then verifying the signature binds the
//! response to one operation, one challenge and one origin.

use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use crate::challenge::Challenge;
use crate::crypto::sha256;
use crate::encoding;
use crate::error::U2fError;

/// The operation a client data envelope claims to be for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientDataType {
    /// Registration (`navigator.id.finishEnrollment`).
    Enrollment,
    /// Authentication (`navigator.id.getAssertion`).
    Assertion,
}

impl ClientDataType {
    /// The `typ` string browsers put in client data.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ClientDataType::Enrollment => "navigator.id.finishEnrollment",
            ClientDataType::Assertion => "navigator.id.getAssertion",
        }
    }
}

impl std::fmt::Display for ClientDataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decoded client data.
///
/// Fields are public for inspection; decoding does not validate anything
/// beyond JSON structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientData {
    /// Operation type tag.
    pub typ: String,
    /// Base64url challenge echoed by the browser.
    pub challenge: String,
    /// Origin of the page that made the request.
    pub origin: String,
    /// TLS channel ID public key, kept as raw JSON.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cid_pubkey: Option<serde_json::Value>,
}

impl ClientData {
    /// Decode base64url client data as sent in a response.
    ///
    /// # Errors
    ///
    /// Returns `U2fError::Format` if the input is not base64url or not a
    /// client data JSON object.
    pub fn decode(encoded: &str) -> Result<Self, U2fError> {
        Self::from_json(&encoding::decode(encoded, "clientData")?)
    }

    fn from_json(raw: &[u8]) -> Result<Self, U2fError> {
        serde_json::from_slice(raw)
            .map_err(|e| U2fError::format(format!("clientData: invalid JSON: {e}")))
    }
}

/// Message components derived from validated client data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ClientParams {
    /// SHA-256 of the raw client data bytes.
    pub challenge_param: [u8; 32],
    /// SHA-256 of the challenge's app ID.
    pub app_param: [u8; 32],
}

/// Validate client data against the challenge it should answer.
///
/// Checks, in order: the operation type, the echoed challenge, the origin.
///
/// # Errors
///
/// - `U2fError::Format` if the envelope cannot be decoded
/// - `U2fError::Protocol` if the operation type is not `expected`
/// - `U2fError::ReplayMismatch` if the echoed challenge differs
/// - `U2fError::Origin` if the origin is not a trusted facet
pub(crate) fn validate_client_data(
    expected: ClientDataType,
    encoded: &str,
    challenge: &Challenge,
) -> Result<ClientParams, U2fError> {
    let raw = encoding::decode(encoded, "clientData")?;
    let client_data = ClientData::from_json(&raw)?;

    if client_data.typ != expected.as_str() {
        return Err(U2fError::protocol(format!(
            "expected client data type {expected}, got {:?}",
            client_data.typ
        )));
    }

    // Constant-time comparison
    let expected_challenge = challenge.encoded();
    let matches: bool = client_data
        .challenge
        .as_bytes()
        .ct_eq(expected_challenge.as_bytes())
        .into();
    if !matches {
        return Err(U2fError::ReplayMismatch);
    }

    if !challenge.is_trusted_facet(&client_data.origin) {
        return Err(U2fError::Origin(client_data.origin));
    }

    Ok(ClientParams {
        challenge_param: sha256(&raw),
        app_param: sha256(challenge.app_id().as_bytes()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::challenge::new_challenge;
    use crate::env::FixedEnv;
    use chrono::Utc;

    const APP_ID: &str = "https://example.com";

    fn challenge() -> Challenge {
        let env = FixedEnv::new(vec![0x42; 32], Utc::now()).unwrap();
        new_challenge(APP_ID, [APP_ID, "https://m.example.com"], &env).unwrap()
    }

    fn encode_client_data(typ: &str, challenge: &str, origin: &str) -> (String, Vec<u8>) {
        let raw = serde_json::to_vec(&serde_json::json!({
            "typ": typ,
            "challenge": challenge,
            "origin": origin,
            "cid_pubkey": "",
        }))
        .unwrap();
        (encoding::encode(&raw), raw)
    }

    #[test]
    fn test_valid_enrollment() {
        let challenge = challenge();
        let (encoded, raw) = encode_client_data(
            "navigator.id.finishEnrollment",
            &challenge.encoded(),
            APP_ID,
        );

        let params = validate_client_data(ClientDataType::Enrollment, &encoded, &challenge).unwrap();
        assert_eq!(params.challenge_param, sha256(&raw));
        assert_eq!(params.app_param, sha256(APP_ID.as_bytes()));
    }

    #[test]
    fn test_secondary_facet_accepted() {
        let challenge = challenge();
        let (encoded, _) = encode_client_data(
            "navigator.id.getAssertion",
            &challenge.encoded(),
            "https://m.example.com",
        );
        assert!(validate_client_data(ClientDataType::Assertion, &encoded, &challenge).is_ok());
    }

    #[test]
    fn test_wrong_type_is_protocol_error() {
        let challenge = challenge();
        let (encoded, _) =
            encode_client_data("navigator.id.getAssertion", &challenge.encoded(), APP_ID);

        let err = validate_client_data(ClientDataType::Enrollment, &encoded, &challenge).unwrap_err();
        assert!(matches!(err, U2fError::Protocol(_)));
    }

    #[test]
    fn test_wrong_challenge_is_replay_mismatch() {
        let challenge = challenge();
        let original = challenge.encoded().into_bytes();

        for i in 0..original.len() {
            let mut echoed = original.clone();
            echoed[i] = if echoed[i] == b'A' { b'B' } else { b'A' };
            let echoed = String::from_utf8(echoed).unwrap();
            let (encoded, _) = encode_client_data("navigator.id.finishEnrollment", &echoed, APP_ID);

            let err =
                validate_client_data(ClientDataType::Enrollment, &encoded, &challenge).unwrap_err();
            assert_eq!(err, U2fError::ReplayMismatch, "echoed char {i} changed");
        }
    }

    #[test]
    fn test_changed_challenge_bytes_is_replay_mismatch() {
        let issued = challenge();
        let (encoded, _) =
            encode_client_data("navigator.id.finishEnrollment", &issued.encoded(), APP_ID);

        for i in 0..32 {
            let mut bytes = vec![0x42; 32];
            bytes[i] ^= 0x01;
            let env = FixedEnv::new(bytes, Utc::now()).unwrap();
            let other = new_challenge(APP_ID, [APP_ID], &env).unwrap();

            let err =
                validate_client_data(ClientDataType::Enrollment, &encoded, &other).unwrap_err();
            assert_eq!(err, U2fError::ReplayMismatch, "challenge byte {i} changed");
        }
    }

    #[test]
    fn test_truncated_challenge_is_replay_mismatch() {
        let challenge = challenge();
        let echoed = &challenge.encoded()[..42];
        let (encoded, _) = encode_client_data("navigator.id.finishEnrollment", echoed, APP_ID);

        let err = validate_client_data(ClientDataType::Enrollment, &encoded, &challenge).unwrap_err();
        assert_eq!(err, U2fError::ReplayMismatch);
    }

    #[test]
    fn test_untrusted_origin() {
        let challenge = challenge();
        let (encoded, _) = encode_client_data(
            "navigator.id.finishEnrollment",
            &challenge.encoded(),
            "https://evil.example",
        );

        let err = validate_client_data(ClientDataType::Enrollment, &encoded, &challenge).unwrap_err();
        assert_eq!(err, U2fError::Origin("https://evil.example".to_string()));
    }

    #[test]
    fn test_bad_base64_is_format_error() {
        let err = validate_client_data(ClientDataType::Enrollment, "!!!", &challenge()).unwrap_err();
        assert!(matches!(err, U2fError::Format(_)));
    }

    #[test]
    fn test_bad_json_is_format_error() {
        let encoded = encoding::encode(b"{\"typ\": 1}");
        let err = validate_client_data(ClientDataType::Enrollment, &encoded, &challenge()).unwrap_err();
        assert!(matches!(err, U2fError::Format(_)));
    }

    #[test]
    fn test_decode_keeps_channel_id_object() {
        let raw = br#"{"typ":"navigator.id.getAssertion","challenge":"x","origin":"o","cid_pubkey":{"kty":"EC"}}"#;
        let client_data = ClientData::decode(&encoding::encode(raw)).unwrap();
        assert_eq!(client_data.cid_pubkey, Some(serde_json::json!({"kty": "EC"})));
    }

    #[test]
    fn test_decode_without_channel_id() {
        let raw = br#"{"typ":"navigator.id.getAssertion","challenge":"x","origin":"o"}"#;
        let client_data = ClientData::decode(&encoding::encode(raw)).unwrap();
        assert_eq!(client_data.cid_pubkey, None);
    }
}
