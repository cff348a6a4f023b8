//! Sign response types and the signature data parser.

use serde::{Deserialize, Serialize};

use crate::crypto::Signature;
use crate::error::U2fError;

/// Flag bit set when the user touched the authenticator.
pub const USER_PRESENCE_FLAG: u8 = 0x01;

/// Length of the message signed during authentication.
pub(crate) const AUTHENTICATION_MESSAGE_LEN: usize = 32 + 1 + 4 + 32;

/// A sign response as returned by the browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignResponse {
    /// Base64url key handle the authenticator answered with.
    pub key_handle: String,
    /// Base64url client data JSON.
    pub client_data: String,
    /// Base64url raw signature data.
    pub signature_data: String,
}

/// Parsed signature data.
///
/// Wire format:
///
/// | Field     | Size | Description                          |
/// |-----------|------|--------------------------------------|
/// | flags     | 1    | Bit 0: user presence                 |
/// | counter   | 4    | Signing counter (u32 BE)             |
/// | signature | rest | DER ECDSA signature                  |
#[derive(Debug, Clone)]
pub(crate) struct SignatureData {
    pub flags: u8,
    pub counter: u32,
    pub signature: Signature,
}

impl SignatureData {
    /// Parse raw signature data.
    ///
    /// # Errors
    ///
    /// - `U2fError::Format` if a field is missing or the signature is not DER
    /// - `U2fError::UserNotPresent` if the user presence flag is clear
    pub fn parse(bytes: &[u8]) -> Result<Self, U2fError> {
        let (&flags, rest) = bytes
            .split_first()
            .ok_or_else(|| U2fError::format("signatureData: empty"))?;
        if flags & USER_PRESENCE_FLAG == 0 {
            return Err(U2fError::UserNotPresent);
        }

        if rest.len() < 4 {
            return Err(U2fError::format("signatureData: truncated counter"));
        }
        let (counter, rest) = rest.split_at(4);
        let counter = u32::from_be_bytes([counter[0], counter[1], counter[2], counter[3]]);

        let signature = Signature::from_der(rest)?;

        Ok(Self {
            flags,
            counter,
            signature,
        })
    }
}

/// Build the message signed by the credential key.
///
/// Format: `app_param(32) || flags(1) || counter(4, BE) || challenge_param(32)`
pub(crate) fn build_authentication_message(
    app_param: &[u8; 32],
    flags: u8,
    counter: u32,
    challenge_param: &[u8; 32],
) -> [u8; AUTHENTICATION_MESSAGE_LEN] {
    let mut msg = [0u8; AUTHENTICATION_MESSAGE_LEN];
    msg[..32].copy_from_slice(app_param);
    msg[32] = flags;
    msg[33..37].copy_from_slice(&counter.to_be_bytes());
    msg[37..].copy_from_slice(challenge_param);
    msg
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_rejected() {
        assert!(matches!(SignatureData::parse(&[]), Err(U2fError::Format(_))));
    }

    #[test]
    fn test_user_presence_required() {
        let bytes = [0x00, 0, 0, 0, 1, 0x30, 0x00];
        assert_eq!(
            SignatureData::parse(&bytes).unwrap_err(),
            U2fError::UserNotPresent
        );
    }

    #[test]
    fn test_other_flags_do_not_assert_presence() {
        let bytes = [0x04, 0, 0, 0, 1];
        assert_eq!(
            SignatureData::parse(&bytes).unwrap_err(),
            U2fError::UserNotPresent
        );
    }

    #[test]
    fn test_truncated_counter_rejected() {
        let err = SignatureData::parse(&[0x01, 0, 0]).unwrap_err();
        assert!(matches!(err, U2fError::Format(msg) if msg.contains("counter")));
    }

    #[test]
    fn test_missing_signature_rejected() {
        assert!(matches!(
            SignatureData::parse(&[0x01, 0, 0, 0, 6]),
            Err(U2fError::Format(_))
        ));
    }

    #[test]
    fn test_counter_is_big_endian() {
        let raw = crate::encoding::decode(
            "AQAAAAYwRAIgBuyafOXoc9Q7fARcs2JbCZdtnMzVCyeJC-J-2Im1IBsCIDxkzmvPX9RCY8uts4wM1y4wEX9LmNH2Mz_VFd-JdyGE",
            "test",
        )
        .unwrap();
        let data = SignatureData::parse(&raw).unwrap();
        assert_eq!(data.flags, 0x01);
        assert_eq!(data.counter, 6);
    }

    #[test]
    fn test_authentication_message_layout() {
        let msg = build_authentication_message(&[0xAA; 32], 0x01, 0x0102_0304, &[0xBB; 32]);

        assert_eq!(msg.len(), 69);
        assert_eq!(&msg[..32], &[0xAA; 32]);
        assert_eq!(msg[32], 0x01);
        assert_eq!(&msg[33..37], &[1, 2, 3, 4]);
        assert_eq!(&msg[37..], &[0xBB; 32]);
    }

    #[test]
    fn test_response_json_field_names() {
        let json = r#"{"keyHandle":"a","clientData":"b","signatureData":"c"}"#;
        let response: SignResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.key_handle, "a");
        assert_eq!(response.client_data, "b");
        assert_eq!(response.signature_data, "c");
        assert_eq!(serde_json::to_string(&response).unwrap(), json);
    }
}
