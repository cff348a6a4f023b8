//! P-256 keys and ECDSA signatures.
//!
//! - Public keys are accepted only in the 65-byte uncompressed SEC1 form
//! - Signatures are DER-encoded `Ecdsa-Sig-Value` structures
//! - Verification hashes the message with SHA-256

use p256::ecdsa::signature::Verifier;
use p256::ecdsa::{Signature as EcdsaSignature, VerifyingKey};
use sha2::{Digest, Sha256};

use crate::error::U2fError;

/// Length of an uncompressed P-256 point: `0x04 || X(32) || Y(32)`.
pub const PUBLIC_KEY_LEN: usize = 65;

/// SEC1 tag for an uncompressed point.
const UNCOMPRESSED_POINT_TAG: u8 = 0x04;

/// Compute the SHA-256 digest of `data`.
#[must_use]
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// A P-256 public key.
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey(VerifyingKey);

impl PublicKey {
    /// Decode a raw uncompressed point.
    ///
    /// # Errors
    ///
    /// Returns `U2fError::Format` if the slice is not 65 bytes, is not tagged
    /// as uncompressed, or is not a point on the curve.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, U2fError> {
        if bytes.len() != PUBLIC_KEY_LEN {
            return Err(U2fError::format(format!(
                "public key: expected {PUBLIC_KEY_LEN} bytes, got {}",
                bytes.len()
            )));
        }
        if bytes[0] != UNCOMPRESSED_POINT_TAG {
            return Err(U2fError::format("public key: not an uncompressed point"));
        }
        let key = VerifyingKey::from_sec1_bytes(bytes)
            .map_err(|_| U2fError::format("public key: not a point on P-256"))?;
        Ok(Self(key))
    }

    /// Decode a key taken from a certificate's `subjectPublicKey`.
    ///
    /// Certificates may legally carry compressed points, so any SEC1 form is
    /// accepted here.
    pub(crate) fn from_sec1(bytes: &[u8]) -> Result<Self, U2fError> {
        VerifyingKey::from_sec1_bytes(bytes)
            .map(Self)
            .map_err(|_| U2fError::format("attestation certificate: key is not a P-256 point"))
    }

    /// Export the raw uncompressed point.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; PUBLIC_KEY_LEN] {
        let point = self.0.to_encoded_point(false);
        let mut out = [0u8; PUBLIC_KEY_LEN];
        out.copy_from_slice(point.as_bytes());
        out
    }

    /// Verify an ECDSA-SHA256 signature over `message`.
    #[must_use]
    pub fn verify(&self, message: &[u8], signature: &Signature) -> bool {
        self.0.verify(message, &signature.0).is_ok()
    }
}

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let bytes = self.to_bytes();
        write!(
            f,
            "PublicKey({:02x}{:02x}{:02x}{:02x}...)",
            bytes[1], bytes[2], bytes[3], bytes[4]
        )
    }
}

/// An ECDSA P-256 signature.
#[derive(Clone, PartialEq, Eq)]
pub struct Signature(EcdsaSignature);

impl Signature {
    /// Parse a DER-encoded signature.
    ///
    /// # Errors
    ///
    /// Returns `U2fError::Format` if the bytes are not a valid DER
    /// `Ecdsa-Sig-Value` with in-range scalars.
    pub fn from_der(bytes: &[u8]) -> Result<Self, U2fError> {
        EcdsaSignature::from_der(bytes)
            .map(Self)
            .map_err(|_| U2fError::format("signature: invalid DER encoding"))
    }

    /// Export the signature in DER form.
    #[must_use]
    pub fn to_der(&self) -> Vec<u8> {
        self.0.to_der().as_bytes().to_vec()
    }
}

impl std::fmt::Debug for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Show only the first 4 bytes of r
        let bytes = self.0.to_bytes();
        write!(
            f,
            "Signature({:02x}{:02x}{:02x}{:02x}...)",
            bytes[0], bytes[1], bytes[2], bytes[3]
        )
    }
}
