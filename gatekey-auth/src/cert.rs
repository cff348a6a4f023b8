//! Attestation certificate parsing.
//!
//! A registration response carries the authenticator's X.509 attestation
//! certificate inline, followed directly by the attestation signature. The
//! certificate has no length prefix: its extent comes from the outer DER
//! `SEQUENCE` header, so parsing must consume exactly the encoded length.
//!
//! # Security
//!
//! - The outer length is read first and certificates over 16KB are rejected
//!   before the X.509 parser sees them
//! - The x509_parser library handles ASN.1 parsing safely
//! - The issuing chain is NOT validated here; see [`crate::trust`]

use thiserror::Error;
use x509_parser::der_parser::asn1_rs::Header;
use x509_parser::prelude::*;

use crate::crypto::PublicKey;
use crate::error::U2fError;

/// Maximum certificate size (16KB is generous for a single cert)
pub const MAX_CERT_SIZE: usize = 16 * 1024;

/// Errors that can occur during certificate parsing.
#[derive(Debug, Error)]
pub enum CertError {
    #[error("certificate too large: {0} bytes (max {MAX_CERT_SIZE})")]
    TooLarge(usize),

    #[error("failed to parse X.509 certificate: {0}")]
    ParseError(String),
}

impl From<CertError> for U2fError {
    fn from(err: CertError) -> Self {
        U2fError::Format(err.to_string())
    }
}

/// A parsed attestation certificate.
///
/// Keeps the raw DER bytes for the caller's records alongside the fields
/// the verifier and attestation policies need.
#[derive(Clone, PartialEq, Eq)]
pub struct AttestationCertificate {
    der: Vec<u8>,
    public_key: PublicKey,
    issuer: String,
    subject: String,
}

/// Total length (header plus content) of the DER element at the front of `input`.
fn encoded_len(input: &[u8]) -> Result<usize, CertError> {
    let (rest, header) =
        Header::from_der(input).map_err(|e| CertError::ParseError(format!("{e:?}")))?;
    let content_len = header
        .length()
        .definite()
        .map_err(|e| CertError::ParseError(format!("{e:?}")))?;
    (input.len() - rest.len())
        .checked_add(content_len)
        .ok_or(CertError::TooLarge(usize::MAX))
}

impl AttestationCertificate {
    /// Parse a certificate from the front of `input`.
    ///
    /// Returns the certificate and the bytes that follow it.
    ///
    /// # Errors
    ///
    /// Returns `CertError::TooLarge` if the encoded certificate exceeds 16KB.
    /// Returns `CertError::ParseError` if the DER is malformed or the subject
    /// key is not a P-256 point.
    pub fn parse_prefix(input: &[u8]) -> Result<(Self, &[u8]), CertError> {
        let der_len = encoded_len(input)?;
        if der_len > MAX_CERT_SIZE {
            return Err(CertError::TooLarge(der_len));
        }
        if der_len > input.len() {
            return Err(CertError::ParseError(format!(
                "certificate truncated: {} of {der_len} bytes",
                input.len()
            )));
        }
        let (der, rest) = input.split_at(der_len);

        let (_, cert) = X509Certificate::from_der(der)
            .map_err(|e| CertError::ParseError(format!("{e:?}")))?;

        let public_key = PublicKey::from_sec1(&cert.public_key().subject_public_key.data)
            .map_err(|e| CertError::ParseError(e.to_string()))?;

        let parsed = Self {
            der: der.to_vec(),
            public_key,
            issuer: cert.issuer().to_string(),
            subject: cert.subject().to_string(),
        };
        Ok((parsed, rest))
    }

    /// Parse a complete DER certificate, rejecting trailing bytes.
    ///
    /// # Errors
    ///
    /// Same as [`AttestationCertificate::parse_prefix`], plus
    /// `CertError::ParseError` on trailing data.
    pub fn from_der(der: &[u8]) -> Result<Self, CertError> {
        let (cert, rest) = Self::parse_prefix(der)?;
        if !rest.is_empty() {
            return Err(CertError::ParseError(format!(
                "{} trailing bytes after certificate",
                rest.len()
            )));
        }
        Ok(cert)
    }

    /// The raw DER encoding.
    #[must_use]
    pub fn as_der(&self) -> &[u8] {
        &self.der
    }

    /// The attestation public key.
    #[must_use]
    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// The issuer distinguished name, e.g. `CN=Yubico U2F Root CA Serial 457200631`.
    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// The subject distinguished name.
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }
}

impl std::fmt::Debug for AttestationCertificate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttestationCertificate")
            .field("subject", &self.subject)
            .field("issuer", &self.issuer)
            .field("der_len", &self.der.len())
            .finish()
    }
}
