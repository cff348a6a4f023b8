//! Registered authenticator records.

use serde::{Deserialize, Serialize};

use super::KeyHandle;
use crate::cert::AttestationCertificate;
use crate::crypto::PublicKey;
use crate::encoding;
use crate::error::U2fError;

/// A registered authenticator.
///
/// Created by [`register`](super::register) with a counter of zero. The core
/// never mutates a registration: authentication returns the new counter and
/// the caller's store persists it, e.g. via [`Registration::with_counter`].
///
/// Serialized with base64url binary fields; deserialization re-parses the
/// public key and certificate.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RegistrationRecord", into = "RegistrationRecord")]
pub struct Registration {
    key_handle: KeyHandle,
    public_key: PublicKey,
    certificate: AttestationCertificate,
    counter: u32,
}

impl Registration {
    pub(crate) fn new(
        key_handle: KeyHandle,
        public_key: PublicKey,
        certificate: AttestationCertificate,
    ) -> Self {
        Self {
            key_handle,
            public_key,
            certificate,
            counter: 0,
        }
    }

    /// The authenticator's key handle.
    #[must_use]
    pub fn key_handle(&self) -> &KeyHandle {
        &self.key_handle
    }

    /// The credential public key.
    #[must_use]
    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// The attestation certificate presented at registration.
    #[must_use]
    pub fn certificate(&self) -> &AttestationCertificate {
        &self.certificate
    }

    /// The last persisted authenticator counter.
    #[must_use]
    pub fn counter(&self) -> u32 {
        self.counter
    }

    /// Return this registration with an updated counter.
    ///
    /// Intended for stores persisting the value returned by a successful
    /// authentication.
    #[must_use]
    pub fn with_counter(mut self, counter: u32) -> Self {
        self.counter = counter;
        self
    }
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("key_handle", &self.key_handle)
            .field("public_key", &self.public_key)
            .field("certificate", &self.certificate)
            .field("counter", &self.counter)
            .finish()
    }
}

/// Serialized form of a [`Registration`].
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegistrationRecord {
    key_handle: KeyHandle,
    #[serde(with = "encoding::bytes")]
    public_key: Vec<u8>,
    #[serde(with = "encoding::bytes")]
    certificate: Vec<u8>,
    counter: u32,
}

impl TryFrom<RegistrationRecord> for Registration {
    type Error = U2fError;

    fn try_from(record: RegistrationRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            key_handle: record.key_handle,
            public_key: PublicKey::from_bytes(&record.public_key)?,
            certificate: AttestationCertificate::from_der(&record.certificate)?,
            counter: record.counter,
        })
    }
}

impl From<Registration> for RegistrationRecord {
    fn from(registration: Registration) -> Self {
        Self {
            key_handle: registration.key_handle,
            public_key: registration.public_key.to_bytes().to_vec(),
            certificate: registration.certificate.as_der().to_vec(),
            counter: registration.counter,
        }
    }
}
