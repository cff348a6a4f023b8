//! Error types for U2F registration and authentication.

/// Errors that can occur while issuing challenges or verifying responses.
///
/// Each failure mode has its own variant so callers can tell a likely
/// cloned authenticator ([`U2fError::Counter`]) apart from a plain protocol
/// error. No variant is ever accompanied by a partial result.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum U2fError {
    /// Invalid construction inputs (empty app ID, no trusted facets, ...).
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Malformed base64, JSON, binary layout or certificate.
    #[error("malformed input: {0}")]
    Format(String),

    /// The response is for a different operation or protocol version.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The client data echoes a challenge other than the one issued.
    #[error("challenge does not match")]
    ReplayMismatch,

    /// The client data origin is not a trusted facet of the app ID.
    #[error("untrusted origin: {0}")]
    Origin(String),

    /// The signature does not verify.
    #[error("invalid signature")]
    Signature,

    /// The authenticator did not assert user presence.
    #[error("user presence not asserted")]
    UserNotPresent,

    /// The authenticator counter did not increase.
    ///
    /// Either the assertion was replayed or the key handle is shared by a
    /// cloned authenticator.
    #[error("counter did not increase (last {last}, received {received})")]
    Counter {
        /// The counter value the caller last persisted.
        last: u32,
        /// The counter value signed by the authenticator.
        received: u32,
    },

    /// The challenge is older than the configured timeout.
    #[error("challenge expired")]
    ChallengeExpired,

    /// The attestation policy rejected the authenticator's certificate.
    #[error("attestation rejected: {0}")]
    Attestation(String),

    /// No registration exists for the presented key handle.
    #[error("unknown key handle")]
    UnknownKeyHandle,
}

impl U2fError {
    pub(crate) fn format(message: impl Into<String>) -> Self {
        Self::Format(message.into())
    }

    pub(crate) fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }
}
