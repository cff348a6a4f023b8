//! Attestation policy primitives.

use std::collections::BTreeSet;

use crate::cert::AttestationCertificate;
use crate::error::U2fError;

/// Result of checking an attestation certificate against a policy.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AttestationDecision {
    /// The certificate is acceptable.
    Trusted,
    /// The certificate is not acceptable.
    Rejected {
        /// Human-readable reason, surfaced in `U2fError::Attestation`.
        reason: String,
    },
}

/// Trait for deciding whether an authenticator's attestation is trusted.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` for concurrent registrations.
pub trait AttestationPolicy: Send + Sync {
    /// Evaluate the certificate presented in a registration response.
    fn evaluate(&self, certificate: &AttestationCertificate) -> AttestationDecision;
}

/// Accept every attestation certificate.
///
/// This is the default: registration proves possession of the attestation
/// key but makes no claim about the vendor.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAnyAttestation;

impl AttestationPolicy for AcceptAnyAttestation {
    fn evaluate(&self, _certificate: &AttestationCertificate) -> AttestationDecision {
        AttestationDecision::Trusted
    }
}

/// Accept certificates whose issuer distinguished name is on an allowlist.
///
/// Names are compared exactly as rendered by the certificate parser, e.g.
/// `CN=Yubico U2F Root CA Serial 457200631`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrustedIssuers(BTreeSet<String>);

impl TrustedIssuers {
    /// Create an allowlist from issuer names.
    pub fn new<I, S>(issuers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(issuers.into_iter().map(Into::into).collect())
    }

    /// Check if the allowlist is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AttestationPolicy for TrustedIssuers {
    fn evaluate(&self, certificate: &AttestationCertificate) -> AttestationDecision {
        if self.0.contains(certificate.issuer()) {
            AttestationDecision::Trusted
        } else {
            AttestationDecision::Rejected {
                reason: format!("issuer {:?} is not trusted", certificate.issuer()),
            }
        }
    }
}

impl<P: AttestationPolicy + ?Sized> AttestationPolicy for Box<P> {
    fn evaluate(&self, certificate: &AttestationCertificate) -> AttestationDecision {
        (**self).evaluate(certificate)
    }
}

/// Apply a policy and turn a rejection into an error.
///
/// # Errors
///
/// Returns `U2fError::Attestation` if the policy rejects the certificate.
pub fn evaluate_attestation(
    policy: &(impl AttestationPolicy + ?Sized),
    certificate: &AttestationCertificate,
) -> Result<(), U2fError> {
    match policy.evaluate(certificate) {
        AttestationDecision::Trusted => Ok(()),
        AttestationDecision::Rejected { reason } => Err(U2fError::Attestation(reason)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn certificate(common_name: &str) -> AttestationCertificate {
        let key_pair = rcgen::KeyPair::generate_for(&rcgen::PKCS_ECDSA_P256_SHA256).unwrap();
        let mut params = rcgen::CertificateParams::new(Vec::<String>::new()).unwrap();
        params
            .distinguished_name
            .push(rcgen::DnType::CommonName, common_name);
        let der = params.self_signed(&key_pair).unwrap().der().to_vec();
        AttestationCertificate::from_der(&der).unwrap()
    }

    #[test]
    fn test_accept_any() {
        let cert = certificate("Anything");
        assert_eq!(
            AcceptAnyAttestation.evaluate(&cert),
            AttestationDecision::Trusted
        );
        assert!(evaluate_attestation(&AcceptAnyAttestation, &cert).is_ok());
    }

    #[test]
    fn test_trusted_issuer() {
        let cert = certificate("Vendor Root");
        let policy = TrustedIssuers::new(["CN=Vendor Root"]);
        assert_eq!(policy.evaluate(&cert), AttestationDecision::Trusted);
    }

    #[test]
    fn test_untrusted_issuer_rejected() {
        let cert = certificate("Unknown Vendor");
        let policy = TrustedIssuers::new(["CN=Vendor Root"]);

        assert!(matches!(
            policy.evaluate(&cert),
            AttestationDecision::Rejected { .. }
        ));
        assert!(matches!(
            evaluate_attestation(&policy, &cert),
            Err(U2fError::Attestation(_))
        ));
    }

    #[test]
    fn test_empty_allowlist_rejects_everything() {
        let cert = certificate("Vendor Root");
        let policy = TrustedIssuers::default();
        assert!(policy.is_empty());
        assert!(evaluate_attestation(&policy, &cert).is_err());
    }

    #[test]
    fn test_boxed_policy() {
        let cert = certificate("Vendor Root");
        let policy: Box<dyn AttestationPolicy> = Box::new(TrustedIssuers::new(["CN=Vendor Root"]));
        assert!(evaluate_attestation(&policy, &cert).is_ok());
    }
}
