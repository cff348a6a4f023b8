//! Attestation trust policy.
//!
//! The verifier proves that a registration was signed by the key in the
//! attestation certificate, but whether that certificate belongs to a
//! trustworthy vendor is deployment policy. Policies plug in through
//! [`AttestationPolicy`] and are consulted by `register` after the
//! signature verifies.

mod attestation;

pub use attestation::{
    evaluate_attestation, AcceptAnyAttestation, AttestationDecision, AttestationPolicy,
    TrustedIssuers,
};
