//! Server-side FIDO U2F verification.
//!
//! This crate is intentionally IO-free:
//! - No filesystem operations
//! - No network calls
//! - No database interactions
//! - No logging
//!
//! Dependencies are injected via traits:
//! - [`env::Env`] - Randomness and clock
//! - [`trust::AttestationPolicy`] - Which attestation certificates to accept
//! - [`authn::RegistrationStore`] - Registration lookup and atomic counter updates
//!
//! # Example
//!
//! ```ignore
//! use gatekey_auth::{new_challenge, register, verify_assertion, Config};
//!
//! let config = Config::default();
//!
//! // Registration
//! let challenge = new_challenge("https://example.com", ["https://example.com"], config.env())?;
//! let request = challenge.register_request(&[]);
//! // ... browser answers with a RegisterResponse
//! let registration = register(&response, &challenge, &config)?;
//! store.insert(registration);
//!
//! // Authentication
//! let challenge = new_challenge("https://example.com", ["https://example.com"], config.env())?;
//! let request = challenge.sign_request(&store.snapshot());
//! // ... browser answers with a SignResponse
//! let verified = verify_assertion(&response, &challenge, &store, &config)?;
//! ```

pub mod authn;
pub mod cert;
pub mod challenge;
pub mod client_data;
pub mod config;
pub mod crypto;
pub mod encoding;
pub mod env;
pub mod error;
pub mod registration;
pub mod trust;

#[cfg(test)]
mod test_fixtures;

/// Protocol version spoken by this crate.
pub const U2F_VERSION: &str = "U2F_V2";

pub use authn::{
    MemoryRegistrationStore, RegistrationStore, SignResponse, VerifiedAssertion, authenticate,
    verify_assertion,
};
pub use cert::{AttestationCertificate, CertError};
pub use challenge::{Challenge, RegisterRequestMessage, SignRequestMessage, new_challenge};
pub use client_data::{ClientData, ClientDataType};
pub use config::Config;
pub use env::{Env, FixedEnv, SystemEnv};
pub use error::U2fError;
pub use registration::{KeyHandle, RegisterResponse, Registration, register};
pub use trust::{AcceptAnyAttestation, AttestationDecision, AttestationPolicy, TrustedIssuers};
