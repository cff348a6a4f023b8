//! Cryptographic primitives for U2F verification.
//!
//! U2F fixes the algorithm suite: SHA-256 digests and ECDSA over NIST P-256.
//!
//! - [`PublicKey`] - An uncompressed P-256 point as carried in U2F messages
//! - [`Signature`] - A DER-encoded ECDSA signature
//! - [`sha256`] - The digest used for the app and challenge parameters
//!
//! # Example
//!
//! ```
//! use gatekey_auth::crypto::sha256;
//!
//! let app_param = sha256(b"https://example.com");
//! assert_eq!(app_param.len(), 32);
//! ```

mod keys;

pub use keys::{sha256, PublicKey, Signature, PUBLIC_KEY_LEN};
