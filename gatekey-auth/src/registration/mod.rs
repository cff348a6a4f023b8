//! Authenticator registration.
//!
//! The registration flow is:
//! 1. Server issues a [`Challenge`](crate::Challenge) and sends
//!    [`Challenge::register_request`](crate::Challenge::register_request)
//! 2. The authenticator creates a key pair and signs it with its
//!    attestation key
//! 3. Server verifies the [`RegisterResponse`] with [`register`]
//! 4. On success the caller stores the resulting [`Registration`]

mod key_handle;
mod record;
mod response;
mod verify;

pub use key_handle::{KeyHandle, MAX_KEY_HANDLE_LEN};
pub use record::Registration;
pub use response::{RegisterResponse, REGISTRATION_RESERVED_BYTE};
pub use verify::register;
