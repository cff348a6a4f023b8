//! Authentication of registered authenticators.
//!
//! The authentication flow is:
//! 1. Server issues a [`Challenge`](crate::Challenge) and sends
//!    [`Challenge::sign_request`](crate::Challenge::sign_request)
//! 2. The authenticator signs the challenge with the credential key and
//!    increments its counter
//! 3. Server verifies the [`SignResponse`] with [`authenticate`] (or
//!    [`verify_assertion`] when a [`RegistrationStore`] is available)
//! 4. The new counter is persisted

mod response;
mod store;
mod verify;

pub use response::{SignResponse, USER_PRESENCE_FLAG};
pub use store::MemoryRegistrationStore;
pub use verify::{authenticate, verify_assertion, RegistrationStore, VerifiedAssertion};
