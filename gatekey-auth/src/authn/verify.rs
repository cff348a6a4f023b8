//! Authentication verification.
//!
//! [`authenticate`] is the pure check against one registration and a
//! caller-supplied counter. [`verify_assertion`] drives it through a
//! [`RegistrationStore`] and commits the new counter.

use subtle::ConstantTimeEq;

use super::response::{build_authentication_message, SignResponse, SignatureData};
use crate::challenge::Challenge;
use crate::client_data::{validate_client_data, ClientDataType};
use crate::config::Config;
use crate::encoding;
use crate::env::Env;
use crate::error::U2fError;
use crate::registration::{KeyHandle, Registration};

/// Storage of registrations keyed by key handle.
///
/// # Thread Safety
///
/// Uses `&self` to allow concurrent access. Implementations should
/// use interior mutability (e.g., `Mutex`, `DashMap`).
///
/// # Atomicity
///
/// `compare_and_set_counter` **MUST be atomic**:
/// - Comparing the stored counter and writing the new one happen as a
///   single logical operation
/// - No other thread may observe or change the counter in between
///
/// A non-atomic implementation lets two concurrent assertions carrying the
/// same counter both succeed, which defeats clone detection.
pub trait RegistrationStore: Send + Sync {
    /// Look up the registration for a key handle.
    fn lookup(&self, key_handle: &KeyHandle) -> Option<Registration>;

    /// Replace the stored counter with `new` if it still equals `expected`.
    ///
    /// Returns `true` if the counter was updated, `false` if the key handle
    /// is unknown or the stored counter has changed.
    fn compare_and_set_counter(&self, key_handle: &KeyHandle, expected: u32, new: u32) -> bool;
}

impl<S: RegistrationStore + ?Sized> RegistrationStore for &S {
    fn lookup(&self, key_handle: &KeyHandle) -> Option<Registration> {
        (**self).lookup(key_handle)
    }

    fn compare_and_set_counter(&self, key_handle: &KeyHandle, expected: u32, new: u32) -> bool {
        (**self).compare_and_set_counter(key_handle, expected, new)
    }
}

/// Result of a successful, committed authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedAssertion {
    key_handle: KeyHandle,
    counter: u32,
}

impl VerifiedAssertion {
    /// Create a new verified assertion.
    ///
    /// # Visibility
    ///
    /// This constructor is crate-private so a `VerifiedAssertion` only comes
    /// out of [`verify_assertion`], after the signature has been checked and
    /// the counter committed.
    #[must_use]
    pub(crate) fn new(key_handle: KeyHandle, counter: u32) -> Self {
        Self {
            key_handle,
            counter,
        }
    }

    /// The authenticated key handle.
    #[must_use]
    pub fn key_handle(&self) -> &KeyHandle {
        &self.key_handle
    }

    /// The counter now stored for this key handle.
    #[must_use]
    pub fn counter(&self) -> u32 {
        self.counter
    }
}

/// Verify a sign response and return the authenticator's new counter.
///
/// Steps, in order:
/// 1. Challenge age against `config` (if a timeout is set)
/// 2. Client data: type, challenge, origin
/// 3. Key handle matches `registration`
/// 4. Signature data parsing, including the user presence flag
/// 5. Signature, using the registration's public key
/// 6. Counter strictly greater than `last_counter`
///
/// Nothing is persisted; the caller stores the returned counter.
///
/// # Errors
///
/// Returns `ChallengeExpired`, `Format`, `Protocol`, `ReplayMismatch`,
/// `Origin`, `UserNotPresent`, `Signature` or `Counter`; see [`U2fError`].
#[must_use = "verification result must be checked"]
pub fn authenticate<E: Env>(
    response: &SignResponse,
    challenge: &Challenge,
    registration: &Registration,
    last_counter: u32,
    config: &Config<E>,
) -> Result<u32, U2fError> {
    config.check_challenge_age(challenge)?;

    let params = validate_client_data(ClientDataType::Assertion, &response.client_data, challenge)?;

    let key_handle = encoding::decode(&response.key_handle, "keyHandle")?;
    let same_handle: bool = key_handle
        .as_slice()
        .ct_eq(registration.key_handle().as_bytes())
        .into();
    if !same_handle {
        return Err(U2fError::protocol("keyHandle does not match the registration"));
    }

    let raw = encoding::decode(&response.signature_data, "signatureData")?;
    let data = SignatureData::parse(&raw)?;

    let message = build_authentication_message(
        &params.app_param,
        data.flags,
        data.counter,
        &params.challenge_param,
    );
    if !registration.public_key().verify(&message, &data.signature) {
        return Err(U2fError::Signature);
    }

    // Equal counters are replays
    if data.counter <= last_counter {
        return Err(U2fError::Counter {
            last: last_counter,
            received: data.counter,
        });
    }

    Ok(data.counter)
}

impl Registration {
    /// Verify a sign response against this registration's stored counter.
    ///
    /// Shorthand for [`authenticate`] with `last_counter = self.counter()`.
    ///
    /// # Errors
    ///
    /// See [`authenticate`].
    #[must_use = "verification result must be checked"]
    pub fn authenticate<E: Env>(
        &self,
        response: &SignResponse,
        challenge: &Challenge,
        config: &Config<E>,
    ) -> Result<u32, U2fError> {
        authenticate(response, challenge, self, self.counter(), config)
    }
}

/// Verify a sign response against a store and commit the new counter.
///
/// The key handle in `response` selects the registration; the counter is
/// committed with [`RegistrationStore::compare_and_set_counter`] only after
/// [`authenticate`] succeeds.
///
/// # Errors
///
/// - `U2fError::Format` if the key handle is not valid base64url
/// - `U2fError::UnknownKeyHandle` if the store has no such registration
/// - `U2fError::Counter` if a concurrent assertion committed first; `last`
///   is the counter stored after that commit
/// - any error of [`authenticate`]
#[must_use = "verification result must be checked"]
pub fn verify_assertion<E: Env>(
    response: &SignResponse,
    challenge: &Challenge,
    store: &impl RegistrationStore,
    config: &Config<E>,
) -> Result<VerifiedAssertion, U2fError> {
    let key_handle = KeyHandle::from_base64(&response.key_handle)?;
    let registration = store
        .lookup(&key_handle)
        .ok_or(U2fError::UnknownKeyHandle)?;

    let last = registration.counter();
    let counter = authenticate(response, challenge, &registration, last, config)?;

    if !store.compare_and_set_counter(&key_handle, last, counter) {
        // Report the counter the winning assertion left behind
        let last = store.lookup(&key_handle).map_or(last, |r| r.counter());
        return Err(U2fError::Counter {
            last,
            received: counter,
        });
    }

    Ok(VerifiedAssertion::new(key_handle, counter))
}
