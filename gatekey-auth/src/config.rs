//! Per-call verification configuration.
//!
//! A [`Config`] is passed explicitly to `register` and `authenticate`. It
//! bundles the environment (randomness and clock), the challenge timeout and
//! the attestation policy, so there is no ambient configuration anywhere in
//! the crate.

use std::sync::Arc;

use chrono::Duration;

use crate::challenge::Challenge;
use crate::env::{Env, SystemEnv};
use crate::error::U2fError;
use crate::trust::{AcceptAnyAttestation, AttestationPolicy};

/// Default lifetime of a challenge, in seconds.
pub const DEFAULT_CHALLENGE_TIMEOUT_SECS: i64 = 300;

/// Verification configuration.
#[derive(Clone)]
pub struct Config<E = SystemEnv> {
    env: E,
    challenge_timeout: Option<Duration>,
    attestation: Arc<dyn AttestationPolicy>,
}

impl Default for Config<SystemEnv> {
    fn default() -> Self {
        Self::new(SystemEnv)
    }
}

impl<E: Env> Config<E> {
    /// Create a configuration around `env` with default policies.
    ///
    /// Challenges expire after [`DEFAULT_CHALLENGE_TIMEOUT_SECS`] and every
    /// attestation certificate is accepted.
    #[must_use]
    pub fn new(env: E) -> Self {
        Self {
            env,
            challenge_timeout: Some(Duration::seconds(DEFAULT_CHALLENGE_TIMEOUT_SECS)),
            attestation: Arc::new(AcceptAnyAttestation),
        }
    }

    /// Set the challenge lifetime. `None` leaves expiry to the caller.
    #[must_use]
    pub fn with_challenge_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.challenge_timeout = timeout;
        self
    }

    /// Set the attestation policy applied by `register`.
    #[must_use]
    pub fn with_attestation_policy(mut self, policy: impl AttestationPolicy + 'static) -> Self {
        self.attestation = Arc::new(policy);
        self
    }

    /// The environment.
    #[must_use]
    pub fn env(&self) -> &E {
        &self.env
    }

    /// The challenge lifetime, if enforced.
    #[must_use]
    pub fn challenge_timeout(&self) -> Option<Duration> {
        self.challenge_timeout
    }

    /// The attestation policy.
    #[must_use]
    pub fn attestation_policy(&self) -> &dyn AttestationPolicy {
        self.attestation.as_ref()
    }

    /// Reject a challenge older than the configured timeout.
    pub(crate) fn check_challenge_age(&self, challenge: &Challenge) -> Result<(), U2fError> {
        match self.challenge_timeout {
            Some(timeout) if challenge.is_expired(self.env.now(), timeout) => {
                Err(U2fError::ChallengeExpired)
            }
            _ => Ok(()),
        }
    }
}

impl<E: std::fmt::Debug> std::fmt::Debug for Config<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("env", &self.env)
            .field("challenge_timeout", &self.challenge_timeout)
            .finish_non_exhaustive()
    }
}
