//! Injected side effects: randomness and wall-clock time.
//!
//! Challenge generation and challenge expiry are the only operations that
//! touch the outside world. Both go through [`Env`], passed explicitly at
//! the call site, so tests can make them deterministic without any global
//! state.

use chrono::{DateTime, Utc};
use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::U2fError;

/// Describes what the verifier needs from its environment.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` so a single environment can be
/// shared by concurrent registrations and authentications.
pub trait Env: Send + Sync {
    /// Return `n` random bytes.
    fn next_bytes(&self, n: usize) -> Vec<u8>;

    /// Return the current time.
    fn now(&self) -> DateTime<Utc>;
}

impl<E: Env + ?Sized> Env for &E {
    fn next_bytes(&self, n: usize) -> Vec<u8> {
        (**self).next_bytes(n)
    }

    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

/// Production environment: operating system CSPRNG and system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

impl Env for SystemEnv {
    fn next_bytes(&self, n: usize) -> Vec<u8> {
        let mut bytes = vec![0u8; n];
        OsRng.fill_bytes(&mut bytes);
        bytes
    }

    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Deterministic environment for tests and replaying captured traffic.
///
/// Every `next_bytes` call starts again from the beginning of the configured
/// byte string, cycling it if more bytes are requested than were given, and
/// `now` always returns the same instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedEnv {
    bytes: Vec<u8>,
    now: DateTime<Utc>,
}

impl FixedEnv {
    /// Create a fixed environment.
    ///
    /// # Errors
    ///
    /// Returns `U2fError::Config` if `bytes` is empty.
    pub fn new(bytes: impl Into<Vec<u8>>, now: DateTime<Utc>) -> Result<Self, U2fError> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(U2fError::Config(
                "fixed environment needs at least one random byte".to_string(),
            ));
        }
        Ok(Self { bytes, now })
    }

    /// Return a copy of this environment with the clock set to `now`.
    #[must_use]
    pub fn at(&self, now: DateTime<Utc>) -> Self {
        Self {
            bytes: self.bytes.clone(),
            now,
        }
    }
}

impl Env for FixedEnv {
    fn next_bytes(&self, n: usize) -> Vec<u8> {
        self.bytes.iter().copied().cycle().take(n).collect()
    }

    fn now(&self) -> DateTime<Utc> {
        self.now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_system_env_returns_requested_length() {
        let env = SystemEnv;
        assert_eq!(env.next_bytes(32).len(), 32);
        assert!(env.next_bytes(0).is_empty());
    }

    #[test]
    fn test_system_env_bytes_differ() {
        let env = SystemEnv;
        assert_ne!(env.next_bytes(32), env.next_bytes(32));
    }

    #[test]
    fn test_fixed_env_is_repeatable() {
        let now = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let env = FixedEnv::new(vec![1, 2, 3], now).unwrap();

        assert_eq!(env.next_bytes(5), vec![1, 2, 3, 1, 2]);
        assert_eq!(env.next_bytes(2), vec![1, 2]);
        assert_eq!(env.now(), now);
    }

    #[test]
    fn test_fixed_env_rejects_empty_bytes() {
        let err = FixedEnv::new(Vec::new(), Utc::now()).unwrap_err();
        assert!(matches!(err, U2fError::Config(_)));
    }

    #[test]
    fn test_fixed_env_at_moves_clock_only() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let t1 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 1, 0).unwrap();
        let env = FixedEnv::new(vec![9], t0).unwrap().at(t1);

        assert_eq!(env.now(), t1);
        assert_eq!(env.next_bytes(1), vec![9]);
    }
}
