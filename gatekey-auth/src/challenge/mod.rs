//! Challenge generation.
//!
//! A [`Challenge`] binds 32 fresh random bytes to an app ID and the set of
//! origins (facets) allowed to answer for it. The authenticator signs over a
//! hash of client data that echoes the challenge, so every response is tied
//! to exactly one issued challenge.
//!
//! # Lifecycle
//!
//! 1. Server calls [`new_challenge`] and hands the request message
//!    ([`Challenge::register_request`] / [`Challenge::sign_request`]) to the
//!    browser
//! 2. Server keeps the `Challenge` until the response arrives
//! 3. The response is verified against it exactly once, then it is discarded

mod request;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::encoding;
use crate::env::Env;
use crate::error::U2fError;

pub use request::{RegisterRequest, RegisterRequestMessage, RegisteredKey, SignRequestMessage};

/// Number of random bytes in a challenge.
pub const CHALLENGE_LEN: usize = 32;

/// An issued challenge.
///
/// Immutable once created. Deserialization re-checks the same invariants as
/// [`new_challenge`].
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ChallengeRecord", into = "ChallengeRecord")]
pub struct Challenge {
    app_id: String,
    trusted_facets: Vec<String>,
    random: [u8; CHALLENGE_LEN],
    created_at: DateTime<Utc>,
}

/// Issue a new challenge for `app_id`.
///
/// Duplicate facets are collapsed, keeping first-seen order.
///
/// # Errors
///
/// Returns `U2fError::Config` if `app_id` is empty, no facets are given, or
/// a facet is empty.
pub fn new_challenge<I, S>(app_id: &str, trusted_facets: I, env: &impl Env) -> Result<Challenge, U2fError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let trusted_facets = normalize_facets(app_id, trusted_facets)?;

    let mut random = [0u8; CHALLENGE_LEN];
    let bytes = env.next_bytes(CHALLENGE_LEN);
    if bytes.len() != CHALLENGE_LEN {
        return Err(U2fError::Config(format!(
            "random source returned {} bytes, expected {CHALLENGE_LEN}",
            bytes.len()
        )));
    }
    random.copy_from_slice(&bytes);

    Ok(Challenge {
        app_id: app_id.to_string(),
        trusted_facets,
        random,
        created_at: env.now(),
    })
}

fn normalize_facets<I, S>(app_id: &str, trusted_facets: I) -> Result<Vec<String>, U2fError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    if app_id.is_empty() {
        return Err(U2fError::Config("app ID must not be empty".to_string()));
    }

    let mut facets: Vec<String> = Vec::new();
    for facet in trusted_facets {
        let facet = facet.into();
        if facet.is_empty() {
            return Err(U2fError::Config("trusted facet must not be empty".to_string()));
        }
        if !facets.contains(&facet) {
            facets.push(facet);
        }
    }

    if facets.is_empty() {
        return Err(U2fError::Config(
            "at least one trusted facet is required".to_string(),
        ));
    }
    Ok(facets)
}

impl Challenge {
    /// The app ID this challenge was issued for.
    #[must_use]
    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    /// Origins allowed to answer this challenge.
    #[must_use]
    pub fn trusted_facets(&self) -> &[String] {
        &self.trusted_facets
    }

    /// Check if `origin` is one of the trusted facets.
    #[must_use]
    pub fn is_trusted_facet(&self, origin: &str) -> bool {
        self.trusted_facets.iter().any(|facet| facet == origin)
    }

    /// The raw challenge bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; CHALLENGE_LEN] {
        &self.random
    }

    /// The challenge as sent to the browser: unpadded base64url.
    #[must_use]
    pub fn encoded(&self) -> String {
        encoding::encode(self.random)
    }

    /// When the challenge was issued.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Check if the challenge is older than `timeout` at `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>, timeout: Duration) -> bool {
        now.signed_duration_since(self.created_at) > timeout
    }
}

impl std::fmt::Debug for Challenge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Challenge")
            .field("app_id", &self.app_id)
            .field("trusted_facets", &self.trusted_facets)
            .field("challenge", &self.encoded())
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Serialized form of a [`Challenge`].
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChallengeRecord {
    app_id: String,
    trusted_facets: Vec<String>,
    #[serde(with = "encoding::array32")]
    challenge: [u8; CHALLENGE_LEN],
    created_at: DateTime<Utc>,
}

impl TryFrom<ChallengeRecord> for Challenge {
    type Error = U2fError;

    fn try_from(record: ChallengeRecord) -> Result<Self, Self::Error> {
        let trusted_facets = normalize_facets(&record.app_id, record.trusted_facets)?;
        Ok(Self {
            app_id: record.app_id,
            trusted_facets,
            random: record.challenge,
            created_at: record.created_at,
        })
    }
}

impl From<Challenge> for ChallengeRecord {
    fn from(challenge: Challenge) -> Self {
        Self {
            app_id: challenge.app_id,
            trusted_facets: challenge.trusted_facets,
            challenge: challenge.random,
            created_at: challenge.created_at,
        }
    }
}
