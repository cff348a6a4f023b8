//! Captured traffic from a YubiKey registering and authenticating in Chrome.

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::authn::SignResponse;
use crate::challenge::{new_challenge, Challenge};
use crate::config::Config;
use crate::encoding;
use crate::env::FixedEnv;
use crate::registration::{register, RegisterResponse, Registration};

pub const APP_ID: &str = "http://localhost:3483";

pub const REGISTER_CHALLENGE: &str = "s4UJ3wkN80p4wLjyI2Guv-_a-s7LV54Ic9PAZvHo_lM";

pub const SIGN_CHALLENGE: &str = "PzN6SGiUaeypErE3SCHeRlkRxVwfWlGVi35gfq6LsdY";

pub const KEY_HANDLE: &str =
    "mZmRK_1ltMrPtNU7qOc5woatIdvXkkNq0wwXEfE3kFHnoITeyPXSO0Y5juzNAiLhEZTqQ40i6uIBqvG4QUnkiw";

pub const REGISTER_RESPONSE_JSON: &str = include_str!("../../testdata/register_response.json");

pub const SIGN_RESPONSE_JSON: &str = include_str!("../../testdata/sign_response.json");

/// Issuer of the captured attestation certificate.
pub const ATTESTATION_ISSUER: &str = "CN=Yubico U2F Root CA Serial 457200631";

/// "Now" for every fixture; challenges are issued one minute earlier.
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

pub fn challenge(encoded: &str) -> Challenge {
    let bytes = encoding::decode(encoded, "challenge").unwrap();
    let env = FixedEnv::new(bytes, now() - Duration::minutes(1)).unwrap();
    new_challenge(APP_ID, [APP_ID], &env).unwrap()
}

pub fn config() -> Config<FixedEnv> {
    Config::new(FixedEnv::new(vec![0], now()).unwrap())
}

pub fn register_response() -> RegisterResponse {
    serde_json::from_str(REGISTER_RESPONSE_JSON).unwrap()
}

pub fn sign_response() -> SignResponse {
    serde_json::from_str(SIGN_RESPONSE_JSON).unwrap()
}

pub fn registration() -> Registration {
    register(&register_response(), &challenge(REGISTER_CHALLENGE), &config()).unwrap()
}
