//! Request messages handed to the browser's U2F JavaScript API.
//!
//! These mirror the `u2f.register` / `u2f.sign` request dictionaries:
//!
//! ```json
//! {"appId": "...", "registerRequests": [{"version": "U2F_V2", "challenge": "...", "appId": "..."}],
//!  "registeredKeys": [{"version": "U2F_V2", "keyHandle": "...", "appId": "..."}]}
//! ```

use serde::{Deserialize, Serialize};

use super::Challenge;
use crate::registration::Registration;
use crate::U2F_VERSION;

/// A single registration request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// Protocol version, always `U2F_V2`.
    pub version: String,
    /// Base64url challenge.
    pub challenge: String,
    /// App ID the challenge was issued for.
    pub app_id: String,
}

/// An already registered key, so the browser can skip or select it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredKey {
    /// Protocol version, always `U2F_V2`.
    pub version: String,
    /// Base64url key handle.
    pub key_handle: String,
    /// App ID the key was registered under. Always set on messages built
    /// here; may be absent in messages from older clients.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,
}

/// Payload for `u2f.register`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequestMessage {
    /// App ID of the relying party.
    pub app_id: String,
    /// One request per supported version; only `U2F_V2` is issued.
    pub register_requests: Vec<RegisterRequest>,
    /// Keys already registered for the account.
    pub registered_keys: Vec<RegisteredKey>,
}

/// Payload for `u2f.sign`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignRequestMessage {
    /// App ID of the relying party.
    pub app_id: String,
    /// Base64url challenge.
    pub challenge: String,
    /// Keys the browser may sign with.
    pub registered_keys: Vec<RegisteredKey>,
}

impl Challenge {
    /// Build the registration request for this challenge.
    ///
    /// `existing` lists the account's current registrations; the browser
    /// uses them to refuse registering the same authenticator twice.
    #[must_use]
    pub fn register_request(&self, existing: &[Registration]) -> RegisterRequestMessage {
        RegisterRequestMessage {
            app_id: self.app_id.clone(),
            register_requests: vec![RegisterRequest {
                version: U2F_VERSION.to_string(),
                challenge: self.encoded(),
                app_id: self.app_id.clone(),
            }],
            registered_keys: self.registered_keys(existing),
        }
    }

    /// Build the sign request for this challenge.
    #[must_use]
    pub fn sign_request(&self, registrations: &[Registration]) -> SignRequestMessage {
        SignRequestMessage {
            app_id: self.app_id.clone(),
            challenge: self.encoded(),
            registered_keys: self.registered_keys(registrations),
        }
    }

    fn registered_keys(&self, registrations: &[Registration]) -> Vec<RegisteredKey> {
        registrations
            .iter()
            .map(|registration| RegisteredKey {
                version: U2F_VERSION.to_string(),
                key_handle: registration.key_handle().to_base64(),
                app_id: Some(self.app_id.clone()),
            })
            .collect()
    }
}
