//! Software authenticator for integration tests.
//!
//! Builds genuine registration and sign responses: an rcgen-issued P-256
//! attestation certificate, per-credential p256 keys, and real signatures
//! over the U2F message layouts.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use gatekey_auth::crypto::sha256;
use gatekey_auth::encoding;
use gatekey_auth::{Challenge, Config, FixedEnv, RegisterResponse, SignResponse};
use p256::ecdsa::signature::Signer;
use p256::ecdsa::{Signature, SigningKey};
use p256::pkcs8::DecodePrivateKey;
use rand::rngs::OsRng;
use rand::RngCore;
use serde_json::json;

pub const APP_ID: &str = "https://gatekey.example";
pub const ATTESTATION_CN: &str = "Soft Token Attestation";

/// A fixed point in time shared by tests.
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

/// Config whose clock reads [`now`].
pub fn config() -> Config<FixedEnv> {
    Config::new(env(now()))
}

/// Environment with random challenge bytes at the given time.
pub fn env(at: DateTime<Utc>) -> FixedEnv {
    let mut bytes = vec![0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    FixedEnv::new(bytes, at).unwrap()
}

/// A fresh challenge for [`APP_ID`], issued at [`now`].
pub fn challenge() -> Challenge {
    gatekey_auth::new_challenge(APP_ID, [APP_ID], &env(now())).unwrap()
}

struct Credential {
    key_handle: Vec<u8>,
    key: SigningKey,
}

/// A U2F authenticator implemented in software.
pub struct SoftToken {
    attestation_der: Vec<u8>,
    attestation_key: SigningKey,
    credentials: Vec<Credential>,
    counter: u32,
    origin: String,
}

impl SoftToken {
    pub fn new() -> Self {
        let key_pair = rcgen::KeyPair::generate_for(&rcgen::PKCS_ECDSA_P256_SHA256).unwrap();
        let mut params = rcgen::CertificateParams::new(Vec::<String>::new()).unwrap();
        params
            .distinguished_name
            .push(rcgen::DnType::CommonName, ATTESTATION_CN);
        let cert = params.self_signed(&key_pair).unwrap();

        Self {
            attestation_der: cert.der().to_vec(),
            attestation_key: SigningKey::from_pkcs8_der(&key_pair.serialize_der()).unwrap(),
            credentials: Vec::new(),
            counter: 0,
            origin: APP_ID.to_string(),
        }
    }

    /// Answer from a different browser origin.
    pub fn with_origin(mut self, origin: &str) -> Self {
        self.origin = origin.to_string();
        self
    }

    /// Set the next counter value minus one.
    pub fn set_counter(&mut self, counter: u32) {
        self.counter = counter;
    }

    pub fn client_data(&self, typ: &str, challenge: &Challenge) -> String {
        let json = json!({
            "typ": typ,
            "challenge": challenge.encoded(),
            "origin": self.origin,
            "cid_pubkey": "",
        });
        encoding::encode(serde_json::to_vec(&json).unwrap())
    }

    /// Create a credential and answer a registration challenge.
    pub fn register(&mut self, challenge: &Challenge) -> RegisterResponse {
        let mut key_handle = vec![0u8; 64];
        OsRng.fill_bytes(&mut key_handle);
        let key = SigningKey::random(&mut OsRng);
        let public_key = key.verifying_key().to_encoded_point(false);

        let client_data = self.client_data("navigator.id.finishEnrollment", challenge);
        let raw_client_data = encoding::decode(&client_data, "clientData").unwrap();

        let mut message = vec![0x00];
        message.extend_from_slice(&sha256(challenge.app_id().as_bytes()));
        message.extend_from_slice(&sha256(&raw_client_data));
        message.extend_from_slice(&key_handle);
        message.extend_from_slice(public_key.as_bytes());
        let signature: Signature = self.attestation_key.sign(&message);

        let mut data = vec![0x05];
        data.extend_from_slice(public_key.as_bytes());
        data.push(key_handle.len() as u8);
        data.extend_from_slice(&key_handle);
        data.extend_from_slice(&self.attestation_der);
        data.extend_from_slice(signature.to_der().as_bytes());

        self.credentials.push(Credential { key_handle, key });

        RegisterResponse {
            registration_data: encoding::encode(&data),
            client_data,
            version: gatekey_auth::U2F_VERSION.to_string(),
        }
    }

    /// Answer a sign challenge with the most recent credential.
    pub fn sign(&mut self, challenge: &Challenge) -> SignResponse {
        self.sign_with_flags(challenge, 0x01)
    }

    pub fn sign_with_flags(&mut self, challenge: &Challenge, flags: u8) -> SignResponse {
        self.counter += 1;
        let credential = self.credentials.last().unwrap();

        let client_data = self.client_data("navigator.id.getAssertion", challenge);
        let raw_client_data = encoding::decode(&client_data, "clientData").unwrap();

        let mut message = Vec::with_capacity(69);
        message.extend_from_slice(&sha256(challenge.app_id().as_bytes()));
        message.push(flags);
        message.extend_from_slice(&self.counter.to_be_bytes());
        message.extend_from_slice(&sha256(&raw_client_data));
        let signature: Signature = credential.key.sign(&message);

        let mut data = vec![flags];
        data.extend_from_slice(&self.counter.to_be_bytes());
        data.extend_from_slice(signature.to_der().as_bytes());

        SignResponse {
            key_handle: encoding::encode(&credential.key_handle),
            client_data,
            signature_data: encoding::encode(&data),
        }
    }
}
