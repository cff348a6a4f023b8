//! Registration verification.

use super::response::{build_registration_message, RegistrationData};
use super::{RegisterResponse, Registration};
use crate::challenge::Challenge;
use crate::client_data::{validate_client_data, ClientDataType};
use crate::config::Config;
use crate::encoding;
use crate::env::Env;
use crate::error::U2fError;
use crate::trust::evaluate_attestation;
use crate::U2F_VERSION;

/// Verify a registration response and produce the new [`Registration`].
///
/// Steps, in order:
/// 1. Challenge age against `config` (if a timeout is set)
/// 2. Protocol version
/// 3. Client data: type, challenge, origin
/// 4. Raw registration message parsing
/// 5. Attestation signature, using the key in the attestation certificate
/// 6. Attestation policy from `config`
///
/// The attestation issuer chain is not validated cryptographically; use an
/// [`AttestationPolicy`](crate::trust::AttestationPolicy) for vendor trust.
///
/// # Errors
///
/// Returns `ChallengeExpired`, `Protocol`, `Format`, `ReplayMismatch`,
/// `Origin`, `Signature` or `Attestation`; see [`U2fError`].
#[must_use = "registration result must be checked"]
pub fn register<E: Env>(
    response: &RegisterResponse,
    challenge: &Challenge,
    config: &Config<E>,
) -> Result<Registration, U2fError> {
    config.check_challenge_age(challenge)?;

    if !response.version.is_empty() && response.version != U2F_VERSION {
        return Err(U2fError::protocol(format!(
            "unsupported version {:?}",
            response.version
        )));
    }

    let params = validate_client_data(ClientDataType::Enrollment, &response.client_data, challenge)?;

    let raw = encoding::decode(&response.registration_data, "registrationData")?;
    let data = RegistrationData::parse(&raw)?;

    let message = build_registration_message(
        &params.app_param,
        &params.challenge_param,
        &data.key_handle,
        &data.raw_public_key,
    );
    if !data
        .certificate
        .public_key()
        .verify(&message, &data.signature)
    {
        return Err(U2fError::Signature);
    }

    // Policy runs only on proven certificates
    evaluate_attestation(config.attestation_policy(), &data.certificate)?;

    Ok(Registration::new(
        data.key_handle,
        data.public_key,
        data.certificate,
    ))
}
