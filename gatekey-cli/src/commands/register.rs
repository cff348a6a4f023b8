//! Verify a registration response and store the new device.

use std::io::Write;

use anyhow::{Context as _, Result};
use gatekey_auth::{register, RegisterResponse};

use super::{consume_challenge, write_json, Context, DeviceSummary};
use crate::store::Ceremony;

/// Register the device described by `input`, a `RegisterResponse` document.
pub fn run(ctx: &Context, input: &str, out: &mut impl Write) -> Result<()> {
    let response: RegisterResponse =
        serde_json::from_str(input).context("Invalid registration response")?;

    let mut lock = ctx.store_lock()?;
    let mut store = lock.lock()?;
    let challenge = consume_challenge(&mut store, Ceremony::Register, &response.client_data)?;

    let registration = match register(&response, &challenge, &ctx.config.verifier()) {
        Ok(registration) => registration,
        Err(e) => {
            tracing::warn!(error = %e, "Registration rejected");
            return Err(e).context("Registration failed");
        }
    };

    let summary = DeviceSummary::from(&registration);
    store.add_device(registration)?;
    store.save()?;
    tracing::info!(key_handle = %summary.key_handle, issuer = %summary.issuer, "Registered device");

    if ctx.json {
        write_json(out, &summary)?;
    } else {
        writeln!(out, "Registered {}", summary.key_handle)?;
        writeln!(out, "  Attestation: {}", summary.subject)?;
        writeln!(out, "  Issuer:      {}", summary.issuer)?;
    }
    Ok(())
}
