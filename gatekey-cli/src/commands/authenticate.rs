//! Verify a sign response and persist the new counter.

use std::io::Write;

use anyhow::{Context as _, Result};
use gatekey_auth::{verify_assertion, SignResponse};
use serde::Serialize;

use super::{consume_challenge, write_json, Context};
use crate::store::Ceremony;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AssertionSummary {
    key_handle: String,
    counter: u32,
}

/// Authenticate with `input`, a `SignResponse` document.
pub fn run(ctx: &Context, input: &str, out: &mut impl Write) -> Result<()> {
    let response: SignResponse =
        serde_json::from_str(input).context("Invalid sign response")?;

    let mut lock = ctx.store_lock()?;
    let mut store = lock.lock()?;
    let challenge = consume_challenge(&mut store, Ceremony::Sign, &response.client_data)?;

    let registrations = store.registrations();
    let verified = match verify_assertion(&response, &challenge, &registrations, &ctx.config.verifier())
    {
        Ok(verified) => verified,
        Err(e) => {
            tracing::warn!(key_handle = %response.key_handle, error = %e, "Authentication rejected");
            return Err(e).context("Authentication failed");
        }
    };

    store.sync_devices(&registrations);
    store.save()?;

    let summary = AssertionSummary {
        key_handle: verified.key_handle().to_base64(),
        counter: verified.counter(),
    };
    tracing::info!(key_handle = %summary.key_handle, counter = summary.counter, "Authenticated");

    if ctx.json {
        write_json(out, &summary)?;
    } else {
        writeln!(out, "Authenticated {} (counter {})", summary.key_handle, summary.counter)?;
    }
    Ok(())
}
