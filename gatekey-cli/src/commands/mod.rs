//! CLI commands.
//!
//! Every command writes its result to `out` so tests can capture it; logs
//! go to stderr.

pub mod authenticate;
pub mod challenge;
pub mod devices;
pub mod register;

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context as _, Result};
use gatekey_auth::{ClientData, Registration};
use serde::Serialize;

use crate::config::CliConfig;
use crate::store::{Ceremony, DeviceStore, StoreLock};

/// Settings shared by every command.
#[derive(Debug, Clone)]
pub struct Context {
    pub config: CliConfig,
    pub store_path: PathBuf,
    pub json: bool,
}

impl Context {
    /// Lock file for the device store. Commands hold its lock for their
    /// whole read-verify-save cycle.
    pub fn store_lock(&self) -> Result<StoreLock> {
        StoreLock::new(&self.store_path)
    }
}

/// Summary of a registered device.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceSummary {
    pub key_handle: String,
    pub counter: u32,
    pub issuer: String,
    pub subject: String,
}

impl From<&Registration> for DeviceSummary {
    fn from(registration: &Registration) -> Self {
        Self {
            key_handle: registration.key_handle().to_base64(),
            counter: registration.counter(),
            issuer: registration.certificate().issuer().to_string(),
            subject: registration.certificate().subject().to_string(),
        }
    }
}

/// Find and remove the pending challenge a response answers.
///
/// The store is saved immediately, so a challenge is consumed even when
/// verification fails afterwards.
fn consume_challenge(
    store: &mut DeviceStore<'_>,
    ceremony: Ceremony,
    client_data: &str,
) -> Result<gatekey_auth::Challenge> {
    let client_data = ClientData::decode(client_data).context("Invalid client data")?;
    let challenge = store
        .take_pending(ceremony, &client_data.challenge)
        .with_context(|| {
            format!(
                "No pending {ceremony} challenge matches {}",
                client_data.challenge
            )
        })?;
    store.save()?;
    tracing::debug!(%ceremony, challenge = %client_data.challenge, "Consumed pending challenge");
    Ok(challenge)
}

fn write_json(out: &mut impl Write, value: &impl Serialize) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}
