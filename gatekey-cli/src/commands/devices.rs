//! Inspect and maintain the device store.

use std::io::Write;

use anyhow::Result;
use chrono::Utc;

use super::{write_json, Context, DeviceSummary};
use crate::utils::format_timestamp;

/// List registered devices.
pub fn list(ctx: &Context, out: &mut impl Write) -> Result<()> {
    let mut lock = ctx.store_lock()?;
    let store = lock.lock()?;
    let devices: Vec<DeviceSummary> = store.devices().iter().map(DeviceSummary::from).collect();

    if ctx.json {
        return write_json(out, &devices);
    }

    if devices.is_empty() {
        writeln!(out, "No registered devices")?;
        return Ok(());
    }

    writeln!(out, "Registered Devices:")?;
    writeln!(out, "{:-<60}", "")?;
    for device in &devices {
        writeln!(out, "  {}", device.key_handle)?;
        writeln!(out, "    Counter:     {}", device.counter)?;
        writeln!(out, "    Attestation: {}", device.subject)?;
        writeln!(out, "    Issuer:      {}", device.issuer)?;
        writeln!(out)?;
    }
    writeln!(out, "Total: {} device(s)", devices.len())?;

    if !store.pending().is_empty() {
        writeln!(out, "\nPending challenges:")?;
        for pending in store.pending() {
            writeln!(
                out,
                "  {:<12} issued {}",
                pending.ceremony.to_string(),
                format_timestamp(pending.challenge.created_at())
            )?;
        }
    }
    Ok(())
}

/// Drop pending challenges older than the configured timeout.
pub fn prune(ctx: &Context, out: &mut impl Write) -> Result<()> {
    let Some(timeout) = ctx.config.challenge_timeout() else {
        tracing::warn!("Challenge expiry is disabled; nothing to prune");
        writeln!(out, "Challenge expiry is disabled; nothing pruned")?;
        return Ok(());
    };

    let mut lock = ctx.store_lock()?;
    let mut store = lock.lock()?;
    let removed = store.prune(Utc::now(), timeout);
    store.save()?;

    tracing::info!(removed, remaining = store.pending().len(), "Pruned pending challenges");
    writeln!(out, "Pruned {removed} pending challenge(s)")?;
    Ok(())
}
