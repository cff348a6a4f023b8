//! Issue registration and sign challenges.

use std::io::Write;

use anyhow::{Context as _, Result};
use gatekey_auth::new_challenge;

use super::{write_json, Context};
use crate::store::Ceremony;

/// Issue a challenge, record it as pending and print the browser request.
pub fn issue(ctx: &Context, ceremony: Ceremony, out: &mut impl Write) -> Result<()> {
    let app_id = ctx.config.app_id()?;
    let facets = ctx.config.facets()?;
    let verifier = ctx.config.verifier();

    let mut lock = ctx.store_lock()?;
    let mut store = lock.lock()?;
    if ceremony == Ceremony::Sign && store.devices().is_empty() {
        anyhow::bail!("No devices registered; run `gatekey challenge register` first");
    }

    let challenge =
        new_challenge(app_id, facets, verifier.env()).context("Failed to issue challenge")?;

    match ceremony {
        Ceremony::Register => write_json(out, &challenge.register_request(store.devices()))?,
        Ceremony::Sign => write_json(out, &challenge.sign_request(store.devices()))?,
    }

    tracing::info!(%ceremony, challenge = %challenge.encoded(), "Issued challenge");
    store.add_pending(ceremony, challenge);
    store.save()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support;

    #[test]
    fn test_register_request_is_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = test_support::context(&dir);

        let mut out = Vec::new();
        issue(&ctx, Ceremony::Register, &mut out).unwrap();

        let request: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(request["appId"], test_support::APP_ID);
        assert_eq!(request["registerRequests"][0]["version"], "U2F_V2");

        let mut lock = ctx.store_lock().unwrap();
        let store = lock.lock().unwrap();
        assert_eq!(store.pending().len(), 1);
        assert_eq!(
            request["registerRequests"][0]["challenge"],
            store.pending()[0].challenge.encoded()
        );
    }

    #[test]
    fn test_sign_requires_devices() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = test_support::context(&dir);

        assert!(issue(&ctx, Ceremony::Sign, &mut Vec::new()).is_err());
        assert!(ctx.store_lock().unwrap().lock().unwrap().pending().is_empty());
    }

    #[test]
    fn test_sign_request_lists_devices() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = test_support::context(&dir);
        test_support::register_fixture(&ctx);

        let mut out = Vec::new();
        issue(&ctx, Ceremony::Sign, &mut out).unwrap();

        let request: serde_json::Value = serde_json::from_slice(&out).unwrap();
        let keys = request["registeredKeys"].as_array().unwrap();
        assert_eq!(keys.len(), 1);
        assert_eq!(
            keys[0]["keyHandle"],
            ctx.store_lock().unwrap().lock().unwrap().devices()[0].key_handle().to_base64()
        );
    }

    #[test]
    fn test_missing_app_id() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = test_support::context(&dir);
        ctx.config.app_id = None;

        let err = issue(&ctx, Ceremony::Register, &mut Vec::new()).unwrap_err();
        assert!(err.to_string().contains("No app ID configured"));
    }
}
