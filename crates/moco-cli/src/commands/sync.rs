//! Sync command handlers

use anyhow::{bail, Context, Result};

use moco_core::{Config, HttpRemote, Identity, Library, SyncBridge, SyncOutcome};

use crate::output::Output;

/// Merge the user's remote articles into the local store
pub async fn pull(
    library: &Library,
    config: &Config,
    identity: &Identity,
    output: &Output,
) -> Result<()> {
    let bridge = bridge_for(config, identity)?;
    output.message("Pulling articles...");
    let outcome = library.sync_from_database(&bridge, identity).await;
    report(outcome, output)
}

/// Overwrite the user's remote articles with the local store
pub async fn push(
    library: &Library,
    config: &Config,
    identity: &Identity,
    output: &Output,
) -> Result<()> {
    let bridge = bridge_for(config, identity)?;
    output.message("Pushing articles...");
    let outcome = library.sync_to_database(&bridge, identity).await;
    report(outcome, output)
}

fn bridge_for(config: &Config, identity: &Identity) -> Result<SyncBridge<HttpRemote>> {
    if config.remote_url.is_none() {
        bail!(
            "Remote URL not configured. Set it with:\n  \
             moco config set remote_url https://your-project.firebaseio.com"
        );
    }

    let remote = HttpRemote::from_config(config)
        .context("Failed to create remote client")?
        .with_auth(identity.id_token().map(str::to_string));
    Ok(SyncBridge::new(remote))
}

fn report(outcome: SyncOutcome, output: &Output) -> Result<()> {
    match outcome {
        SyncOutcome::NotAuthenticated => {
            bail!("Not signed in. Run `moco login <user-id>` first.")
        }
        SyncOutcome::InFlight => {
            output.message("A sync for this user is already running");
        }
        SyncOutcome::Pulled(report) => {
            if output.is_json() {
                println!(
                    "{}",
                    serde_json::json!({
                        "status": "success",
                        "inserted": report.inserted,
                        "updated": report.updated,
                        "unchanged": report.unchanged,
                        "skipped": report.skipped
                    })
                );
            } else if report.changed() {
                output.success(&format!(
                    "Pull complete - {} new, {} updated",
                    report.inserted, report.updated
                ));
            } else {
                output.success("Pull complete - already up to date");
            }
        }
        SyncOutcome::Pushed { count } => {
            output.success(&format!("Push complete - {} article(s)", count));
        }
        SyncOutcome::Failed(message) => bail!("Sync failed: {}", message),
    }
    Ok(())
}
