//! Sign-in command handlers

use anyhow::{bail, Result};

use moco_core::{Identity, Library};

use crate::output::Output;

/// Record the signed-in user
pub fn login(
    identity: &mut Identity,
    user_id: &str,
    token: Option<String>,
    output: &Output,
) -> Result<()> {
    identity.sign_in(user_id, token)?;
    output.success(&format!("Signed in as {}", user_id.trim()));
    Ok(())
}

/// Sign out and clear local articles
pub async fn logout(library: &Library, identity: &mut Identity, output: &Output) -> Result<()> {
    if !identity.is_signed_in() {
        output.message("Not signed in");
        return Ok(());
    }
    if !library.sign_out(identity).await {
        bail!("Failed to sign out cleanly");
    }
    output.success("Signed out");
    Ok(())
}
