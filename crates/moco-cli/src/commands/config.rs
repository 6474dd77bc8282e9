//! Config command handlers

use anyhow::{Context, Result};

use moco_core::Config;

use crate::output::{Output, OutputFormat};

/// Show current configuration
pub fn show(output: &Output) -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "data_dir": config.data_dir,
                    "remote_url": config.remote_url,
                    "conflict_policy": config.conflict_policy,
                    "parse_policy": config.parse_policy,
                    "fetch_timeout_secs": config.fetch_timeout_secs,
                    "user_agent": config.user_agent
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", config.data_dir.display());
        }
        OutputFormat::Human => {
            println!("Configuration:");
            println!("  data_dir:           {}", config.data_dir.display());
            println!(
                "  remote_url:         {}",
                config.remote_url.as_deref().unwrap_or("(not set)")
            );
            println!("  conflict_policy:    {}", config.conflict_policy);
            println!("  parse_policy:       {}", config.parse_policy);
            println!("  fetch_timeout_secs: {}", config.fetch_timeout_secs);
            println!("  user_agent:         {}", config.user_agent);
            println!();
            println!("Config file: {}", Config::config_file_path().display());
        }
    }

    Ok(())
}

/// Set a configuration value
pub fn set(key: &str, value: &str, output: &Output) -> Result<()> {
    let mut config = Config::load().context("Failed to load configuration")?;
    config.set_value(key, value)?;
    config.save().context("Failed to save configuration")?;

    output.success(&format!("Set {} = {}", key, value));
    Ok(())
}
