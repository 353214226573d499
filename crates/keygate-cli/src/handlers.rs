//! Command handlers.

use crate::config;
use anyhow::Result;
use console::style;
use keygate_core::KeygenConfig;
use keygate_licensing::{KeygenClient, License, SchemeCode, Verifier, fingerprint};
use tracing::debug;

/// Verify a signed license key offline and print its payload.
pub fn verify(config: &KeygenConfig, scheme: &str, signed_key: &str) -> Result<()> {
    let scheme: SchemeCode = scheme.parse()?;
    let payload = Verifier::from_config(config)?.verify(scheme, signed_key)?;

    println!("{} License key is genuine", style("✓").green());
    println!("{}", payload);
    Ok(())
}

/// Validate the configured license key online.
pub async fn validate(
    config: KeygenConfig,
    mut fingerprints: Vec<String>,
    entitlements: Vec<String>,
    machine: bool,
) -> Result<()> {
    if machine {
        let current = fingerprint::machine_fingerprint();
        debug!(fingerprint = %current, "Scoping validation to this machine");
        fingerprints.push(current);
    }

    config::require_account(&config)?;
    let client = KeygenClient::new(config)?;
    let license = client.validate(&fingerprints, &entitlements).await?;

    print_license(&license);
    Ok(())
}

/// List machines activated for the configured license.
pub async fn machines(config: KeygenConfig) -> Result<()> {
    config::require_account(&config)?;
    let client = KeygenClient::new(config)?;
    let license = client.validate(&[], &[]).await?;
    let machines = license.machines().await?;

    if machines.is_empty() {
        println!("No machines activated for license {}", style(&license.id).bold());
        return Ok(());
    }

    println!(
        "{:<38} {:<20} {:<16} {}",
        style("ID").bold(),
        style("HOSTNAME").bold(),
        style("PLATFORM").bold(),
        style("HEARTBEAT").bold()
    );
    for machine in &machines {
        println!(
            "{:<38} {:<20} {:<16} {}",
            machine.id,
            machine.hostname.as_deref().unwrap_or("-"),
            machine.platform.as_deref().unwrap_or("-"),
            machine.heartbeat_status
        );
    }
    Ok(())
}

fn print_license(license: &License) {
    let status = if license.is_active() {
        style(license.status.as_str()).green()
    } else {
        style(license.status.as_str()).yellow()
    };

    println!("{} License is valid", style("✓").green());
    println!("  ID:     {}", license.id);
    if let Some(name) = &license.name {
        println!("  Name:   {}", name);
    }
    println!("  Status: {}", status);
    match license.expiry {
        Some(expiry) => println!("  Expiry: {}", expiry.to_rfc3339()),
        None => println!("  Expiry: never"),
    }
}
