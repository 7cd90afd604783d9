/*!
 * Provider listing
 */

use anyhow::Result;
use colored::*;
use portcullis_providers::ExternalProvider;

use super::load_registry;
use crate::config::Config;

pub async fn list_providers(config: &Config) -> Result<()> {
    println!(
        "{}",
        format!("=== {} providers ===", config.service_name).bold().cyan()
    );

    let registry = load_registry(config).await?;

    let internal = registry.internal().await;
    if internal.is_unknown() {
        println!("  {} internal sign-in disabled", "-".dimmed());
    } else {
        println!("  {} {} (internal)", "✓".green(), internal);
    }

    let enabled = registry.names().await;
    for name in &enabled {
        println!("  {} {}", "✓".green(), name);
    }

    let available: Vec<_> = ExternalProvider::ALL
        .iter()
        .copied()
        .filter(|provider| provider.has_factory())
        .filter(|provider| !enabled.iter().any(|name| name.external() == Some(*provider)))
        .map(ExternalProvider::as_str)
        .collect();
    if !available.is_empty() {
        println!("\n{}", "Not configured:".bold());
        println!("  {}", available.join(", ").dimmed());
    }

    Ok(())
}
