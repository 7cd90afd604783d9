/*!
 * OAuth exchange commands
 */

use anyhow::{Context, Result};
use colored::*;
use portcullis_exchange::OAuthExchange;
use portcullis_providers::ProviderName;

use super::{load_registry, open_storage};
use crate::config::Config;

pub async fn auth_url(config: &Config, provider: &str) -> Result<()> {
    println!("{}", "=== Authorization URL ===".bold().cyan());

    let exchange = OAuthExchange::new(open_storage(config)?, load_registry(config).await?);
    let name = ProviderName::new(provider);

    exchange
        .is_enabled(&name)
        .await
        .with_context(|| format!("provider {} is not enabled", provider))?;

    let auth_url = exchange
        .grant_auth_url(&name, config.auth_token_ttl)
        .await
        .context("failed to start authorization")?;

    println!("\n{}", "Redirect the user to:".bold());
    println!("  {}", auth_url.url);
    println!("\n{}", "State token:".bold());
    println!("  {}", auth_url.token);
    if config.auth_token_ttl > 0 {
        println!(
            "\n{}",
            format!("Expires in {} seconds", config.auth_token_ttl).dimmed()
        );
    }

    Ok(())
}
