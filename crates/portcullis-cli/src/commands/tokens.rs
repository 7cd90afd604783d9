/*!
 * Token commands
 */

use anyhow::{Context, Result};
use colored::*;
use portcullis_jwt::{parse_data, parse_user_claims, Token, UserClaims};
use portcullis_tokens::{CredentialIssuer, Role, UserSnapshot, UserStatus};
use serde_json::Value;
use uuid::Uuid;

use super::open_storage;
use crate::config::Config;

/// Optional user claims for `token sign`
#[derive(Debug, Clone, Copy, Default)]
pub struct ClaimFlags {
    pub admin: bool,
    pub restricted: bool,
    pub confirmed: bool,
    pub verified: bool,
}

pub fn sign(config: &Config, subject: Uuid, provider: &str, flags: ClaimFlags) -> Result<()> {
    println!("{}", "=== Sign Token ===".bold().cyan());

    let mut claims = UserClaims::for_user(subject, provider)?;
    claims.admin = flags.admin;
    claims.restricted = flags.restricted;
    claims.confirmed = flags.confirmed;
    claims.verified = flags.verified;

    let token = Token::new(&config.jwt, claims);
    let bearer = token.bearer().context("failed to sign token")?;

    println!("\n{}", bearer);
    print_expiry(token.expires_at());
    Ok(())
}

pub async fn grant(config: &Config, subject: Uuid, provider: &str, admin: bool) -> Result<()> {
    println!("{}", "=== Grant Bearer Token ===".bold().cyan());

    let issuer = CredentialIssuer::new(open_storage(config)?, config.jwt.clone())
        .with_refresh_token_ttl(config.refresh_token_expiry);

    let mut user = UserSnapshot::new(subject, provider)
        .with_status(UserStatus::Active)
        .confirmed();
    if admin {
        user = user.with_role(Role::Admin);
    }

    let bearer = issuer
        .grant_bearer_token(&user)
        .await
        .context("failed to grant bearer token")?;

    println!("\n{}", "Access token:".bold());
    println!("  {}", bearer.access_token);
    println!("\n{}", "Refresh token:".bold());
    println!("  {}", bearer.refresh_token);
    print_expiry(bearer.expires_at);
    Ok(())
}

pub fn verify(config: &Config, token: &str) -> Result<()> {
    println!("{}", "=== Token Verification ===".bold().cyan());

    match parse_user_claims(&config.jwt, token) {
        Ok(claims) => {
            println!("{}", "✓ Token is VALID".green().bold());
            println!("\n{}", "Claims:".bold());
            println!("  User ID: {}", claims.user_id());
            if !claims.provider().is_empty() {
                println!("  Provider: {}", claims.provider());
            }
            println!("  Admin: {}", claims.admin());
            println!("  Restricted: {}", claims.restricted());
            println!("  Confirmed: {}", claims.confirmed());
            println!("  Verified: {}", claims.verified());
            print_expiry(claims.standard.exp);
            Ok(())
        }
        Err(e) => {
            println!("{}", "✗ Token is INVALID".red().bold());
            Err(e).context("verification failed")
        }
    }
}

pub fn data(config: &Config, token: &str) -> Result<()> {
    let data = parse_data(&config.jwt, token).context("verification failed")?;
    println!("{}", serde_json::to_string_pretty(&Value::Object(data))?);
    Ok(())
}

fn print_expiry(expires_at: Option<u64>) {
    match expires_at {
        Some(expires_at) => println!("\n{}", format!("Expires at {}", expires_at).dimmed()),
        None => println!("\n{}", "Does not expire".dimmed()),
    }
}
