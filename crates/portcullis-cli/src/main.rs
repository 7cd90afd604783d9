/*!
 * Portcullis operator CLI
 *
 * Inspect provider configuration, start OAuth exchanges, and mint or check
 * tokens with the service's own JWT settings. All settings come from
 * `PORTCULLIS_*` environment variables.
 *
 * Usage:
 *   portcullis providers
 *   portcullis auth-url google
 *   portcullis token sign --subject <uuid> --admin
 *   portcullis token verify <jwt>
 */

mod commands;
mod config;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::{Parser, Subcommand};
use config::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "portcullis")]
#[command(about = "Credential issuance and OAuth exchange tooling")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List enabled sign-in providers
    Providers,
    /// Start an OAuth exchange and print the redirect URL
    AuthUrl {
        /// Provider name, e.g. google
        provider: String,
    },
    /// Sign and inspect tokens
    #[command(subcommand)]
    Token(TokenCommands),
}

#[derive(Subcommand)]
enum TokenCommands {
    /// Sign an access token for a user
    Sign {
        /// User ID
        #[arg(short, long)]
        subject: Uuid,

        /// Provider the user signed in with
        #[arg(short, long, default_value = "")]
        provider: String,

        #[arg(long)]
        admin: bool,

        #[arg(long)]
        restricted: bool,

        #[arg(long)]
        confirmed: bool,

        #[arg(long)]
        verified: bool,
    },
    /// Issue an access/refresh pair for an active user
    Grant {
        /// User ID
        #[arg(short, long)]
        subject: Uuid,

        /// Provider the user signed in with
        #[arg(short, long, default_value = "")]
        provider: String,

        #[arg(long)]
        admin: bool,
    },
    /// Verify a user token and print its claims
    Verify {
        /// JWT to verify
        token: String,
    },
    /// Verify a token and print its private claims
    Data {
        /// JWT to verify
        token: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so command output stays pipeable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "portcullis=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command {
        Commands::Providers => commands::providers::list_providers(&config).await?,

        Commands::AuthUrl { provider } => commands::auth::auth_url(&config, &provider).await?,

        Commands::Token(TokenCommands::Sign {
            subject,
            provider,
            admin,
            restricted,
            confirmed,
            verified,
        }) => {
            let flags = commands::tokens::ClaimFlags {
                admin,
                restricted,
                confirmed,
                verified,
            };
            commands::tokens::sign(&config, subject, &provider, flags)?
        }

        Commands::Token(TokenCommands::Grant {
            subject,
            provider,
            admin,
        }) => commands::tokens::grant(&config, subject, &provider, admin).await?,

        Commands::Token(TokenCommands::Verify { token }) => {
            commands::tokens::verify(&config, &token)?
        }

        Commands::Token(TokenCommands::Data { token }) => commands::tokens::data(&config, &token)?,
    }

    Ok(())
}
