//! Chrome Web Store maintenance commands

use clap::{Args, Subcommand};
use console::style;
use dialoguer::Input;
use tracing::info;

use skylift_core::{resolve_chrome_credentials, resolve_chrome_oauth_client, InlineConfig};
use skylift_stores::chrome::{consent_url, exchange_auth_code, CwsApi, CwsClient};
use skylift_stores::http::build_client;
use skylift_stores::ChromeApiVersion;

use super::ConfigArgs;
use crate::cli::{output, Cli};
use crate::exit_codes;

/// Chrome Web Store maintenance
#[derive(Debug, Args)]
pub struct ChromeCommand {
    #[command(flatten)]
    pub sources: ConfigArgs,

    #[command(subcommand)]
    pub command: ChromeSubcommand,
}

/// Chrome subcommands
#[derive(Debug, Subcommand)]
pub enum ChromeSubcommand {
    /// Print the item's current status as JSON
    Status,

    /// Change the rollout percentage of the published version (API 2 only)
    SetDeployPercentage {
        /// Percentage of users receiving the published version
        #[arg(value_parser = clap::value_parser!(u8).range(1..=100))]
        percentage: u8,
    },

    /// Obtain a refresh token through the OAuth consent screen
    RefreshToken,
}

impl ChromeCommand {
    /// Execute the chrome command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<i32> {
        info!(command = ?self.command, "executing chrome command");
        let config = self.sources.gather(InlineConfig::default())?;

        let runtime = tokio::runtime::Runtime::new()?;
        match &self.command {
            ChromeSubcommand::Status => runtime.block_on(status(&config)),
            ChromeSubcommand::SetDeployPercentage { percentage } => {
                runtime.block_on(set_deploy_percentage(cli, &config, *percentage))
            }
            ChromeSubcommand::RefreshToken => runtime.block_on(refresh_token(cli, &config)),
        }?;

        Ok(exit_codes::SUCCESS)
    }
}

fn client(config: &InlineConfig) -> anyhow::Result<CwsClient> {
    let credentials = resolve_chrome_credentials(&config.chrome)?;
    Ok(CwsClient::new(build_client()?, credentials))
}

async fn status(config: &InlineConfig) -> anyhow::Result<()> {
    let api = client(config)?;
    let token = api.get_token().await?;
    let status = api.fetch_status(&token).await?;

    println!("{}", serde_json::to_string_pretty(&status.raw)?);
    Ok(())
}

async fn set_deploy_percentage(
    cli: &Cli,
    config: &InlineConfig,
    percentage: u8,
) -> anyhow::Result<()> {
    let credentials = resolve_chrome_credentials(&config.chrome)?;
    if matches!(credentials.api, ChromeApiVersion::V1_1 { .. }) {
        anyhow::bail!("set-deploy-percentage requires Chrome Web Store API 2 (CHROME_API_VERSION=2)");
    }
    let api = CwsClient::new(build_client()?, credentials);

    let token = api.get_token().await?;
    api.set_published_deploy_percentage(&token, percentage).await?;

    if cli.is_text() {
        output::success(&format!("Deploy percentage set to {}%", percentage));
    }
    Ok(())
}

async fn refresh_token(cli: &Cli, config: &InlineConfig) -> anyhow::Result<()> {
    let (client_id, client_secret) = resolve_chrome_oauth_client(&config.chrome)?;

    println!("Open this URL and authorize access to the Chrome Web Store:");
    println!();
    println!("  {}", style(consent_url(&client_id)?).cyan());
    println!();

    let code: String = Input::new()
        .with_prompt("Authorization code")
        .interact_text()?;

    let tokens = exchange_auth_code(&build_client()?, &client_id, &client_secret, code.trim()).await?;
    match tokens.refresh_token {
        Some(refresh_token) => {
            if cli.is_text() {
                output::success("Received a refresh token");
                println!("{}", output::key_value("CHROME_REFRESH_TOKEN", &refresh_token));
            } else {
                println!("{}", refresh_token);
            }
        }
        None => output::warning(
            "No refresh token returned. Revoke the app's access in your Google account and try again.",
        ),
    }
    Ok(())
}
