use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use ede_api::{ApiClient, HttpClient};

pub mod cli;
pub mod commands;
pub mod controller;
pub mod events;
pub mod input;
pub mod io;
pub mod logging;
pub mod profile;
pub mod render;
pub mod view;

#[cfg(test)]
mod tests;

use self::cli::{Cli, Command};
use self::profile::{config_dir, load_profile, save_profile};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    logging::init_logging(cli.verbose, cli.log_json);

    let root = config_dir();
    let config = load_profile(&root, cli.profile.as_deref())?;
    config.validate().context("invalid configuration")?;
    tracing::debug!("API base {}", config.api.base_url);

    if let Command::SaveProfile { name } = &cli.command {
        let path = save_profile(&root, name, &config)?;
        println!("saved profile {name} to {}", path.display());
        return Ok(());
    }

    let client: Arc<dyn ApiClient> =
        Arc::new(HttpClient::new(&config.api).context("could not build HTTP client")?);

    match cli.command {
        Command::List(args) => commands::run_list(client.as_ref(), &config, args).await,
        Command::Get(args) => commands::run_get(client.as_ref(), &config, args).await,
        Command::Console(args) => commands::run_console(client, &config, args).await,
        Command::SaveProfile { .. } => Ok(()),
    }
}
