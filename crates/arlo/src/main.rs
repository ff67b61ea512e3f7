mod cli;
mod commands;
mod error;
mod output;

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use arlo_config::{Config, ConfigError};
use arlo_core::ClientConfig;

use crate::cli::{Cli, Command, GlobalOpts};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands don't need credentials
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),

        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "arlo", &mut std::io::stdout());
            Ok(())
        }

        // Missing credentials leave the host idle instead of exiting
        Command::Run => {
            let (cfg, path) = load_file_config(&cli.global)?;
            match cfg.to_client_config() {
                Ok(config) => commands::run::handle(&config, &cli.global).await,
                Err(e @ ConfigError::MissingCredentials { .. }) => {
                    commands::run::idle_without_credentials(&e).await
                }
                Err(e) => Err(CliError::config(e, &path)),
            }
        }

        cmd => {
            let config = build_client_config(&cli.global)?;
            tracing::debug!(command = ?cmd, "dispatching command");
            commands::dispatch(cmd, &config, &cli.global).await
        }
    }
}

/// Path of the config file in effect.
pub(crate) fn effective_config_path(global: &GlobalOpts) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(arlo_config::config_path)
}

/// Load the config file (plus `ARLO_*` env).
fn load_file_config(global: &GlobalOpts) -> Result<(Config, PathBuf), CliError> {
    let path = effective_config_path(global);
    let cfg = arlo_config::load_config(global.config.as_deref())
        .map_err(|e| CliError::config(e, &path))?;
    Ok((cfg, path))
}

/// Load the config and build the runtime config.
fn build_client_config(global: &GlobalOpts) -> Result<ClientConfig, CliError> {
    let (cfg, path) = load_file_config(global)?;
    cfg.to_client_config()
        .map_err(|e| CliError::config(e, &path))
}
