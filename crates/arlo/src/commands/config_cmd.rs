//! Config subcommand handlers.

use dialoguer::{Input, Password, Select};
use secrecy::SecretString;

use arlo_config::{self as config, Config};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::effective_config_path;
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

/// Format config for display, masking the password.
fn format_config_redacted(cfg: &Config) -> String {
    use std::fmt::Write;
    let mut out = String::new();

    if let Some(ref u) = cfg.username {
        let _ = writeln!(out, "username = \"{u}\"");
    }
    if cfg.password.is_some() {
        let _ = writeln!(out, "password = \"****\"");
    }
    if let Some(ref env) = cfg.password_env {
        let _ = writeln!(out, "password_env = \"{env}\"");
    }
    let _ = writeln!(out, "api_url = \"{}\"", cfg.api_url);
    let _ = writeln!(out, "state_poll = {}", cfg.state_poll);
    let _ = writeln!(out, "timeout = {}", cfg.timeout);
    let _ = writeln!(out, "event_timeout = {}", cfg.event_timeout);
    let _ = writeln!(out, "insecure = {}", cfg.insecure);
    if let Some(ref ca) = cfg.ca_cert {
        let _ = writeln!(out, "ca_cert = \"{}\"", ca.display());
    }

    out
}

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let path = effective_config_path(global);

    match args.command {
        ConfigCommand::Init => {
            eprintln!("Arlo configuration wizard");
            eprintln!("   Config path: {}\n", path.display());

            let username: String = Input::new()
                .with_prompt("Account email")
                .interact_text()
                .map_err(prompt_err)?;

            let password = Password::new()
                .with_prompt("Password")
                .interact()
                .map_err(prompt_err)?;

            if username.is_empty() || password.is_empty() {
                return Err(CliError::Validation {
                    field: "credentials".into(),
                    reason: "username and password cannot be empty".into(),
                });
            }

            let choices = &[
                "Store in system keyring (recommended)",
                "Save to config file (plaintext)",
            ];
            let selection = Select::new()
                .with_prompt("Where to store the password?")
                .items(choices)
                .default(0)
                .interact()
                .map_err(prompt_err)?;

            let password = if selection == 0 {
                config::store_password(&username, &SecretString::from(password))
                    .map_err(|e| CliError::config(e, &path))?;
                eprintln!("   ✓ password stored in system keyring");
                None
            } else {
                Some(password)
            };

            let state_poll: u64 = Input::new()
                .with_prompt("Minutes between mode polls")
                .default(config::Config::default().state_poll)
                .interact_text()
                .map_err(prompt_err)?;

            let cfg = Config {
                username: Some(username),
                password,
                state_poll,
                ..Config::default()
            };
            let written =
                config::save_config(&cfg, Some(&path)).map_err(|e| CliError::config(e, &path))?;
            eprintln!("\n   ✓ wrote {}", written.display());
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = config::load_config(global.config.as_deref())
                .map_err(|e| CliError::config(e, &path))?;
            output::print_output(format_config_redacted(&cfg).trim_end(), global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&path.display().to_string(), global.quiet);
            Ok(())
        }
    }
}
