//! Long-running host: discovery, then mode polling until Ctrl-C.

use std::sync::Arc;

use owo_colors::OwoColorize;
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};

use arlo_config::ConfigError;
use arlo_core::{Adapter, ClientConfig, MemoryHost, PropertyUpdate};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

fn format_update(update: &PropertyUpdate, color: bool) -> String {
    if color {
        format!(
            "{}.{} = {}",
            update.device_id.cyan(),
            update.property.bold(),
            update.value
        )
    } else {
        format!("{}.{} = {}", update.device_id, update.property, update.value)
    }
}

pub async fn handle(config: &ClientConfig, global: &GlobalOpts) -> Result<(), CliError> {
    let host = Arc::new(MemoryHost::new());
    let adapter = Adapter::from_config(config, Arc::clone(&host));

    let mut updates = host.subscribe();
    let color = output::should_color(global.color);
    let quiet = global.quiet;
    let printer = tokio::spawn(async move {
        loop {
            match updates.recv().await {
                Ok(update) => output::print_output(&format_update(&update, color), quiet),
                Err(RecvError::Lagged(n)) => warn!(skipped = n, "property updates dropped"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    adapter.on_ready().await?;
    info!(
        base_stations = adapter.registry().base_stations().count(),
        "polling, press Ctrl-C to stop"
    );

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    adapter.shutdown().await;
    printer.abort();
    Ok(())
}

/// Report the missing credential once, then wait for Ctrl-C with the host
/// never connected.
pub async fn idle_without_credentials(err: &ConfigError) -> Result<(), CliError> {
    let host = MemoryHost::new();
    error!(
        error = %err,
        connected = host.is_connected(),
        "cannot log in, set a username and password with `arlo config init`"
    );

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    Ok(())
}
