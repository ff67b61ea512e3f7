//! Device inventory listing.

use tabled::Tabled;

use arlo_core::{ClientConfig, Device, SessionManager};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "Serial")]
    serial: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    dtype: String,
    #[tabled(rename = "Parent")]
    parent: String,
    #[tabled(rename = "Gateway")]
    gateway: String,
}

impl From<&Device> for DeviceRow {
    fn from(d: &Device) -> Self {
        Self {
            serial: d.serial.clone(),
            name: d.display_name.clone(),
            dtype: d.kind.to_string(),
            parent: d.parent.clone().unwrap_or_else(|| "-".into()),
            gateway: d.gateway_id.clone(),
        }
    }
}

pub async fn handle(config: &ClientConfig, global: &GlobalOpts) -> Result<(), CliError> {
    let registry = SessionManager::from_config(config)
        .with_session(|session| async move { session.registry().await })
        .await?;

    let devices: Vec<Device> = registry.iter().cloned().collect();
    let out = output::render_list(
        global.output,
        &devices,
        |d| DeviceRow::from(d),
        |d| d.serial.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
