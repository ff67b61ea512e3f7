// ── Device domain types ──

use arlo_api::DeviceAddress;
use serde::Serialize;
use strum::{Display, EnumString};

/// Device families the adapter knows how to drive.
///
/// Everything else in the inventory (lights, sirens, doorbell chimes) is
/// skipped when the registry is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize)]
#[strum(ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    #[strum(to_string = "basestation")]
    BaseStation,
    #[strum(to_string = "camera")]
    Camera,
    /// Standalone Wi-Fi camera that acts as its own base station.
    #[strum(to_string = "arloq", serialize = "arloqs")]
    ArloQ,
}

impl DeviceKind {
    /// Cameras and Arlo Q take snapshot/stream commands.
    pub fn is_camera(self) -> bool {
        matches!(self, Self::Camera | Self::ArloQ)
    }
}

/// One device from a login's inventory. Never mutated after build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Device {
    /// Serial number (`deviceId`).
    pub serial: String,
    pub kind: DeviceKind,
    /// Type string as reported by the service, e.g. `arloqs`.
    pub device_type: String,
    pub name: String,
    /// `"<type> - <name>"`, plus `" (<parent name>)"` when the parent resolves.
    pub display_name: String,
    /// Serial of the owning base station, only when it is in the inventory.
    pub parent: Option<String>,
    /// Device that relays messages for this one (raw `parentId`, else self).
    pub gateway_id: String,
    pub xcloud_id: Option<String>,
}

impl Device {
    /// Routing triple for device messages.
    pub fn address(&self) -> DeviceAddress {
        DeviceAddress {
            device_id: self.serial.clone(),
            gateway_id: self.gateway_id.clone(),
            xcloud_id: self.xcloud_id.clone(),
        }
    }

    pub fn is_base_station(&self) -> bool {
        self.kind == DeviceKind::BaseStation
    }
}
