// Service response types
//
// Every endpoint wraps its payload in `{ "success": bool, "data": ... }`;
// some (automation status) send only `{ "data": ... }`.
// Fields use `#[serde(default)]` liberally because the service omits
// anything it has no value for.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::Error;

// ── Response Envelope ────────────────────────────────────────────────

/// Unwrap the `{ success, data }` envelope into `T`.
///
/// `success: false` becomes [`Error::Service`] with the service's own
/// message (or reason, or error code) when it provides one. A body without
/// `success` is accepted when it carries `data`.
pub fn unwrap_envelope<T: DeserializeOwned>(value: serde_json::Value) -> Result<T, Error> {
    let success = match value.get("success") {
        Some(flag) => flag.as_bool().unwrap_or(false),
        None => value.get("data").is_some(),
    };

    if !success {
        let data = value.get("data");
        let message = ["message", "reason", "error"]
            .iter()
            .find_map(|key| data.and_then(|d| d.get(*key)).and_then(|v| v.as_str()))
            .map_or_else(|| format!("request rejected: {value}"), str::to_owned);
        return Err(Error::Service { message });
    }

    let data = value
        .get("data")
        .cloned()
        .unwrap_or(serde_json::Value::Null);
    serde_json::from_value(data).map_err(|e| Error::Deserialization {
        message: e.to_string(),
        body: value.to_string(),
    })
}

// ── Login ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginData {
    pub token: String,
    pub user_id: String,
    #[serde(default)]
    pub email: Option<String>,
}

// ── Device ───────────────────────────────────────────────────────────

/// Raw device descriptor from `users/devices`.
///
/// The service returns dozens of fields per device. We model the ones the
/// session layer routes on; everything else lands in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDevice {
    /// Serial number, stable and unique per device.
    pub device_id: String,
    #[serde(default)]
    pub device_name: String,
    /// `basestation`, `camera`, `arloq`, `arloqs`, ...
    pub device_type: String,
    /// Serial of the owning base station. Standalone devices point at themselves.
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default, rename = "xCloudId")]
    pub x_cloud_id: Option<String>,
    #[serde(default)]
    pub unique_id: Option<String>,
    #[serde(default)]
    pub model_id: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    /// Catch-all for undocumented fields.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Where to send a device message: the device itself, the gateway that
/// relays for it, and the cloud routing id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceAddress {
    pub device_id: String,
    pub gateway_id: String,
    pub xcloud_id: Option<String>,
}

// ── Stream ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct StreamData {
    pub url: String,
}

// ── Automation ───────────────────────────────────────────────────────

/// One entry of `users/devices/automation/active`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomationStatus {
    #[serde(default)]
    pub gateway_id: Option<String>,
    #[serde(default)]
    pub unique_id: Option<String>,
    #[serde(default)]
    pub active_modes: Vec<String>,
    #[serde(default)]
    pub active_schedules: Vec<String>,
}

impl AutomationStatus {
    /// First active mode, or `""` when none is active.
    pub fn mode(&self) -> &str {
        self.active_modes.first().map_or("", String::as_str)
    }

    /// First active schedule, or `""` when none is active.
    pub fn schedule(&self) -> &str {
        self.active_schedules.first().map_or("", String::as_str)
    }
}
