// Device endpoints
//
// Inventory via users/devices, commands via the device message endpoints
// (fullFrameSnapshot, startStream, notify), and the read-only automation
// status query used for mode polling.

use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use crate::client::ArloClient;
use crate::error::Error;
use crate::models::{AutomationStatus, DeviceAddress, RawDevice, StreamData};
use crate::transport::Transport;

/// Mode id the service uses for "armed".
pub const MODE_ARMED: &str = "mode1";
/// Mode id the service uses for "disarmed".
pub const MODE_DISARMED: &str = "mode0";

impl<T: Transport> ArloClient<T> {
    /// List every device on the account.
    ///
    /// `GET {root}/users/devices`
    pub async fn list_devices(&self) -> Result<Vec<RawDevice>, Error> {
        let url = self.urls().devices()?;
        debug!("listing devices");
        self.get(url).await
    }

    /// Ask a camera for a full-frame snapshot.
    ///
    /// The call only acknowledges the request; the image URL arrives later
    /// on the push channel as `fullFrameSnapshotAvailable`.
    pub async fn request_snapshot(&self, address: &DeviceAddress) -> Result<(), Error> {
        let url = self.urls().full_frame_snapshot()?;
        debug!(device = %address.device_id, "requesting snapshot");
        let body = self.device_message(
            &address.gateway_id,
            &format!("cameras/{}", address.device_id),
            json!({ "activityState": "fullFrameSnapshot" }),
        )?;
        let _: serde_json::Value = self
            .post(url, body, address.xcloud_id.as_deref())
            .await?;
        Ok(())
    }

    /// Start a user stream and return its URL.
    ///
    /// The service hands back an `rtsp://` URL that only answers over TLS,
    /// so the scheme is rewritten to `rtsps://`.
    pub async fn start_stream(&self, address: &DeviceAddress) -> Result<String, Error> {
        let url = self.urls().start_stream()?;
        debug!(device = %address.device_id, "starting stream");
        let body = self.device_message(
            &address.gateway_id,
            &format!("cameras/{}", address.device_id),
            json!({
                "activityState": "startUserStream",
                "cameraId": address.device_id,
            }),
        )?;
        let data: StreamData = self
            .post(url, body, address.xcloud_id.as_deref())
            .await?;
        Ok(secure_stream_url(&data.url))
    }

    /// Switch the active mode of a base station.
    ///
    /// `POST {root}/users/devices/notify/{gateway}` with
    /// `{"resource": "modes", "properties": {"active": mode}}`
    pub async fn set_mode(&self, address: &DeviceAddress, mode: &str) -> Result<(), Error> {
        let url = self.urls().notify(&address.gateway_id)?;
        debug!(gateway = %address.gateway_id, mode, "setting mode");
        let body = self.device_message(&address.gateway_id, "modes", json!({ "active": mode }))?;
        let _: serde_json::Value = self
            .post(url, body, address.xcloud_id.as_deref())
            .await?;
        Ok(())
    }

    /// Read active modes and schedules for every base station.
    ///
    /// `GET {root}/users/devices/automation/active`
    pub async fn automation_active(&self) -> Result<Vec<AutomationStatus>, Error> {
        let url = self.urls().automation_active()?;
        debug!("querying automation status");
        self.get(url).await
    }

    /// Build the standard device message envelope.
    fn device_message(
        &self,
        to: &str,
        resource: &str,
        properties: serde_json::Value,
    ) -> Result<serde_json::Value, Error> {
        let auth = self.require_auth()?;
        Ok(json!({
            "from": auth.web_address(),
            "to": to,
            "action": "set",
            "resource": resource,
            "publishResponse": true,
            "transId": transaction_id(),
            "properties": properties,
        }))
    }
}

/// Unique id the service echoes back on responses to a message.
fn transaction_id() -> String {
    format!("web!{}", Uuid::new_v4())
}

fn secure_stream_url(url: &str) -> String {
    match url.strip_prefix("rtsp://") {
        Some(rest) => format!("rtsps://{rest}"),
        None => url.to_owned(),
    }
}
