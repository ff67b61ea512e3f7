// ── Command API ──
//
// Host-triggered actions and their outcomes. Every request resolves to
// exactly one `CommandResult`; failures are values, not errors, so the
// host always has something to report.

pub mod dispatcher;

pub use dispatcher::CommandDispatcher;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use strum::{Display, EnumString};

use crate::error::CoreError;

/// Actions the host can trigger on a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize)]
#[strum(serialize_all = "camelCase")]
#[serde(rename_all = "camelCase")]
pub enum Action {
    Snapshot,
    Stream,
    Arm,
    Disarm,
    /// Read the active mode and schedule. Issued by the poller.
    QueryMode,
}

/// One host request. `value` is the truthiness of the state write that
/// triggered it; a falsy value is a no-op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    pub device_id: String,
    pub action: Action,
    pub value: bool,
}

impl CommandRequest {
    pub fn new(device_id: impl Into<String>, action: Action, value: bool) -> Self {
        Self {
            device_id: device_id.into(),
            action,
            value,
        }
    }
}

/// Outcome of a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum CommandResult {
    SnapshotReady { url: String, timestamp: String },
    StreamReady { url: String, timestamp: String },
    ArmAck,
    DisarmAck,
    ModeInfo { mode: String, schedule: String },
    Failure { reason: FailureReason, message: String },
}

impl CommandResult {
    pub fn failure(err: &CoreError) -> Self {
        Self::Failure {
            reason: FailureReason::from(err),
            message: err.to_string(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure { .. })
    }
}

/// Why a command failed, coarse enough for a host to act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    AuthError,
    NetworkError,
    DeviceNotFound,
    Timeout,
    ChannelClosed,
    Unsupported,
}

impl From<&CoreError> for FailureReason {
    fn from(err: &CoreError) -> Self {
        match err {
            CoreError::AuthenticationFailed { .. } => Self::AuthError,
            CoreError::DeviceNotFound { .. } => Self::DeviceNotFound,
            CoreError::Timeout { .. } => Self::Timeout,
            CoreError::EventChannelClosed { .. } => Self::ChannelClosed,
            CoreError::Unsupported { .. } => Self::Unsupported,
            CoreError::ConnectionFailed { .. }
            | CoreError::Api { .. }
            | CoreError::Config { .. }
            | CoreError::Internal(_) => Self::NetworkError,
        }
    }
}

/// ISO-8601 UTC timestamp with millisecond precision, e.g.
/// `2024-05-01T12:00:00.000Z`.
pub(crate) fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
