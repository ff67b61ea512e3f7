// ── Core error types ──
//
// User-facing errors from arlo-core. Consumers never see HTTP status codes
// or JSON parse failures directly; `From<arlo_api::Error>` translates
// transport-layer errors into domain variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach the Arlo service: {reason}")]
    ConnectionFailed { reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Event channel closed: {reason}")]
    EventChannelClosed { reason: String },

    #[error("Timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Device not found: {identifier}")]
    DeviceNotFound { identifier: String },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Operation not supported: {operation} on {device_kind}")]
    Unsupported {
        operation: String,
        device_kind: String,
    },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<arlo_api::Error> for CoreError {
    fn from(err: arlo_api::Error) -> Self {
        match err {
            arlo_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            arlo_api::Error::NotAuthenticated => CoreError::AuthenticationFailed {
                message: "no active session".into(),
            },
            ref e if e.is_auth_expired() => CoreError::AuthenticationFailed {
                message: e.to_string(),
            },
            arlo_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_secs: 0 }
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            arlo_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            arlo_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            arlo_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                reason: format!("TLS error: {msg}"),
            },
            arlo_api::Error::Http { status, body } => CoreError::Api {
                message: if body.is_empty() {
                    format!("HTTP {status}")
                } else {
                    body
                },
                status: Some(status),
            },
            arlo_api::Error::Service { message } => CoreError::Api {
                message,
                status: None,
            },
            arlo_api::Error::EventStream(reason) => CoreError::EventChannelClosed { reason },
            arlo_api::Error::ChannelClosed => CoreError::EventChannelClosed {
                reason: "event stream ended".into(),
            },
            arlo_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}
