//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError`, `ConfigError` and command failures into user-facing
//! errors with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use arlo_config::ConfigError;
use arlo_core::{CoreError, FailureReason};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const UNSUPPORTED: i32 = 5;
    pub const CONFIG: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not reach the Arlo service: {reason}")]
    #[diagnostic(
        code(arlo::connection_failed),
        help("Check network access to the service root (api_url in your config).")
    )]
    ConnectionFailed { reason: String },

    #[error("Push channel closed: {reason}")]
    #[diagnostic(code(arlo::channel_closed))]
    ChannelClosed { reason: String },

    // ── Authentication ───────────────────────────────────────────────

    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(arlo::auth_failed),
        help(
            "Verify your username and password.\n\
             Run: arlo config init"
        )
    )]
    AuthFailed { message: String },

    #[error("No {field} configured")]
    #[diagnostic(
        code(arlo::no_credentials),
        help(
            "Configure credentials with: arlo config init\n\
             Or set ARLO_USERNAME and ARLO_PASSWORD.\n\
             Config file: {path}"
        )
    )]
    NoCredentials { field: String, path: String },

    // ── Devices ──────────────────────────────────────────────────────

    #[error("Device '{identifier}' not found")]
    #[diagnostic(code(arlo::not_found), help("Run: arlo devices to see available devices"))]
    NotFound { identifier: String },

    #[error("{message}")]
    #[diagnostic(
        code(arlo::unsupported),
        help("Snapshots and streams need a camera serial, not a base station.")
    )]
    Unsupported { message: String },

    // ── API ──────────────────────────────────────────────────────────

    #[error("Arlo service error: {message}")]
    #[diagnostic(code(arlo::api_error))]
    Api { message: String },

    // ── Timeout ──────────────────────────────────────────────────────

    #[error("{message}")]
    #[diagnostic(
        code(arlo::timeout),
        help("Raise event_timeout in your config if the device is slow to answer.")
    )]
    Timeout { message: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(arlo::validation))]
    Validation { field: String, reason: String },

    #[error("{source}")]
    #[diagnostic(code(arlo::config), help("Check the config file: {path}"))]
    Config {
        #[source]
        source: ConfigError,
        path: String,
    },

    // ── IO / Serialization ────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render output: {0}")]
    #[diagnostic(code(arlo::render))]
    Render(String),

    #[error("{0}")]
    #[diagnostic(code(arlo::internal))]
    Internal(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::ChannelClosed { .. } | Self::Api { .. } => {
                exit_code::CONNECTION
            }
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Unsupported { .. } => exit_code::UNSUPPORTED,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } => exit_code::USAGE,
            Self::Config { .. } => exit_code::CONFIG,
            Self::Io(_) | Self::Render(_) | Self::Internal(_) => exit_code::GENERAL,
        }
    }

    /// Error for a command that resolved to `CommandResult::Failure`.
    pub fn from_failure(reason: FailureReason, message: String) -> Self {
        match reason {
            FailureReason::AuthError => Self::AuthFailed { message },
            FailureReason::NetworkError => Self::Api { message },
            FailureReason::DeviceNotFound => Self::NotFound {
                identifier: message
                    .strip_prefix("Device not found: ")
                    .map_or_else(|| message.clone(), str::to_owned),
            },
            FailureReason::Timeout => Self::Timeout { message },
            FailureReason::ChannelClosed => Self::ChannelClosed { reason: message },
            FailureReason::Unsupported => Self::Unsupported { message },
        }
    }

    /// Wrap a config error, pointing at the file it came from.
    pub fn config(err: ConfigError, path: &std::path::Path) -> Self {
        let path = path.display().to_string();
        match err {
            ConfigError::MissingCredentials { field } => Self::NoCredentials { field, path },
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            source => Self::Config { source, path },
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { reason } => Self::ConnectionFailed { reason },
            CoreError::AuthenticationFailed { message } => Self::AuthFailed { message },
            CoreError::EventChannelClosed { reason } => Self::ChannelClosed { reason },
            err @ CoreError::Timeout { .. } => Self::Timeout {
                message: err.to_string(),
            },
            CoreError::DeviceNotFound { identifier } => Self::NotFound { identifier },
            err @ CoreError::Unsupported { .. } => Self::Unsupported {
                message: err.to_string(),
            },
            CoreError::Api { message, .. } => Self::Api { message },
            CoreError::Config { message } => Self::Validation {
                field: "config".into(),
                reason: message,
            },
            CoreError::Internal(message) => Self::Internal(message),
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        Self::Render(err.to_string())
    }
}

impl From<serde_yaml::Error> for CliError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Render(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failures_map_to_exit_codes() {
        let cases = [
            (FailureReason::AuthError, exit_code::AUTH),
            (FailureReason::NetworkError, exit_code::CONNECTION),
            (FailureReason::DeviceNotFound, exit_code::NOT_FOUND),
            (FailureReason::Timeout, exit_code::TIMEOUT),
            (FailureReason::ChannelClosed, exit_code::CONNECTION),
            (FailureReason::Unsupported, exit_code::UNSUPPORTED),
        ];
        for (reason, code) in cases {
            assert_eq!(
                CliError::from_failure(reason, "x".into()).exit_code(),
                code,
                "{reason}"
            );
        }
    }

    #[test]
    fn not_found_failure_keeps_the_identifier() {
        let err = CliError::from_failure(FailureReason::DeviceNotFound, "Device not found: X1".into());
        assert!(matches!(err, CliError::NotFound { ref identifier } if identifier == "X1"));
    }

    #[test]
    fn missing_credentials_become_auth_errors() {
        let err = CliError::config(
            ConfigError::MissingCredentials {
                field: "password".into(),
            },
            std::path::Path::new("/tmp/arlo.toml"),
        );
        assert_eq!(err.exit_code(), exit_code::AUTH);
        assert_eq!(err.to_string(), "No password configured");
    }
}
