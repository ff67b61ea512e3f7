//! Configuration for the Arlo CLI.
//!
//! One TOML file plus `ARLO_*` environment overrides, password resolution
//! (env + keyring + plaintext), and translation to
//! `arlo_core::ClientConfig`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use arlo_core::{ClientConfig, DEFAULT_STATE_POLL_MINUTES, TlsVerification};

/// Service root used when the config names none.
pub const DEFAULT_API_URL: &str = "https://arlo.netgear.com/hmsweb";

const KEYRING_SERVICE: &str = "arlo";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no {field} configured")]
    MissingCredentials { field: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("keyring error: {0}")]
    Keyring(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config ─────────────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Account email.
    pub username: Option<String>,

    /// Password (plaintext, prefer keyring or env var).
    pub password: Option<String>,

    /// Environment variable name containing the password.
    pub password_env: Option<String>,

    /// Service root.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Minutes between mode polls.
    #[serde(default = "default_state_poll")]
    pub state_poll: u64,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Seconds to wait for an asynchronous command result.
    #[serde(default = "default_timeout")]
    pub event_timeout: u64,

    /// Skip TLS verification.
    #[serde(default)]
    pub insecure: bool,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            username: None,
            password: None,
            password_env: None,
            api_url: default_api_url(),
            state_poll: default_state_poll(),
            timeout: default_timeout(),
            event_timeout: default_timeout(),
            insecure: false,
            ca_cert: None,
        }
    }
}

fn default_api_url() -> String {
    DEFAULT_API_URL.into()
}
fn default_state_poll() -> u64 {
    DEFAULT_STATE_POLL_MINUTES
}
fn default_timeout() -> u64 {
    30
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "arlo", "arlo").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("arlo");
    p
}

// ── Loading / saving ────────────────────────────────────────────────

/// Load the config from `path` (or the canonical path) plus `ARLO_*`
/// environment variables.
///
/// A missing canonical file yields defaults; a missing explicit path is an
/// error.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = match path {
        Some(p) if !p.exists() => {
            return Err(ConfigError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("config file not found: {}", p.display()),
            )));
        }
        Some(p) => p.to_path_buf(),
        None => config_path(),
    };

    let config: Config = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(&path))
        .merge(Env::prefixed("ARLO_").only(&[
            "username",
            "password",
            "password_env",
            "api_url",
            "state_poll",
            "timeout",
            "event_timeout",
            "insecure",
            "ca_cert",
        ]))
        .extract()?;
    Ok(config)
}

/// Serialize config to TOML and write it; returns the path written.
pub fn save_config(cfg: &Config, path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    let path = path.map_or_else(config_path, Path::to_path_buf);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(&path, toml_str)?;
    Ok(path)
}

// ── Credentials ─────────────────────────────────────────────────────

/// Store the account password in the system keyring.
pub fn store_password(username: &str, password: &SecretString) -> Result<(), ConfigError> {
    keyring::Entry::new(KEYRING_SERVICE, username)
        .and_then(|entry| entry.set_password(password.expose_secret()))
        .map_err(|e| ConfigError::Keyring(e.to_string()))
}

impl Config {
    /// Configured username, or `MissingCredentials`.
    pub fn username(&self) -> Result<&str, ConfigError> {
        self.username
            .as_deref()
            .filter(|u| !u.is_empty())
            .ok_or_else(|| ConfigError::MissingCredentials {
                field: "username".into(),
            })
    }

    /// Resolve the password: `password_env` → `ARLO_PASSWORD` → keyring →
    /// plaintext.
    pub fn resolve_password(&self) -> Result<SecretString, ConfigError> {
        // 1. Named env var
        if let Some(ref env_name) = self.password_env {
            if let Ok(val) = std::env::var(env_name) {
                return Ok(SecretString::from(val));
            }
        }

        // 2. Standard env var
        if let Ok(val) = std::env::var("ARLO_PASSWORD") {
            return Ok(SecretString::from(val));
        }

        // 3. Keyring
        if let Some(ref user) = self.username {
            if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, user) {
                if let Ok(pw) = entry.get_password() {
                    return Ok(SecretString::from(pw));
                }
            }
        }

        // 4. Plaintext
        match self.password {
            Some(ref pw) if !pw.is_empty() => Ok(SecretString::from(pw.clone())),
            _ => Err(ConfigError::MissingCredentials {
                field: "password".into(),
            }),
        }
    }

    /// Build the runtime `ClientConfig`.
    pub fn to_client_config(&self) -> Result<ClientConfig, ConfigError> {
        let username = self.username()?.to_owned();
        let password = self.resolve_password()?;

        let api_url: url::Url = self.api_url.parse().map_err(|_| ConfigError::Validation {
            field: "api_url".into(),
            reason: format!("invalid URL: {}", self.api_url),
        })?;

        for (field, value) in [
            ("state_poll", self.state_poll),
            ("timeout", self.timeout),
            ("event_timeout", self.event_timeout),
        ] {
            if value == 0 {
                return Err(ConfigError::Validation {
                    field: field.into(),
                    reason: "must be greater than zero".into(),
                });
            }
        }

        let state_poll_secs = self
            .state_poll
            .checked_mul(60)
            .ok_or_else(|| ConfigError::Validation {
                field: "state_poll".into(),
                reason: format!("{} minutes is out of range", self.state_poll),
            })?;

        let tls = if self.insecure {
            TlsVerification::DangerAcceptInvalid
        } else if let Some(ref ca_path) = self.ca_cert {
            TlsVerification::CustomCa(ca_path.clone())
        } else {
            TlsVerification::SystemDefaults
        };

        let mut config = ClientConfig::new(username, password, api_url);
        config.tls = tls;
        config.timeout = Duration::from_secs(self.timeout);
        config.event_timeout = Duration::from_secs(self.event_timeout);
        config.state_poll = Duration::from_secs(state_poll_secs);
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn write(dir: &tempfile::TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("config.toml");
        std::fs::write(&path, body).unwrap();
        path
    }

    fn with_credentials() -> Config {
        Config {
            username: Some("user@example.com".into()),
            password: Some("hunter2".into()),
            ..Config::default()
        }
    }

    #[test]
    fn empty_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "");

        let cfg = load_config(Some(&path)).unwrap();

        assert_eq!(cfg.api_url, DEFAULT_API_URL);
        assert_eq!(cfg.state_poll, 10);
        assert_eq!(cfg.timeout, 30);
        assert!(cfg.username.is_none());
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            r#"
username = "user@example.com"
state_poll = 2
event_timeout = 5
api_url = "http://localhost:9000/hmsweb"
"#,
        );

        let cfg = load_config(Some(&path)).unwrap();

        assert_eq!(cfg.username.as_deref(), Some("user@example.com"));
        assert_eq!(cfg.state_poll, 2);
        assert_eq!(cfg.event_timeout, 5);
        assert_eq!(cfg.timeout, 30);
        assert_eq!(cfg.api_url, "http://localhost:9000/hmsweb");
    }

    #[test]
    fn explicit_missing_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_config(Some(&dir.path().join("nope.toml")));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn malformed_file_is_a_figment_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "state_poll = \"often\"");
        assert!(matches!(
            load_config(Some(&path)),
            Err(ConfigError::Figment(_))
        ));
    }

    #[test]
    fn save_then_load_keeps_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let cfg = Config {
            state_poll: 3,
            ..with_credentials()
        };

        let written = save_config(&cfg, Some(&path)).unwrap();
        assert_eq!(written, path);

        assert_eq!(load_config(Some(&path)).unwrap(), cfg);
    }

    #[test]
    fn missing_username_is_reported() {
        let cfg = Config {
            password: Some("hunter2".into()),
            ..Config::default()
        };
        assert!(matches!(
            cfg.to_client_config(),
            Err(ConfigError::MissingCredentials { ref field }) if field == "username"
        ));
    }

    #[test]
    fn password_env_falls_through_when_unset() {
        let cfg = Config {
            password_env: Some("ARLO_CONFIG_TEST_UNSET_VARIABLE".into()),
            ..with_credentials()
        };

        let password = cfg.resolve_password().unwrap();
        assert_eq!(password.expose_secret(), "hunter2");
    }

    #[test]
    fn empty_password_is_missing() {
        let cfg = Config {
            username: Some("nobody@arlo.invalid".into()),
            password: Some(String::new()),
            ..Config::default()
        };
        assert!(matches!(
            cfg.resolve_password(),
            Err(ConfigError::MissingCredentials { ref field }) if field == "password"
        ));
    }

    #[test]
    fn client_config_translation() {
        let cfg = Config {
            state_poll: 2,
            event_timeout: 7,
            ca_cert: Some(PathBuf::from("/etc/arlo/ca.pem")),
            ..with_credentials()
        };

        let client = cfg.to_client_config().unwrap();

        assert_eq!(client.username, "user@example.com");
        assert_eq!(client.state_poll, Duration::from_secs(120));
        assert_eq!(client.event_timeout, Duration::from_secs(7));
        assert_eq!(client.timeout, Duration::from_secs(30));
        assert_eq!(
            client.tls,
            TlsVerification::CustomCa(PathBuf::from("/etc/arlo/ca.pem"))
        );
        assert_eq!(client.api_url.as_str(), DEFAULT_API_URL);
    }

    #[test]
    fn insecure_overrides_ca_cert() {
        let cfg = Config {
            insecure: true,
            ca_cert: Some(PathBuf::from("/etc/arlo/ca.pem")),
            ..with_credentials()
        };
        assert_eq!(
            cfg.to_client_config().unwrap().tls,
            TlsVerification::DangerAcceptInvalid
        );
    }

    #[test]
    fn zero_intervals_are_rejected() {
        let cfg = Config {
            state_poll: 0,
            ..with_credentials()
        };
        assert!(matches!(
            cfg.to_client_config(),
            Err(ConfigError::Validation { ref field, .. }) if field == "state_poll"
        ));
    }

    #[test]
    fn oversized_poll_interval_is_rejected() {
        let cfg = Config {
            state_poll: u64::MAX,
            ..with_credentials()
        };
        assert!(matches!(
            cfg.to_client_config(),
            Err(ConfigError::Validation { ref field, .. }) if field == "state_poll"
        ));
    }

    #[test]
    fn bad_api_url_is_rejected() {
        let cfg = Config {
            api_url: "not a url".into(),
            ..with_credentials()
        };
        assert!(matches!(
            cfg.to_client_config(),
            Err(ConfigError::Validation { ref field, .. }) if field == "api_url"
        ));
    }
}
