// ── Runtime client configuration ──
//
// Describes how to reach the Arlo service and how long to wait for it.
// Carries credentials but never touches disk; the CLI builds a
// `ClientConfig` from its config file and hands it in.

use std::time::Duration;

use arlo_api::{Credentials, HttpConnector, ServiceUrls, TlsMode, TransportConfig};
use secrecy::SecretString;
use url::Url;

/// Default interval between mode polls, in minutes.
pub const DEFAULT_STATE_POLL_MINUTES: u64 = 10;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (intercepting proxies, test rigs).
    DangerAcceptInvalid,
}

/// Configuration for talking to one Arlo account.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Account email.
    pub username: String,
    pub password: SecretString,
    /// Service root, e.g. `https://arlo.netgear.com/hmsweb`.
    pub api_url: Url,
    pub tls: TlsVerification,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Upper bound on waiting for an asynchronous command result.
    pub event_timeout: Duration,
    /// Interval between mode polls per base station.
    pub state_poll: Duration,
}

impl ClientConfig {
    pub fn new(username: impl Into<String>, password: SecretString, api_url: Url) -> Self {
        Self {
            username: username.into(),
            password,
            api_url,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            event_timeout: Duration::from_secs(30),
            state_poll: Duration::from_secs(DEFAULT_STATE_POLL_MINUTES * 60),
        }
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.username.clone(), self.password.clone())
    }

    pub fn service_urls(&self) -> ServiceUrls {
        ServiceUrls::new(&self.api_url)
    }

    /// reqwest-backed connector honoring the TLS and timeout settings.
    pub fn connector(&self) -> HttpConnector {
        HttpConnector::new(TransportConfig {
            tls: tls_to_transport(&self.tls),
            timeout: self.timeout,
            cookie_jar: None, // each connect() adds its own
        })
    }
}

fn tls_to_transport(tls: &TlsVerification) -> TlsMode {
    match tls {
        TlsVerification::SystemDefaults => TlsMode::System,
        TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
        TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
    }
}
