// HTTP transport: the single I/O seam between the session layer and the network.
//
// `Transport` sends one JSON request or opens one byte stream. `Connector`
// hands out a fresh transport (with a fresh cookie jar) per login, so no
// cookie state ever leaks from one session into the next.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures_core::Stream;
use futures_util::StreamExt;
use reqwest::cookie::Jar;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest::Method;
use tracing::debug;
use url::Url;

use crate::error::Error;

/// Raw bytes of a server-push response body.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, Error>> + Send>>;

// ── Request ──────────────────────────────────────────────────────────

/// A fully-addressed request. Headers are attached by the session layer.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<serde_json::Value>,
}

impl ApiRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers.extend(headers);
        self
    }

    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }
}

// ── Seams ────────────────────────────────────────────────────────────

/// Performs requests against the remote service. Never retries.
pub trait Transport: Send + Sync + 'static {
    /// Send a request and return the decoded JSON body (`Null` when empty).
    fn send(
        &self,
        request: ApiRequest,
    ) -> impl Future<Output = Result<serde_json::Value, Error>> + Send;

    /// Open a long-lived response and return its body as a byte stream.
    fn open_stream(
        &self,
        request: ApiRequest,
    ) -> impl Future<Output = Result<ByteStream, Error>> + Send;
}

/// Produces one transport per session.
pub trait Connector: Send + Sync + 'static {
    type Transport: Transport;

    fn connect(&self) -> Result<Self::Transport, Error>;
}

// ── Configuration ────────────────────────────────────────────────────

/// TLS verification mode (api-level mirror of core's TlsVerification).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TlsMode {
    /// Use the system certificate store.
    System,
    /// Use a custom CA certificate from the given PEM file.
    CustomCa(PathBuf),
    /// Accept any certificate (intercepting proxies, test rigs).
    DangerAcceptInvalid,
}

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    pub timeout: Duration,
    pub cookie_jar: Option<Arc<Jar>>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::System,
            timeout: Duration::from_secs(30),
            cookie_jar: None,
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    ///
    /// Only the connect phase is bounded at client level; the push stream
    /// stays open indefinitely, so per-request timeouts are applied by
    /// [`HttpTransport::send`] instead.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(self.timeout)
            .user_agent(concat!("arlo-rs/", env!("CARGO_PKG_VERSION")));

        match &self.tls {
            TlsMode::System => {}
            TlsMode::CustomCa(path) => {
                let cert_pem = std::fs::read(path)
                    .map_err(|e| Error::Tls(format!("failed to read CA cert: {e}")))?;
                let cert = reqwest::Certificate::from_pem(&cert_pem)
                    .map_err(|e| Error::Tls(format!("invalid CA cert: {e}")))?;
                builder = builder.add_root_certificate(cert);
            }
            TlsMode::DangerAcceptInvalid => {
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        if let Some(ref jar) = self.cookie_jar {
            builder = builder.cookie_provider(Arc::clone(jar));
        }

        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }

    /// Create a config with a fresh cookie jar (for session auth).
    pub fn with_cookie_jar(mut self) -> Self {
        self.cookie_jar = Some(Arc::new(Jar::default()));
        self
    }
}

// ── reqwest implementation ───────────────────────────────────────────

/// [`Connector`] backed by reqwest. Every `connect()` gets its own jar.
#[derive(Debug, Clone, Default)]
pub struct HttpConnector {
    config: TransportConfig,
}

impl HttpConnector {
    pub fn new(config: TransportConfig) -> Self {
        Self { config }
    }
}

impl Connector for HttpConnector {
    type Transport = HttpTransport;

    fn connect(&self) -> Result<HttpTransport, Error> {
        let config = self.config.clone().with_cookie_jar();
        let http = config.build_client()?;
        Ok(HttpTransport {
            http,
            timeout: config.timeout,
        })
    }
}

/// One session's HTTP client. Cookies set by the service stay in its jar.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    timeout: Duration,
}

impl HttpTransport {
    /// Wrap a pre-built client (tests, custom middleware).
    pub fn with_client(http: reqwest::Client, timeout: Duration) -> Self {
        Self { http, timeout }
    }

    fn map_send_error(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                timeout_secs: self.timeout.as_secs(),
            }
        } else {
            Error::Transport(err)
        }
    }
}

impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<serde_json::Value, Error> {
        debug!("{} {}", request.method, request.url);

        let mut builder = self
            .http
            .request(request.method, request.url)
            .headers(request.headers)
            .timeout(self.timeout);
        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }

        let resp = builder.send().await.map_err(|e| self.map_send_error(e))?;
        let status = resp.status();
        let body = resp.text().await.map_err(|e| self.map_send_error(e))?;

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::Authentication {
                message: "session expired or invalid credentials".into(),
            });
        }
        if !status.is_success() {
            return Err(Error::Http {
                status: status.as_u16(),
                body,
            });
        }
        if body.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }

        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body,
        })
    }

    async fn open_stream(&self, request: ApiRequest) -> Result<ByteStream, Error> {
        debug!("{} {} (stream)", request.method, request.url);

        let resp = self
            .http
            .request(request.method, request.url)
            .headers(request.headers)
            .header(ACCEPT, HeaderValue::from_static("text/event-stream"))
            .send()
            .await
            .map_err(|e| Error::EventStream(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::EventStream(format!(
                "subscribe rejected (HTTP {status}): {body}"
            )));
        }

        Ok(Box::pin(resp.bytes_stream().map(|chunk| {
            chunk.map_err(|e| Error::EventStream(e.to_string()))
        })))
    }
}
