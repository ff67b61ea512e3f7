// Session-scoped API client
//
// Wraps one `Transport` with endpoint URL construction, auth header
// injection, and envelope unwrapping. Endpoint groups (session lifecycle,
// device commands) are implemented as inherent methods in separate files
// to keep this module focused on request mechanics.

use reqwest::Method;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use url::Url;

use crate::auth::{base_headers, ServiceUrls, SessionAuth};
use crate::error::Error;
use crate::models::unwrap_envelope;
use crate::transport::{ApiRequest, Transport};

/// HTTP client for one login lifecycle.
///
/// Created unauthenticated; [`login`](Self::login) stores the session
/// identity, after which every request carries the session headers.
pub struct ArloClient<T: Transport> {
    transport: T,
    urls: ServiceUrls,
    auth: Option<SessionAuth>,
}

impl<T: Transport> ArloClient<T> {
    pub fn new(transport: T, urls: ServiceUrls) -> Self {
        Self {
            transport,
            urls,
            auth: None,
        }
    }

    /// Endpoint layout in use.
    pub fn urls(&self) -> &ServiceUrls {
        &self.urls
    }

    /// The session identity, once logged in.
    pub fn auth(&self) -> Option<&SessionAuth> {
        self.auth.as_ref()
    }

    pub(crate) fn set_auth(&mut self, auth: SessionAuth) {
        self.auth = Some(auth);
    }

    pub(crate) fn require_auth(&self) -> Result<&SessionAuth, Error> {
        self.auth.as_ref().ok_or(Error::NotAuthenticated)
    }

    pub(crate) fn transport(&self) -> &T {
        &self.transport
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Build a request with the session headers (or base headers before login).
    pub(crate) fn request(
        &self,
        method: Method,
        url: Url,
        xcloud_id: Option<&str>,
    ) -> Result<ApiRequest, Error> {
        let mut headers = match self.auth {
            Some(ref auth) => auth.headers()?,
            None => base_headers(),
        };
        if let Some(id) = xcloud_id {
            let value = HeaderValue::from_str(id)
                .map_err(|_| Error::Service {
                    message: format!("invalid xCloudId '{id}'"),
                })?;
            headers.insert("xcloudid", value);
        }
        Ok(ApiRequest::new(method, url).with_headers(headers))
    }

    /// Send a GET request and unwrap the envelope.
    pub(crate) async fn get<D: DeserializeOwned>(&self, url: Url) -> Result<D, Error> {
        let request = self.request(Method::GET, url, None)?;
        let value = self.transport.send(request).await?;
        unwrap_envelope(value)
    }

    /// Send a POST request with JSON body and unwrap the envelope.
    pub(crate) async fn post<D: DeserializeOwned>(
        &self,
        url: Url,
        body: serde_json::Value,
        xcloud_id: Option<&str>,
    ) -> Result<D, Error> {
        let request = self.request(Method::POST, url, xcloud_id)?.with_body(body);
        let value = self.transport.send(request).await?;
        unwrap_envelope(value)
    }

    /// Send a request and return the raw body, ignoring any envelope.
    ///
    /// Used by session teardown calls, whose responses carry nothing useful.
    pub(crate) async fn send_raw(&self, method: Method, url: Url) -> Result<(), Error> {
        let request = self.request(method, url, None)?;
        self.transport.send(request).await.map(|_| ())
    }

    /// Headers for a raw request built outside the helpers above.
    pub(crate) fn session_headers(&self) -> Result<HeaderMap, Error> {
        self.require_auth()?.headers()
    }
}
