use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::error::Error;

/// Production API root. Everything else hangs off it.
pub const DEFAULT_API_ROOT: &str = "https://arlo.netgear.com/hmsweb";

/// Account credentials for the password login flow.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: SecretString) -> Self {
        Self {
            username: username.into(),
            password,
        }
    }
}

/// The identity returned by a successful login.
///
/// Carries the token that authorizes every later call of the session
/// plus the user id the service expects in device messages.
#[derive(Debug, Clone)]
pub struct SessionAuth {
    pub token: SecretString,
    pub user_id: String,
}

impl SessionAuth {
    /// Headers attached to every authenticated request.
    pub fn headers(&self) -> Result<HeaderMap, Error> {
        let mut token = HeaderValue::from_str(self.token.expose_secret()).map_err(|_| {
            Error::Authentication {
                message: "session token is not a valid header value".into(),
            }
        })?;
        token.set_sensitive(true);

        let mut headers = base_headers();
        headers.insert(AUTHORIZATION, token);
        Ok(headers)
    }

    /// The `from` address used in device messages.
    pub fn web_address(&self) -> String {
        format!("{}_web", self.user_id)
    }
}

/// Headers sent on every request, authenticated or not.
pub(crate) fn base_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static("application/json; charset=UTF-8"),
    );
    headers.insert(
        "accept",
        HeaderValue::from_static("application/json, text/plain, */*"),
    );
    headers
}

/// Endpoint layout of the service, derived from one root URL.
///
/// The client base (`{root}/client`) hosts the push channel; account-level
/// endpoints such as logout live one level up at the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceUrls {
    root: String,
}

impl Default for ServiceUrls {
    fn default() -> Self {
        Self {
            root: DEFAULT_API_ROOT.to_owned(),
        }
    }
}

impl ServiceUrls {
    pub fn new(root: &Url) -> Self {
        Self {
            root: root.as_str().trim_end_matches('/').to_owned(),
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, Error> {
        Ok(Url::parse(&format!("{}/{path}", self.root))?)
    }

    /// `{root}/client`
    pub fn client_base(&self) -> Result<Url, Error> {
        self.endpoint("client")
    }

    /// `POST {root}/login/v2`
    pub fn login(&self) -> Result<Url, Error> {
        self.endpoint("login/v2")
    }

    /// `GET {root}/client/subscribe?token=...`
    pub fn subscribe(&self, token: &SecretString) -> Result<Url, Error> {
        let mut url = self.endpoint("client/subscribe")?;
        url.query_pairs_mut()
            .append_pair("token", token.expose_secret());
        Ok(url)
    }

    /// `GET {root}/client/unsubscribe`
    pub fn unsubscribe(&self) -> Result<Url, Error> {
        self.endpoint("client/unsubscribe")
    }

    /// `PUT {root}/logout` (the client base with `/client` stripped).
    pub fn logout(&self) -> Result<Url, Error> {
        self.endpoint("logout")
    }

    /// `GET {root}/users/devices`
    pub fn devices(&self) -> Result<Url, Error> {
        self.endpoint("users/devices")
    }

    /// `POST {root}/users/devices/fullFrameSnapshot`
    pub fn full_frame_snapshot(&self) -> Result<Url, Error> {
        self.endpoint("users/devices/fullFrameSnapshot")
    }

    /// `POST {root}/users/devices/startStream`
    pub fn start_stream(&self) -> Result<Url, Error> {
        self.endpoint("users/devices/startStream")
    }

    /// `POST {root}/users/devices/notify/{gateway}`
    pub fn notify(&self, gateway_id: &str) -> Result<Url, Error> {
        self.endpoint(&format!("users/devices/notify/{gateway_id}"))
    }

    /// `GET {root}/users/devices/automation/active`
    pub fn automation_active(&self) -> Result<Url, Error> {
        self.endpoint("users/devices/automation/active")
    }
}
