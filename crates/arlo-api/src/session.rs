// Session lifecycle endpoints
//
// Token login, push-channel subscribe/unsubscribe, and logout.
// The login response carries the token that authorizes every later call;
// cookies the service sets along the way stay in the transport's jar.

use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tracing::debug;

use crate::auth::{Credentials, SessionAuth};
use crate::client::ArloClient;
use crate::error::Error;
use crate::models::{unwrap_envelope, LoginData};
use crate::transport::{ApiRequest, ByteStream, Transport};

impl<T: Transport> ArloClient<T> {
    /// Authenticate with email/password.
    ///
    /// `POST {root}/login/v2` with `{"email", "password"}`. Rejections
    /// (HTTP or `success: false`) surface as [`Error::Authentication`];
    /// network failures keep their transport error.
    pub async fn login(&mut self, credentials: &Credentials) -> Result<(), Error> {
        let url = self.urls().login()?;
        debug!("logging in at {}", url);

        let body = json!({
            "email": credentials.username,
            "password": credentials.password.expose_secret(),
        });
        let request = self.request(Method::POST, url, None)?.with_body(body);

        let value = self
            .transport()
            .send(request)
            .await
            .map_err(|e| match e {
                Error::Http { status, body } => Error::Authentication {
                    message: format!("login failed (HTTP {status}): {body}"),
                },
                other => other,
            })?;

        let data: LoginData = unwrap_envelope(value).map_err(|e| match e {
            Error::Service { message } => Error::Authentication { message },
            other => other,
        })?;

        debug!(user_id = %data.user_id, "login successful");
        self.set_auth(SessionAuth {
            token: SecretString::from(data.token),
            user_id: data.user_id,
        });
        Ok(())
    }

    /// Open the server-push event stream for this session.
    ///
    /// `GET {root}/client/subscribe?token=...`
    pub async fn subscribe(&self) -> Result<ByteStream, Error> {
        let auth = self.require_auth()?;
        let url = self.urls().subscribe(&auth.token)?;
        debug!("subscribing to event stream");

        let request = ApiRequest::new(Method::GET, url).with_headers(self.session_headers()?);
        self.transport().open_stream(request).await
    }

    /// Detach the push channel on the service side.
    ///
    /// `GET {root}/client/unsubscribe`
    pub async fn unsubscribe(&self) -> Result<(), Error> {
        let url = self.urls().unsubscribe()?;
        debug!("unsubscribing at {}", url);
        self.send_raw(Method::GET, url).await
    }

    /// End the session on the service side.
    ///
    /// `PUT {root}/logout`
    pub async fn logout(&self) -> Result<(), Error> {
        let url = self.urls().logout()?;
        debug!("logging out at {}", url);
        self.send_raw(Method::PUT, url).await?;
        debug!("logout complete");
        Ok(())
    }
}
