// ── Session lifecycle ──
//
// One `Session` per login: a fresh transport (and cookie jar), the
// authenticated client, and the push channel opened right after login.
// Sessions are never shared between commands; `with_session` guarantees
// the logout on every path that gets past login.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use arlo_api::{
    ArloClient, Connector, Credentials, EventChannel, HttpConnector, ServiceUrls, Transport,
};
use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::error::CoreError;
use crate::model::DeviceRegistry;

const DEFAULT_EVENT_TIMEOUT: Duration = Duration::from_secs(30);

// ── SessionState ─────────────────────────────────────────────────

/// Lifecycle of one session, observable through [`Session::state`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Authenticating,
    Authenticated,
    LoggedOut,
}

// ── SessionManager ───────────────────────────────────────────────

/// Opens sessions against one account.
///
/// Holds only configuration: every [`login`](Self::login) builds its own
/// transport from the connector, so concurrent commands never share cookies
/// or push channels.
pub struct SessionManager<C: Connector> {
    connector: C,
    urls: ServiceUrls,
    credentials: Credentials,
    event_timeout: Duration,
}

impl SessionManager<HttpConnector> {
    /// Manager backed by reqwest, configured from a [`ClientConfig`].
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.connector(), config.service_urls(), config.credentials())
            .with_event_timeout(config.event_timeout)
    }
}

impl<C: Connector> SessionManager<C> {
    pub fn new(connector: C, urls: ServiceUrls, credentials: Credentials) -> Self {
        Self {
            connector,
            urls,
            credentials,
            event_timeout: DEFAULT_EVENT_TIMEOUT,
        }
    }

    /// Bound on every wait for the push channel (inventory, command results).
    pub fn with_event_timeout(mut self, event_timeout: Duration) -> Self {
        self.event_timeout = event_timeout;
        self
    }

    pub fn event_timeout(&self) -> Duration {
        self.event_timeout
    }

    /// Log in and open the push channel.
    ///
    /// A rejected login leaves nothing to clean up. If the push channel
    /// cannot be opened after a successful login, the login is undone before
    /// the error is returned.
    pub async fn login(&self) -> Result<Session<C::Transport>, CoreError> {
        let (state, _) = watch::channel(SessionState::Unauthenticated);
        state.send_replace(SessionState::Authenticating);

        let mut client = ArloClient::new(self.connector.connect()?, self.urls.clone());
        if let Err(e) = client.login(&self.credentials).await {
            state.send_replace(SessionState::Unauthenticated);
            warn!(error = %e, "login failed");
            // Unreachable endpoints count as failed logins, same as bad credentials
            return Err(match e {
                arlo_api::Error::Authentication { message } => {
                    CoreError::AuthenticationFailed { message }
                }
                other => CoreError::AuthenticationFailed {
                    message: other.to_string(),
                },
            });
        }

        let client = Arc::new(client);
        let events = match EventChannel::open(Arc::clone(&client)).await {
            Ok(events) => events,
            Err(e) => {
                warn!(error = %e, "failed to open event channel, logging out");
                if let Err(logout_err) = client.logout().await {
                    warn!(error = %logout_err, "logout failed (non-fatal)");
                }
                state.send_replace(SessionState::Unauthenticated);
                return Err(e.into());
            }
        };

        state.send_replace(SessionState::Authenticated);
        let user_id = client.auth().map(|a| a.user_id.clone()).unwrap_or_default();
        info!(user_id = %user_id, "session established");

        Ok(Session {
            inner: Arc::new(SessionInner {
                client,
                events,
                state,
                user_id,
                created_at: Utc::now(),
                event_timeout: self.event_timeout,
                logged_out: AtomicBool::new(false),
            }),
        })
    }

    /// Scoped session: log in, run `f`, log out.
    ///
    /// The logout runs whether `f` succeeds or fails. A login failure is
    /// returned as-is and `f` never runs.
    pub async fn with_session<F, Fut, R>(&self, f: F) -> Result<R, CoreError>
    where
        F: FnOnce(Session<C::Transport>) -> Fut,
        Fut: Future<Output = Result<R, CoreError>>,
    {
        let session = self.login().await?;
        let result = f(session.clone()).await;
        session.logout().await;
        result
    }
}

// ── Session ──────────────────────────────────────────────────────

/// An authenticated session and its push channel.
///
/// Cheaply cloneable; all clones share one logout.
pub struct Session<T: Transport> {
    inner: Arc<SessionInner<T>>,
}

impl<T: Transport> Clone for Session<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct SessionInner<T: Transport> {
    client: Arc<ArloClient<T>>,
    events: EventChannel,
    state: watch::Sender<SessionState>,
    user_id: String,
    created_at: DateTime<Utc>,
    event_timeout: Duration,
    logged_out: AtomicBool,
}

impl<T: Transport> Session<T> {
    pub fn client(&self) -> &ArloClient<T> {
        &self.inner.client
    }

    pub fn events(&self) -> &EventChannel {
        &self.inner.events
    }

    pub fn user_id(&self) -> &str {
        &self.inner.user_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.inner.created_at
    }

    pub fn event_timeout(&self) -> Duration {
        self.inner.event_timeout
    }

    /// Subscribe to state changes of this session.
    pub fn state(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    pub fn is_logged_out(&self) -> bool {
        self.inner.logged_out.load(Ordering::Acquire)
    }

    /// Wait for this session's inventory and build the device registry.
    pub async fn registry(&self) -> Result<DeviceRegistry, CoreError> {
        let devices = tokio::time::timeout(self.inner.event_timeout, self.events().devices_ready())
            .await
            .map_err(|_| CoreError::Timeout {
                timeout_secs: self.inner.event_timeout.as_secs(),
            })??;
        Ok(DeviceRegistry::build(&devices))
    }

    /// End the session: unsubscribe, log out, stop the push reader.
    ///
    /// Both remote calls are best-effort; failures are logged and swallowed.
    /// Only the first call does anything.
    pub async fn logout(&self) {
        if self.inner.logged_out.swap(true, Ordering::AcqRel) {
            debug!("session already logged out");
            return;
        }

        let client = &self.inner.client;
        if let Err(e) = client.unsubscribe().await {
            warn!(error = %e, "unsubscribe failed (non-fatal)");
        }
        if let Err(e) = client.logout().await {
            warn!(error = %e, "logout failed (non-fatal)");
        }

        self.inner.events.close();
        self.inner.state.send_replace(SessionState::LoggedOut);
        debug!(user_id = %self.inner.user_id, "session closed");
    }
}
