// ── Command dispatcher ──
//
// Correlates a host request with its outcome: log in, resolve the device
// from this login's inventory, issue the command, wait for the matching
// response or push event, log out. Every non-trivial request costs exactly
// one login/logout pair.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use arlo_api::devices::{MODE_ARMED, MODE_DISARMED};
use arlo_api::{Connector, EventFilter, EventKind, Transport};
use tracing::{debug, info, warn};

use super::{timestamp, Action, CommandRequest, CommandResult};
use crate::error::CoreError;
use crate::model::Device;
use crate::session::{Session, SessionManager};

/// Runs commands, one fresh session each.
pub struct CommandDispatcher<C: Connector> {
    sessions: Arc<SessionManager<C>>,
    event_timeout: Duration,
}

impl<C: Connector> CommandDispatcher<C> {
    /// The correlation timeout is taken from the session manager.
    pub fn new(sessions: Arc<SessionManager<C>>) -> Self {
        let event_timeout = sessions.event_timeout();
        Self {
            sessions,
            event_timeout,
        }
    }

    pub fn sessions(&self) -> &Arc<SessionManager<C>> {
        &self.sessions
    }

    /// Run `action` on `device_id`.
    ///
    /// Returns `None` without touching the network when `value` is falsy.
    pub async fn execute(
        &self,
        device_id: &str,
        action: Action,
        value: bool,
    ) -> Option<CommandResult> {
        self.submit(CommandRequest::new(device_id, action, value))
            .await
    }

    pub async fn submit(&self, request: CommandRequest) -> Option<CommandResult> {
        if !request.value {
            debug!(device = %request.device_id, action = %request.action, "falsy value, ignoring");
            return None;
        }
        Some(self.run(&request).await)
    }

    async fn run(&self, request: &CommandRequest) -> CommandResult {
        let started = Instant::now();
        let outcome = self
            .sessions
            .with_session(|session| async move { self.dispatch(&session, request).await })
            .await;

        match outcome {
            Ok(result) => {
                info!(
                    device = %request.device_id,
                    action = %request.action,
                    elapsed = ?started.elapsed(),
                    "command completed"
                );
                result
            }
            Err(e) => {
                warn!(
                    device = %request.device_id,
                    action = %request.action,
                    error = %e,
                    "command failed"
                );
                CommandResult::failure(&e)
            }
        }
    }

    async fn dispatch(
        &self,
        session: &Session<C::Transport>,
        request: &CommandRequest,
    ) -> Result<CommandResult, CoreError> {
        let registry = session.registry().await?;
        let device = registry.lookup(&request.device_id)?;
        debug!(device = %device.serial, kind = %device.kind, action = %request.action, "dispatching");

        match request.action {
            Action::Snapshot => self.snapshot(session, device).await,
            Action::Stream => self.stream(session, device).await,
            Action::Arm => {
                session.client().set_mode(&device.address(), MODE_ARMED).await?;
                Ok(CommandResult::ArmAck)
            }
            Action::Disarm => {
                session
                    .client()
                    .set_mode(&device.address(), MODE_DISARMED)
                    .await?;
                Ok(CommandResult::DisarmAck)
            }
            Action::QueryMode => query_mode(session, device).await,
        }
    }

    /// The listener is registered before the request goes out, so an event
    /// that arrives while the request is still in flight is not missed.
    async fn snapshot(
        &self,
        session: &Session<C::Transport>,
        device: &Device,
    ) -> Result<CommandResult, CoreError> {
        require_camera(device, Action::Snapshot)?;

        let mut ready = session.events().subscribe(EventFilter::new(
            EventKind::FfSnapshotAvailable,
            device.serial.as_str(),
        ));
        session.client().request_snapshot(&device.address()).await?;

        let event = self.bounded(ready.next()).await?;
        let url = event.payload.clone().ok_or_else(|| {
            CoreError::Internal("snapshot event carried no image URL".into())
        })?;
        Ok(CommandResult::SnapshotReady {
            url,
            timestamp: timestamp(),
        })
    }

    async fn stream(
        &self,
        session: &Session<C::Transport>,
        device: &Device,
    ) -> Result<CommandResult, CoreError> {
        require_camera(device, Action::Stream)?;

        let url = self
            .bounded(session.client().start_stream(&device.address()))
            .await?;
        Ok(CommandResult::StreamReady {
            url,
            timestamp: timestamp(),
        })
    }

    /// Await `fut`, giving up after the event timeout.
    async fn bounded<T, F>(&self, fut: F) -> Result<T, CoreError>
    where
        F: Future<Output = Result<T, arlo_api::Error>>,
    {
        match tokio::time::timeout(self.event_timeout, fut).await {
            Ok(result) => result.map_err(CoreError::from),
            Err(_) => Err(CoreError::Timeout {
                timeout_secs: self.event_timeout.as_secs(),
            }),
        }
    }
}

/// Active mode and schedule of the device's base station.
///
/// Prefers the automation entry of the device's own gateway; falls back to
/// the first entry when none matches.
async fn query_mode<T: Transport>(
    session: &Session<T>,
    device: &Device,
) -> Result<CommandResult, CoreError> {
    let statuses = session.client().automation_active().await?;
    let status = statuses
        .iter()
        .find(|s| s.gateway_id.as_deref() == Some(device.gateway_id.as_str()))
        .or_else(|| statuses.first());

    Ok(match status {
        Some(status) => CommandResult::ModeInfo {
            mode: status.mode().to_owned(),
            schedule: status.schedule().to_owned(),
        },
        None => CommandResult::ModeInfo {
            mode: String::new(),
            schedule: String::new(),
        },
    })
}

fn require_camera(device: &Device, action: Action) -> Result<(), CoreError> {
    if device.kind.is_camera() {
        Ok(())
    } else {
        Err(CoreError::Unsupported {
            operation: action.to_string(),
            device_kind: device.kind.to_string(),
        })
    }
}
