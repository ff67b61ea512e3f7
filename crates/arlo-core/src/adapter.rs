// ── Host adapter ──
//
// Glue between the home-automation host and the command layer: startup
// discovery (object registration, connectivity flag, mode polling) and
// host state writes turned into commands whose results flow back as
// property updates.

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use arlo_api::{Connector, HttpConnector};
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::command::{Action, CommandDispatcher, CommandResult};
use crate::config::ClientConfig;
use crate::error::CoreError;
use crate::host::{objects_for, property, HostSink};
use crate::model::DeviceRegistry;
use crate::poll::PollScheduler;
use crate::session::SessionManager;

/// Drives one account on behalf of a host.
pub struct Adapter<C: Connector, H: HostSink> {
    dispatcher: Arc<CommandDispatcher<C>>,
    host: Arc<H>,
    registry: ArcSwap<DeviceRegistry>,
    state_poll: Duration,
    poller: Mutex<Option<PollScheduler>>,
}

impl<H: HostSink> Adapter<HttpConnector, H> {
    pub fn from_config(config: &ClientConfig, host: Arc<H>) -> Self {
        let sessions = Arc::new(SessionManager::from_config(config));
        Self::new(
            Arc::new(CommandDispatcher::new(sessions)),
            host,
            config.state_poll,
        )
    }
}

impl<C: Connector, H: HostSink> Adapter<C, H> {
    pub fn new(dispatcher: Arc<CommandDispatcher<C>>, host: Arc<H>, state_poll: Duration) -> Self {
        Self {
            dispatcher,
            host,
            registry: ArcSwap::from_pointee(DeviceRegistry::default()),
            state_poll,
            poller: Mutex::new(None),
        }
    }

    pub fn host(&self) -> &Arc<H> {
        &self.host
    }

    pub fn dispatcher(&self) -> &Arc<CommandDispatcher<C>> {
        &self.dispatcher
    }

    /// Devices found by the last discovery.
    pub fn registry(&self) -> Arc<DeviceRegistry> {
        self.registry.load_full()
    }

    /// Log in once, read the inventory, log out.
    pub async fn discover(&self) -> Result<Arc<DeviceRegistry>, CoreError> {
        let registry = self
            .dispatcher
            .sessions()
            .with_session(|session| async move { session.registry().await })
            .await?;

        let registry = Arc::new(registry);
        self.registry.store(Arc::clone(&registry));
        Ok(registry)
    }

    /// Startup: discover devices, register their objects, report the
    /// connection, start mode polling.
    ///
    /// A failed discovery is logged and returned; nothing is registered and
    /// nothing is retried.
    pub async fn on_ready(&self) -> Result<(), CoreError> {
        let registry = match self.discover().await {
            Ok(registry) => registry,
            Err(e) => {
                error!(error = %e, "device discovery failed");
                return Err(e);
            }
        };

        for device in registry.iter() {
            for (id, spec) in objects_for(device) {
                self.host.register_object(&id, spec);
            }
        }
        self.host.set_connected(true);
        info!(devices = registry.len(), "discovery complete");

        self.start_polling(&registry).await;
        Ok(())
    }

    /// Run an action named by a host state.
    ///
    /// Names that are not actions (e.g. `lastSnapshot`) are ignored, as are
    /// falsy values.
    pub async fn on_action(
        &self,
        device_id: &str,
        action: &str,
        value: bool,
    ) -> Option<CommandResult> {
        let Ok(action) = action.parse::<Action>() else {
            debug!(device = %device_id, state = %action, "not an action state");
            return None;
        };

        let result = self.dispatcher.execute(device_id, action, value).await?;
        apply_result(self.host.as_ref(), device_id, &result);
        Some(result)
    }

    /// Host state write, addressed as `<namespace>.<deviceId>.<action>`.
    pub async fn on_state_change(&self, state_id: &str, value: bool) -> Option<CommandResult> {
        let mut parts = state_id.rsplit('.');
        let (Some(action), Some(device_id)) = (parts.next(), parts.next()) else {
            debug!(state = %state_id, "ignoring state outside any device");
            return None;
        };
        info!(state = %state_id, value, "state changed");
        self.on_action(device_id, action, value).await
    }

    /// Stop polling and report the adapter as disconnected.
    pub async fn shutdown(&self) {
        if let Some(poller) = self.poller.lock().await.take() {
            poller.shutdown().await;
        }
        self.host.set_connected(false);
        debug!("adapter stopped");
    }

    async fn start_polling(&self, registry: &DeviceRegistry) {
        let base_stations: Vec<String> = registry
            .base_stations()
            .map(|d| d.serial.clone())
            .collect();
        if base_stations.is_empty() {
            debug!("no base stations, mode polling disabled");
            return;
        }

        let host = Arc::clone(&self.host);
        let scheduler = PollScheduler::start(
            Arc::clone(&self.dispatcher),
            base_stations,
            self.state_poll,
            move |serial, result| apply_result(host.as_ref(), serial, result),
        );

        let previous = self.poller.lock().await.replace(scheduler);
        if let Some(previous) = previous {
            previous.shutdown().await;
        }
    }
}

/// Write a command's outcome to the host's device properties.
fn apply_result<H: HostSink + ?Sized>(host: &H, device_id: &str, result: &CommandResult) {
    match result {
        CommandResult::SnapshotReady { url, timestamp } => {
            host.set_property(device_id, property::LAST_SNAPSHOT, url);
            host.set_property(device_id, property::LAST_SNAPSHOT_DATE, timestamp);
        }
        CommandResult::StreamReady { url, timestamp } => {
            host.set_property(device_id, property::LAST_STREAM, url);
            host.set_property(device_id, property::LAST_STREAM_DATE, timestamp);
        }
        CommandResult::ModeInfo { mode, schedule } => {
            host.set_property(device_id, property::MODE, mode);
            host.set_property(device_id, property::SCHEDULE, schedule);
        }
        CommandResult::ArmAck | CommandResult::DisarmAck | CommandResult::Failure { .. } => {}
    }
}
