// ── Mode polling ──
//
// One background task per base station: an immediate `queryMode`, then
// one every poll interval. Each tick is its own command (and session);
// a failed tick is logged and the next one runs on schedule.

use std::sync::Arc;
use std::time::Duration;

use arlo_api::Connector;
use futures_util::future::join_all;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::command::{Action, CommandDispatcher, CommandResult};

const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Handle to the running poll tasks.
pub struct PollScheduler {
    cancel: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

impl PollScheduler {
    /// Spawn one poll task per base station serial.
    ///
    /// `on_result` receives every tick's outcome, failures included.
    pub fn start<C, F>(
        dispatcher: Arc<CommandDispatcher<C>>,
        base_stations: Vec<String>,
        interval: Duration,
        on_result: F,
    ) -> Self
    where
        C: Connector,
        F: Fn(&str, &CommandResult) + Send + Sync + 'static,
    {
        let cancel = CancellationToken::new();
        let on_result = Arc::new(on_result);
        let interval = interval.max(MIN_POLL_INTERVAL);

        let handles = base_stations
            .into_iter()
            .map(|serial| {
                debug!(device = %serial, ?interval, "starting mode poll");
                tokio::spawn(poll_task(
                    Arc::clone(&dispatcher),
                    serial,
                    interval,
                    Arc::clone(&on_result),
                    cancel.clone(),
                ))
            })
            .collect();

        Self { cancel, handles }
    }

    /// Number of base stations being polled.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Stop polling and wait for every task to finish its current tick.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        for result in join_all(self.handles.drain(..)).await {
            if let Err(e) = result {
                warn!(error = %e, "poll task ended abnormally");
            }
        }
    }
}

impl Drop for PollScheduler {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn poll_task<C, F>(
    dispatcher: Arc<CommandDispatcher<C>>,
    serial: String,
    interval: Duration,
    on_result: Arc<F>,
    cancel: CancellationToken,
) where
    C: Connector,
    F: Fn(&str, &CommandResult) + Send + Sync + 'static,
{
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = ticker.tick() => {
                if let Some(result) = dispatcher.execute(&serial, Action::QueryMode, true).await {
                    if let CommandResult::Failure { reason, message } = &result {
                        warn!(device = %serial, %reason, %message, "mode poll failed");
                    }
                    on_result(&serial, &result);
                }
            }
        }
    }
    debug!(device = %serial, "mode poll stopped");
}
