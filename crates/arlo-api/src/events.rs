//! Server-push event channel.
//!
//! Opened once per session. A background task reads the session's
//! `text/event-stream`, fetches the device inventory as soon as the service
//! reports the stream as connected, and fans device events out through a
//! [`tokio::sync::broadcast`] channel.
//!
//! # Example
//!
//! ```rust,ignore
//! use arlo_api::{EventChannel, EventFilter, EventKind};
//!
//! let channel = EventChannel::open(client).await?;
//! let devices = channel.devices_ready().await?;
//!
//! let mut snapshots = channel.subscribe(EventFilter::new(EventKind::FfSnapshotAvailable, "C1"));
//! // ...issue the snapshot request...
//! let event = snapshots.next().await?;
//! println!("{}", event.payload.as_deref().unwrap_or(""));
//!
//! channel.close();
//! ```

use std::sync::Arc;

use futures_core::Stream;
use futures_util::StreamExt;
use serde::Serialize;
use strum::{Display, EnumString};
use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;

use crate::client::ArloClient;
use crate::error::Error;
use crate::models::RawDevice;
use crate::sse;
use crate::transport::Transport;

// ── Broadcast channel capacity ───────────────────────────────────────

const EVENT_CHANNEL_CAPACITY: usize = 256;

// ── ArloEvent ────────────────────────────────────────────────────────

/// Kind of an asynchronous device event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    /// A requested full-frame snapshot has been uploaded.
    FfSnapshotAvailable,
    /// A base station switched its active mode.
    ModeChanged,
    /// Anything else the service pushes (state dumps, property updates).
    Other,
}

/// A parsed event from the push stream.
#[derive(Debug, Clone, Serialize)]
pub struct ArloEvent {
    pub kind: EventKind,
    /// Serial of the device the event is about.
    pub device_id: String,
    /// Event payload: the image URL for snapshots, the mode id for mode changes.
    pub payload: Option<String>,
    /// The full message, nothing dropped.
    pub raw: serde_json::Value,
}

/// Selects the events one waiter cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventFilter {
    pub kind: EventKind,
    pub device_id: String,
}

impl EventFilter {
    pub fn new(kind: EventKind, device_id: impl Into<String>) -> Self {
        Self {
            kind,
            device_id: device_id.into(),
        }
    }

    pub fn matches(&self, event: &ArloEvent) -> bool {
        event.kind == self.kind && event.device_id == self.device_id
    }
}

// ── Inventory ────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Inventory {
    Pending,
    Ready(Arc<Vec<RawDevice>>),
    Failed(String),
}

// ── EventChannel ─────────────────────────────────────────────────────

/// Handle to one session's push stream.
///
/// Dropping the handle (or calling [`close`](Self::close)) stops the
/// background reader; subscriptions then observe [`Error::ChannelClosed`].
pub struct EventChannel {
    event_rx: broadcast::Receiver<Arc<ArloEvent>>,
    inventory: watch::Receiver<Inventory>,
    cancel: CancellationToken,
}

impl EventChannel {
    /// Subscribe to the session's push stream and spawn the reader task.
    ///
    /// Returns once the stream is open; a refused subscription is an error
    /// here rather than a failed inventory later.
    pub async fn open<T: Transport>(client: Arc<ArloClient<T>>) -> Result<Self, Error> {
        let bytes = client.subscribe().await?;

        let (event_tx, event_rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (inventory_tx, inventory) = watch::channel(Inventory::Pending);
        let cancel = CancellationToken::new();

        let task_cancel = cancel.clone();
        tokio::spawn(async move {
            let frames = sse::data_frames(bytes);
            read_loop(frames, &client, &event_tx, &inventory_tx, &task_cancel).await;
            inventory_tx.send_if_modified(|state| {
                if matches!(state, Inventory::Pending) {
                    *state = Inventory::Failed(
                        "event stream closed before the device inventory arrived".into(),
                    );
                    true
                } else {
                    false
                }
            });
            tracing::debug!("event channel reader exiting");
        });

        Ok(Self {
            event_rx,
            inventory,
            cancel,
        })
    }

    /// Wait for the device inventory of this session.
    ///
    /// Resolves exactly one inventory per channel; later calls return the
    /// same list. Fails if the stream dropped before the inventory arrived.
    pub async fn devices_ready(&self) -> Result<Arc<Vec<RawDevice>>, Error> {
        let mut rx = self.inventory.clone();
        let state = rx
            .wait_for(|state| !matches!(state, Inventory::Pending))
            .await
            .map_err(|_| Error::ChannelClosed)?
            .clone();

        match state {
            Inventory::Ready(devices) => Ok(devices),
            Inventory::Failed(reason) => Err(Error::EventStream(reason)),
            Inventory::Pending => Err(Error::ChannelClosed),
        }
    }

    /// Register interest in events matching `filter`.
    ///
    /// Only events broadcast after this call are delivered, so register
    /// before issuing the request that triggers the event.
    pub fn subscribe(&self, filter: EventFilter) -> EventSubscription {
        EventSubscription {
            rx: self.event_rx.resubscribe(),
            filter,
        }
    }

    /// Stop the background reader.
    pub fn close(&self) {
        self.cancel.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Drop for EventChannel {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

// ── EventSubscription ────────────────────────────────────────────────

/// A filtered view of the session's events.
pub struct EventSubscription {
    rx: broadcast::Receiver<Arc<ArloEvent>>,
    filter: EventFilter,
}

impl EventSubscription {
    /// Wait for the next matching event.
    pub async fn next(&mut self) -> Result<Arc<ArloEvent>, Error> {
        loop {
            match self.rx.recv().await {
                Ok(event) if self.filter.matches(&event) => return Ok(event),
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, filter = ?self.filter, "event subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return Err(Error::ChannelClosed),
            }
        }
    }

    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }
}

// ── Background reader ────────────────────────────────────────────────

async fn read_loop<T: Transport>(
    frames: impl Stream<Item = Result<String, Error>> + Send,
    client: &ArloClient<T>,
    event_tx: &broadcast::Sender<Arc<ArloEvent>>,
    inventory_tx: &watch::Sender<Inventory>,
    cancel: &CancellationToken,
) {
    let mut frames = std::pin::pin!(frames);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => return,
            frame = frames.next() => {
                match frame {
                    Some(Ok(data)) => match decode_frame(&data) {
                        Frame::Connected => {
                            if matches!(*inventory_tx.borrow(), Inventory::Pending) {
                                publish_inventory(client, inventory_tx).await;
                            }
                        }
                        Frame::Event(event) => {
                            tracing::debug!(kind = %event.kind, device = %event.device_id, "push event");
                            // No subscribers right now is fine
                            let _ = event_tx.send(Arc::new(event));
                        }
                        Frame::Ignored => {}
                    },
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "event stream failed");
                        return;
                    }
                    None => {
                        tracing::info!("event stream ended");
                        return;
                    }
                }
            }
        }
    }
}

async fn publish_inventory<T: Transport>(
    client: &ArloClient<T>,
    inventory_tx: &watch::Sender<Inventory>,
) {
    let state = match client.list_devices().await {
        Ok(devices) => {
            tracing::debug!(count = devices.len(), "device inventory ready");
            Inventory::Ready(Arc::new(devices))
        }
        Err(e) => {
            tracing::warn!(error = %e, "failed to fetch device inventory");
            Inventory::Failed(e.to_string())
        }
    };
    let _ = inventory_tx.send(state);
}

// ── Message parsing ──────────────────────────────────────────────────

#[derive(Debug)]
enum Frame {
    Connected,
    Event(ArloEvent),
    Ignored,
}

/// Classify one `data:` payload.
fn decode_frame(data: &str) -> Frame {
    let value: serde_json::Value = match serde_json::from_str(data) {
        Ok(v) => v,
        Err(e) => {
            tracing::debug!(error = %e, "failed to parse push message");
            return Frame::Ignored;
        }
    };

    if value["status"].as_str() == Some("connected") {
        return Frame::Connected;
    }

    match event_from_raw(&value) {
        Some(event) => Frame::Event(event),
        None => {
            tracing::trace!(message = %value, "ignoring push message");
            Frame::Ignored
        }
    }
}

/// Build an [`ArloEvent`] from a device message, if it names a device.
fn event_from_raw(value: &serde_json::Value) -> Option<ArloEvent> {
    let resource = value["resource"].as_str()?;
    let action = value["action"].as_str().unwrap_or("");

    let (kind, device_id, payload) = if let Some(camera) = resource.strip_prefix("cameras/") {
        if action == "fullFrameSnapshotAvailable" {
            let url = value["properties"]["presignedFullFrameSnapshotUrl"]
                .as_str()
                .map(String::from);
            (EventKind::FfSnapshotAvailable, camera.to_owned(), url)
        } else {
            (EventKind::Other, camera.to_owned(), None)
        }
    } else if resource == "modes" {
        let gateway = value["from"].as_str()?;
        let mode = value["properties"]["active"].as_str().map(String::from);
        (EventKind::ModeChanged, gateway.to_owned(), mode)
    } else {
        let (_, id) = resource.split_once('/')?;
        (EventKind::Other, id.to_owned(), None)
    };

    Some(ArloEvent {
        kind,
        device_id,
        payload,
        raw: value.clone(),
    })
}

// ── Tests ────────────────────────────────────────────────────────────
