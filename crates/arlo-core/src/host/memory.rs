// ── In-process host ──
//
// A `HostSink` that keeps the object tree and property values in memory
// and broadcasts every property write. Used by the CLI and by tests.

use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::broadcast;

use super::{HostSink, ObjectSpec};

const UPDATE_CHANNEL_SIZE: usize = 64;

/// One property write, as broadcast to subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyUpdate {
    pub device_id: String,
    pub property: String,
    pub value: String,
}

/// Thread-safe in-memory host.
pub struct MemoryHost {
    objects: DashMap<String, ObjectSpec>,
    values: DashMap<String, String>,
    connected: AtomicBool,
    updates: broadcast::Sender<PropertyUpdate>,
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryHost {
    pub fn new() -> Self {
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_SIZE);
        Self {
            objects: DashMap::new(),
            values: DashMap::new(),
            connected: AtomicBool::new(false),
            updates,
        }
    }

    /// Receive every property write from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<PropertyUpdate> {
        self.updates.subscribe()
    }

    pub fn object(&self, id: &str) -> Option<ObjectSpec> {
        self.objects.get(id).map(|entry| entry.value().clone())
    }

    /// All registered objects, sorted by id.
    pub fn objects(&self) -> Vec<(String, ObjectSpec)> {
        let mut objects: Vec<_> = self
            .objects
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        objects.sort_by(|a, b| a.0.cmp(&b.0));
        objects
    }

    pub fn property(&self, device_id: &str, property: &str) -> Option<String> {
        self.values
            .get(&format!("{device_id}.{property}"))
            .map(|entry| entry.value().clone())
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }
}

impl HostSink for MemoryHost {
    fn register_object(&self, id: &str, spec: ObjectSpec) {
        self.objects.insert(id.to_owned(), spec);
    }

    fn set_property(&self, device_id: &str, property: &str, value: &str) {
        self.values
            .insert(format!("{device_id}.{property}"), value.to_owned());
        // No subscribers is fine
        let _ = self.updates.send(PropertyUpdate {
            device_id: device_id.to_owned(),
            property: property.to_owned(),
            value: value.to_owned(),
        });
    }

    fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::StateSpec;

    #[test]
    fn stores_objects_and_values() {
        let host = MemoryHost::new();
        host.register_object("C1.snapshot", ObjectSpec::State(StateSpec::button("Snapshot")));
        host.set_property("C1", "lastSnapshot", "https://x/img.jpg");

        assert!(host.object("C1.snapshot").is_some());
        assert_eq!(
            host.property("C1", "lastSnapshot").as_deref(),
            Some("https://x/img.jpg")
        );
        assert!(host.property("C1", "lastStream").is_none());
    }

    #[test]
    fn broadcasts_property_writes() {
        let host = MemoryHost::new();
        let mut rx = host.subscribe();
        host.set_property("B1", "mode", "mode1");

        let update = rx.try_recv().unwrap();
        assert_eq!(update.device_id, "B1");
        assert_eq!(update.property, "mode");
        assert_eq!(update.value, "mode1");
    }

    #[test]
    fn connectivity_flag() {
        let host = MemoryHost::default();
        assert!(!host.is_connected());
        host.set_connected(true);
        assert!(host.is_connected());
    }
}
