// ── Host integration seam ──
//
// The home-automation host owns an object tree of devices and states.
// The adapter only ever registers objects, writes property values and
// flips the connectivity flag, so that is all `HostSink` asks for.

pub mod memory;

pub use memory::{MemoryHost, PropertyUpdate};

use serde::Serialize;

use crate::model::{Device, DeviceKind};

/// Property names the adapter writes.
pub mod property {
    pub const LAST_SNAPSHOT: &str = "lastSnapshot";
    pub const LAST_SNAPSHOT_DATE: &str = "lastSnapshotDate";
    pub const LAST_STREAM: &str = "lastStream";
    pub const LAST_STREAM_DATE: &str = "lastStreamDate";
    pub const MODE: &str = "mode";
    pub const SCHEDULE: &str = "schedule";
}

/// Outbound calls into the host.
pub trait HostSink: Send + Sync + 'static {
    /// Create or replace the object at `id` (`<serial>` or `<serial>.<state>`).
    fn register_object(&self, id: &str, spec: ObjectSpec);

    /// Write a property value of a device.
    fn set_property(&self, device_id: &str, property: &str, value: &str);

    /// Report whether the adapter is connected to the service.
    fn set_connected(&self, connected: bool);
}

/// Definition of one host object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ObjectSpec {
    Device { name: String, kind: DeviceKind },
    State(StateSpec),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Boolean,
    String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StateRole {
    /// Write-only trigger.
    Button,
    State,
}

/// A state under a device object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateSpec {
    pub name: String,
    pub value_type: ValueType,
    pub role: StateRole,
    pub read: bool,
    pub write: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<bool>,
}

impl StateSpec {
    pub fn button(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            value_type: ValueType::Boolean,
            role: StateRole::Button,
            read: false,
            write: true,
            default: Some(false),
        }
    }

    pub fn value(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            value_type: ValueType::String,
            role: StateRole::State,
            read: true,
            write: true,
            default: None,
        }
    }

    pub fn is_button(&self) -> bool {
        self.role == StateRole::Button
    }
}

/// Every object a device registers, device object first.
///
/// Cameras get snapshot/stream buttons and the result states; base
/// stations get arm/disarm buttons and the polled mode/schedule states.
pub fn objects_for(device: &Device) -> Vec<(String, ObjectSpec)> {
    let mut objects = vec![(
        device.serial.clone(),
        ObjectSpec::Device {
            name: device.display_name.clone(),
            kind: device.kind,
        },
    )];

    let states = if device.kind.is_camera() {
        vec![
            ("snapshot", StateSpec::button("Snapshot")),
            (property::LAST_SNAPSHOT, StateSpec::value("LastSnapshot")),
            (property::LAST_SNAPSHOT_DATE, StateSpec::value("LastSnapshotDate")),
            ("stream", StateSpec::button("Stream")),
            (property::LAST_STREAM, StateSpec::value("LastStream")),
            (property::LAST_STREAM_DATE, StateSpec::value("LastStreamDate")),
        ]
    } else {
        vec![
            ("arm", StateSpec::button("Arm")),
            ("disarm", StateSpec::button("Disarm")),
            (property::MODE, StateSpec::value("Mode")),
            (property::SCHEDULE, StateSpec::value("Schedule")),
        ]
    };

    objects.extend(
        states
            .into_iter()
            .map(|(state, spec)| (format!("{}.{state}", device.serial), ObjectSpec::State(spec))),
    );
    objects
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(serial: &str, kind: DeviceKind) -> Device {
        Device {
            serial: serial.into(),
            kind,
            device_type: kind.to_string(),
            name: "Porch".into(),
            display_name: format!("{kind} - Porch"),
            parent: None,
            gateway_id: serial.into(),
            xcloud_id: None,
        }
    }

    #[test]
    fn camera_objects() {
        let objects = objects_for(&device("C1", DeviceKind::Camera));
        let ids: Vec<&str> = objects.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "C1",
                "C1.snapshot",
                "C1.lastSnapshot",
                "C1.lastSnapshotDate",
                "C1.stream",
                "C1.lastStream",
                "C1.lastStreamDate",
            ]
        );

        let ObjectSpec::State(ref snapshot) = objects[1].1 else {
            panic!("expected a state");
        };
        assert_eq!(snapshot.name, "Snapshot");
        assert!(snapshot.is_button());
        assert!(!snapshot.read);
        assert_eq!(snapshot.default, Some(false));

        let ObjectSpec::State(ref last) = objects[3].1 else {
            panic!("expected a state");
        };
        assert_eq!(last.name, "LastSnapshotDate");
        assert!(last.read && last.write);
    }

    #[test]
    fn base_station_objects() {
        let objects = objects_for(&device("B1", DeviceKind::BaseStation));
        let ids: Vec<&str> = objects.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["B1", "B1.arm", "B1.disarm", "B1.mode", "B1.schedule"]);
        assert_eq!(
            objects[0].1,
            ObjectSpec::Device {
                name: "basestation - Porch".into(),
                kind: DeviceKind::BaseStation,
            }
        );
    }
}
