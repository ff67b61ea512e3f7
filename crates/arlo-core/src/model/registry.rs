// ── Device registry ──
//
// Turns the flat inventory from `users/devices` into a two-level
// hierarchy: base stations, and the cameras that hang off them. Pure and
// synchronous; rebuilt wholesale on every login.

use std::collections::HashMap;

use arlo_api::RawDevice;
use indexmap::IndexMap;
use tracing::debug;

use super::device::{Device, DeviceKind};
use crate::error::CoreError;

/// Serial-indexed view of one login's devices, in inventory order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceRegistry {
    devices: IndexMap<String, Device>,
    children: HashMap<String, Vec<String>>,
}

impl DeviceRegistry {
    /// Build the hierarchy from a raw inventory.
    ///
    /// Base stations are indexed first, so a camera listed before its base
    /// station still resolves. Cameras whose `parentId` names no base station
    /// in the inventory are kept, without a parent.
    pub fn build(raw: &[RawDevice]) -> Self {
        let mut devices = IndexMap::with_capacity(raw.len());
        let mut children: HashMap<String, Vec<String>> = HashMap::new();

        let kinds: Vec<Option<DeviceKind>> = raw
            .iter()
            .map(|d| d.device_type.parse::<DeviceKind>().ok())
            .collect();

        let base_names: HashMap<&str, &str> = raw
            .iter()
            .zip(&kinds)
            .filter(|(_, kind)| **kind == Some(DeviceKind::BaseStation))
            .map(|(d, _)| (d.device_id.as_str(), d.device_name.as_str()))
            .collect();

        for (entry, kind) in raw.iter().zip(kinds) {
            let Some(kind) = kind else {
                debug!(
                    device = %entry.device_id,
                    device_type = %entry.device_type,
                    "skipping unsupported device type"
                );
                continue;
            };

            let parent = match kind {
                DeviceKind::BaseStation => None,
                DeviceKind::Camera | DeviceKind::ArloQ => entry
                    .parent_id
                    .as_deref()
                    .filter(|p| *p != entry.device_id)
                    .and_then(|p| base_names.get_key_value(p)),
            };

            let display_name = match parent {
                Some((_, parent_name)) => format!(
                    "{} - {} ({parent_name})",
                    entry.device_type, entry.device_name
                ),
                None => format!("{} - {}", entry.device_type, entry.device_name),
            };

            let parent = parent.map(|(serial, _)| (*serial).to_owned());
            if let Some(ref p) = parent {
                children
                    .entry(p.clone())
                    .or_default()
                    .push(entry.device_id.clone());
            }

            let device = Device {
                serial: entry.device_id.clone(),
                kind,
                device_type: entry.device_type.clone(),
                name: entry.device_name.clone(),
                display_name,
                parent,
                gateway_id: entry
                    .parent_id
                    .clone()
                    .unwrap_or_else(|| entry.device_id.clone()),
                xcloud_id: entry.x_cloud_id.clone(),
            };
            devices.insert(device.serial.clone(), device);
        }

        debug!(
            devices = devices.len(),
            base_stations = base_names.len(),
            "device registry built"
        );
        Self { devices, children }
    }

    /// Resolve a serial, failing with [`CoreError::DeviceNotFound`].
    pub fn lookup(&self, serial: &str) -> Result<&Device, CoreError> {
        self.get(serial).ok_or_else(|| CoreError::DeviceNotFound {
            identifier: serial.to_owned(),
        })
    }

    pub fn get(&self, serial: &str) -> Option<&Device> {
        self.devices.get(serial)
    }

    /// The base station a camera hangs off, if it resolved.
    pub fn parent_of(&self, serial: &str) -> Option<&Device> {
        self.get(serial)?
            .parent
            .as_deref()
            .and_then(|p| self.devices.get(p))
    }

    /// Cameras attached to a base station, in inventory order.
    pub fn cameras_of(&self, base_serial: &str) -> Vec<&Device> {
        self.children
            .get(base_serial)
            .into_iter()
            .flatten()
            .filter_map(|serial| self.devices.get(serial))
            .collect()
    }

    pub fn base_stations(&self) -> impl Iterator<Item = &Device> {
        self.devices.values().filter(|d| d.is_base_station())
    }

    /// Cameras and Arlo Q units.
    pub fn cameras(&self) -> impl Iterator<Item = &Device> {
        self.devices.values().filter(|d| d.kind.is_camera())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Device> {
        self.devices.values()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(id: &str, name: &str, device_type: &str, parent: Option<&str>) -> RawDevice {
        serde_json::from_value(serde_json::json!({
            "deviceId": id,
            "deviceName": name,
            "deviceType": device_type,
            "parentId": parent,
            "xCloudId": format!("X-{id}"),
        }))
        .unwrap()
    }

    fn inventory() -> Vec<RawDevice> {
        vec![
            raw("C1", "Porch", "camera", Some("B1")),
            raw("B1", "Home", "basestation", Some("B1")),
            raw("C2", "Garden", "camera", Some("B1")),
            raw("Q1", "Nursery", "arloqs", Some("Q1")),
            raw("L1", "Floodlight", "lights", Some("B1")),
        ]
    }

    #[test]
    fn builds_hierarchy_regardless_of_order() {
        let registry = DeviceRegistry::build(&inventory());

        assert_eq!(registry.len(), 4);
        assert_eq!(registry.parent_of("C1").unwrap().serial, "B1");
        let cameras: Vec<&str> = registry
            .cameras_of("B1")
            .iter()
            .map(|d| d.serial.as_str())
            .collect();
        assert_eq!(cameras, vec!["C1", "C2"]);
    }

    #[test]
    fn display_names_include_resolved_parent() {
        let registry = DeviceRegistry::build(&inventory());

        assert_eq!(registry.get("B1").unwrap().display_name, "basestation - Home");
        assert_eq!(registry.get("C1").unwrap().display_name, "camera - Porch (Home)");
        assert_eq!(registry.get("Q1").unwrap().display_name, "arloqs - Nursery");
    }

    #[test]
    fn orphan_camera_is_kept_without_parent() {
        let registry = DeviceRegistry::build(&[raw("C9", "Shed", "camera", Some("B404"))]);

        let orphan = registry.lookup("C9").unwrap();
        assert!(orphan.parent.is_none());
        assert_eq!(orphan.display_name, "camera - Shed");
        // Commands still route through the reported gateway
        assert_eq!(orphan.gateway_id, "B404");
        assert!(registry.parent_of("C9").is_none());
    }

    #[test]
    fn arlo_q_routes_to_itself() {
        let registry = DeviceRegistry::build(&inventory());
        let q = registry.lookup("Q1").unwrap();
        assert_eq!(q.kind, DeviceKind::ArloQ);
        assert!(q.parent.is_none());
        assert_eq!(q.address().gateway_id, "Q1");
        assert_eq!(q.address().xcloud_id.as_deref(), Some("X-Q1"));
    }

    #[test]
    fn unsupported_types_are_skipped() {
        let registry = DeviceRegistry::build(&inventory());
        assert!(registry.get("L1").is_none());
        assert_eq!(registry.base_stations().count(), 1);
        assert_eq!(registry.cameras().count(), 3);
    }

    #[test]
    fn lookup_unknown_serial_fails() {
        let registry = DeviceRegistry::build(&inventory());
        let err = registry.lookup("X").unwrap_err();
        assert!(matches!(err, CoreError::DeviceNotFound { ref identifier } if identifier == "X"));
    }

    #[test]
    fn build_is_pure() {
        let input = inventory();
        let before = input.clone();

        let a = DeviceRegistry::build(&input);
        let b = DeviceRegistry::build(&input);

        assert_eq!(input, before);
        assert_eq!(a, b);
    }

    #[test]
    fn empty_inventory_builds_empty_registry() {
        let registry = DeviceRegistry::build(&[]);
        assert!(registry.is_empty());
        assert!(registry.cameras_of("B1").is_empty());
    }
}
