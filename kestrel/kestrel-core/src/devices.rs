//! Device collaborator boundary
//!
//! Devices are an alternative execution target for tasks no agent can take.
//! The engine only needs to look devices up by capability and to bind or
//! release a task; everything else about a device belongs to the registry
//! implementation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::tasks::TaskId;

/// Unique identifier for a device
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeviceId(String);

impl DeviceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Availability of a device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceStatus {
    /// Reachable and free
    Online,

    /// Holding a task
    Busy,

    /// Not reachable
    Offline,
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DeviceStatus::Online => "online",
            DeviceStatus::Busy => "busy",
            DeviceStatus::Offline => "offline",
        };
        f.write_str(label)
    }
}

/// Planar position of a device
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Location {
    pub x: f64,
    pub y: f64,
}

/// Metadata reported by a registry for one device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub id: DeviceId,
    pub name: String,

    /// Capability-like type tag, e.g. `cpu` or `sensor_hub`
    pub device_type: String,

    pub status: DeviceStatus,

    /// Percent, 0-100
    pub battery_level: f64,

    /// Percent, 0-100
    pub signal_strength: f64,

    pub assigned_task: Option<TaskId>,
    pub location: Location,
}

impl DeviceInfo {
    /// Online with no task bound
    pub fn is_available(&self) -> bool {
        self.status == DeviceStatus::Online && self.assigned_task.is_none()
    }

    /// Case-insensitive substring match of the capability against the type tag
    pub fn matches_capability(&self, capability: &str) -> bool {
        self.device_type
            .to_lowercase()
            .contains(&capability.to_lowercase())
    }
}

/// A single measured value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub metric: String,
    pub value: f64,
    pub unit: String,
    pub timestamp: DateTime<Utc>,
}

/// Registry of devices that can take tasks
pub trait DeviceRegistry: Send {
    /// Available devices, optionally restricted to those matching a capability
    fn list_available(&self, capability: Option<&str>) -> Vec<DeviceInfo>;

    /// Bind a task to a device. `false` if the device is unknown.
    fn assign(&mut self, task_id: TaskId, device_id: &DeviceId) -> bool;

    /// Release whichever device holds the task. `false` if none does.
    fn release(&mut self, task_id: TaskId) -> bool;

    /// Every registered device
    fn devices(&self) -> Vec<DeviceInfo>;

    /// Up to `limit` fresh readings from a device, empty if unknown
    fn readings(&mut self, device_id: &DeviceId, limit: usize) -> Vec<Reading>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(device_type: &str, status: DeviceStatus) -> DeviceInfo {
        DeviceInfo {
            id: DeviceId::new(format!("{}_1", device_type)),
            name: device_type.to_string(),
            device_type: device_type.to_string(),
            status,
            battery_level: 90.0,
            signal_strength: 80.0,
            assigned_task: None,
            location: Location::default(),
        }
    }

    #[test]
    fn test_capability_match_is_substring() {
        let hub = device("sensor_hub", DeviceStatus::Online);
        assert!(hub.matches_capability("sensor"));
        assert!(hub.matches_capability("Sensor_Hub"));
        assert!(!hub.matches_capability("cpu"));
    }

    #[test]
    fn test_availability() {
        assert!(device("cpu", DeviceStatus::Online).is_available());
        assert!(!device("cpu", DeviceStatus::Busy).is_available());

        let mut held = device("cpu", DeviceStatus::Online);
        held.assigned_task = Some(TaskId::new());
        assert!(!held.is_available());
    }
}
