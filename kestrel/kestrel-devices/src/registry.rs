//! In-memory device registry with simulated telemetry

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use kestrel_core::devices::{DeviceId, DeviceInfo, DeviceRegistry, DeviceStatus, Location, Reading};
use kestrel_core::tasks::TaskId;

use crate::error::{DeviceError, Result};
use crate::sensors::SensorKind;

struct SimulatedDevice {
    info: DeviceInfo,
    kind: SensorKind,
    last_data: Vec<Reading>,
}

/// Registry of simulated devices.
///
/// Devices are kept in registration order, which is also the order
/// [`DeviceRegistry::list_available`] reports them in.
pub struct SimulatedDeviceRegistry {
    devices: Vec<SimulatedDevice>,
    rng: StdRng,
}

impl SimulatedDeviceRegistry {
    /// Empty registry seeded from the thread RNG
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_rng(&mut rand::rng()))
    }

    /// Empty registry with reproducible telemetry
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            devices: Vec::new(),
            rng,
        }
    }

    /// Registry holding one device of every sensor kind
    pub fn with_demo_devices() -> Self {
        let mut registry = Self::new();
        registry.add_demo_devices();
        registry
    }

    /// Add one device of every sensor kind
    pub fn add_demo_devices(&mut self) -> Vec<DeviceId> {
        SensorKind::ALL
            .iter()
            .map(|kind| self.add_device(kind.display_name(), *kind))
            .collect()
    }

    /// Register a device typed by its sensor kind
    pub fn add_device(&mut self, name: impl Into<String>, kind: SensorKind) -> DeviceId {
        self.insert(name.into(), kind.type_tag().to_string(), kind)
    }

    /// Register a device under a custom type tag, e.g. `temperature_reading`
    pub fn add_tagged_device(
        &mut self,
        name: impl Into<String>,
        device_type: impl Into<String>,
        kind: SensorKind,
    ) -> Result<DeviceId> {
        let device_type = device_type.into().trim().to_lowercase().replace(' ', "_");
        if device_type.is_empty() {
            return Err(DeviceError::InvalidTag(device_type));
        }
        Ok(self.insert(name.into(), device_type, kind))
    }

    fn insert(&mut self, name: String, device_type: String, kind: SensorKind) -> DeviceId {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        let id = DeviceId::new(format!("{}_{}", device_type, &suffix[..8]));

        let info = DeviceInfo {
            id: id.clone(),
            name,
            device_type,
            status: DeviceStatus::Online,
            battery_level: self.rng.random_range(60.0..100.0),
            signal_strength: self.rng.random_range(70.0..100.0),
            assigned_task: None,
            location: Location {
                x: self.rng.random_range(0.0..100.0),
                y: self.rng.random_range(0.0..100.0),
            },
        };

        info!(device_id = %id, name = %info.name, device_type = %info.device_type, "device registered");
        self.devices.push(SimulatedDevice {
            info,
            kind,
            last_data: Vec::new(),
        });
        id
    }

    fn find_mut(&mut self, device_id: &DeviceId) -> Result<&mut SimulatedDevice> {
        self.devices
            .iter_mut()
            .find(|device| &device.info.id == device_id)
            .ok_or_else(|| DeviceError::UnknownDevice(device_id.clone()))
    }

    /// Metadata of one device
    pub fn device(&self, device_id: &DeviceId) -> Result<&DeviceInfo> {
        self.devices
            .iter()
            .find(|device| &device.info.id == device_id)
            .map(|device| &device.info)
            .ok_or_else(|| DeviceError::UnknownDevice(device_id.clone()))
    }

    /// Most recent readings taken from a device
    pub fn last_data(&self, device_id: &DeviceId) -> Result<&[Reading]> {
        self.devices
            .iter()
            .find(|device| &device.info.id == device_id)
            .map(|device| device.last_data.as_slice())
            .ok_or_else(|| DeviceError::UnknownDevice(device_id.clone()))
    }

    /// Force a device status, e.g. to take it offline
    pub fn set_status(&mut self, device_id: &DeviceId, status: DeviceStatus) -> Result<()> {
        let device = self.find_mut(device_id)?;
        device.info.status = status;
        debug!(device_id = %device_id, status = %status, "device status set");
        Ok(())
    }

    /// Drain batteries and jitter signal strength, as a polling dashboard
    /// would observe between refreshes
    pub fn tick_telemetry(&mut self) {
        for device in &mut self.devices {
            let drain = self.rng.random_range(0.0..0.1);
            let jitter = self.rng.random_range(-0.5..0.5);
            device.info.battery_level = (device.info.battery_level - drain).max(0.0);
            device.info.signal_strength = (device.info.signal_strength + jitter).clamp(0.0, 100.0);
        }
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

impl Default for SimulatedDeviceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceRegistry for SimulatedDeviceRegistry {
    fn list_available(&self, capability: Option<&str>) -> Vec<DeviceInfo> {
        self.devices
            .iter()
            .map(|device| &device.info)
            .filter(|info| info.is_available())
            .filter(|info| capability.is_none_or(|c| info.matches_capability(c)))
            .cloned()
            .collect()
    }

    fn assign(&mut self, task_id: TaskId, device_id: &DeviceId) -> bool {
        match self.find_mut(device_id) {
            Ok(device) => {
                device.info.assigned_task = Some(task_id);
                device.info.status = DeviceStatus::Busy;
                debug!(device_id = %device_id, task_id = %task_id, "device bound to task");
                true
            }
            Err(_) => false,
        }
    }

    fn release(&mut self, task_id: TaskId) -> bool {
        match self
            .devices
            .iter_mut()
            .find(|device| device.info.assigned_task == Some(task_id))
        {
            Some(device) => {
                device.info.assigned_task = None;
                device.info.status = DeviceStatus::Online;
                debug!(device_id = %device.info.id, task_id = %task_id, "device released");
                true
            }
            None => false,
        }
    }

    fn devices(&self) -> Vec<DeviceInfo> {
        self.devices.iter().map(|device| device.info.clone()).collect()
    }

    fn readings(&mut self, device_id: &DeviceId, limit: usize) -> Vec<Reading> {
        let Some(index) = self.devices.iter().position(|d| &d.info.id == device_id) else {
            return Vec::new();
        };

        let now = Utc::now();
        let kind = self.devices[index].kind;
        let readings: Vec<Reading> = kind
            .sample(&mut self.rng)
            .into_iter()
            .take(limit)
            .map(|(metric, value, unit)| Reading {
                metric: metric.to_string(),
                value,
                unit: unit.to_string(),
                timestamp: now,
            })
            .collect();

        self.devices[index].last_data = readings.clone();
        readings
    }
}
