//! Simulated devices for Kestrel
//!
//! Provides [`SimulatedDeviceRegistry`], an in-memory implementation of
//! [`kestrel_core::DeviceRegistry`] whose devices produce random telemetry.
//! Drivers attach it to a controller so tasks no agent can take have a
//! fallback target.
//!
//! ```
//! use kestrel_core::{Controller, TaskId};
//! use kestrel_devices::SimulatedDeviceRegistry;
//!
//! let mut controller = Controller::new()
//!     .with_device_registry(Box::new(SimulatedDeviceRegistry::with_demo_devices()));
//!
//! let task = TaskId::new();
//! let device = controller.assign_task_to_best_device(task, "disk").unwrap();
//! assert!(device.as_str().starts_with("disk_"));
//! assert!(controller.complete_device_task(task));
//! ```

pub mod error;
pub mod registry;
pub mod sensors;

pub use error::{DeviceError, Result};
pub use registry::SimulatedDeviceRegistry;
pub use sensors::SensorKind;
