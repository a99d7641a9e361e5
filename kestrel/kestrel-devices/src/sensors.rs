//! Sensor kinds and their simulated measurements

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of simulated hardware behind a device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    Cpu,
    Ram,
    Disk,
    SensorHub,
}

impl SensorKind {
    /// Every kind, in the order the demo registry creates them
    pub const ALL: [SensorKind; 4] = [
        SensorKind::Cpu,
        SensorKind::Ram,
        SensorKind::Disk,
        SensorKind::SensorHub,
    ];

    /// Human-readable device name
    pub fn display_name(&self) -> &'static str {
        match self {
            SensorKind::Cpu => "CPU Sensor",
            SensorKind::Ram => "RAM Monitor",
            SensorKind::Disk => "Disk Scanner",
            SensorKind::SensorHub => "Sensor Hub",
        }
    }

    /// Type tag matched against task capabilities
    pub fn type_tag(&self) -> &'static str {
        match self {
            SensorKind::Cpu => "cpu",
            SensorKind::Ram => "ram",
            SensorKind::Disk => "disk",
            SensorKind::SensorHub => "sensor_hub",
        }
    }

    /// One round of measurements as `(metric, value, unit)`
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<(&'static str, f64, &'static str)> {
        match self {
            SensorKind::Cpu => vec![
                ("temperature", round2(rng.random_range(35.0..80.0)), "°C"),
                ("usage_percent", round2(rng.random_range(5.0..95.0)), "%"),
            ],
            SensorKind::Ram => vec![
                ("used_gb", round2(rng.random_range(1.0..15.0)), "GB"),
                ("available_gb", round2(rng.random_range(1.0..16.0)), "GB"),
            ],
            SensorKind::Disk => vec![
                ("disk_used_percent", round2(rng.random_range(20.0..90.0)), "%"),
                ("disk_read_speed", round2(rng.random_range(100.0..500.0)), "MB/s"),
            ],
            SensorKind::SensorHub => vec![
                ("temperature", round2(rng.random_range(15.0..35.0)), "°C"),
                ("humidity", round2(rng.random_range(30.0..70.0)), "%"),
                ("motion_detected", if rng.random::<bool>() { 1.0 } else { 0.0 }, ""),
            ],
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
