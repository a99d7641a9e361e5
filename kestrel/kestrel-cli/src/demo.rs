//! Demo scenario: a smart-city IoT network with specialised agents.

use kestrel_core::{Controller, Task, TaskId, TaskStatus};
use kestrel_devices::{SensorKind, SimulatedDeviceRegistry};
use rand::Rng;
use rand::seq::IndexedRandom;
use std::collections::HashSet;
use tracing::{info, warn};

/// Blueprint for a demo task
pub struct TaskTemplate {
    pub name: &'static str,
    pub description: &'static str,
    pub required_capabilities: &'static [&'static str],
    pub complexity: f64,
    pub priority: f64,
    pub estimated_duration: f64,
}

impl TaskTemplate {
    pub fn build(&self, name: impl Into<String>) -> Task {
        Task::new(name, self.description, self.required_capabilities.iter().copied())
            .with_complexity(self.complexity)
            .with_priority(self.priority)
            .with_estimated_duration(self.estimated_duration)
    }
}

pub const DEMO_AGENTS: [(&str, &[&str]); 5] = [
    ("IoT Data Analyst", &["data_analysis", "pattern_recognition", "temperature", "humidity", "pressure"]),
    ("Location Tracker", &["location", "motion", "data_analysis", "pattern_recognition"]),
    ("Power Manager", &["power", "resource_management", "optimization", "decision_making"]),
    ("Security Monitor", &["camera", "motion", "pattern_recognition", "decision_making"]),
    ("System Controller", &["controller", "actuator", "optimization", "coordination"]),
];

pub const INITIAL_TASKS: [TaskTemplate; 5] = [
    TaskTemplate {
        name: "Environmental Monitoring",
        description: "Monitor temperature, humidity and pressure across the city",
        required_capabilities: &["temperature", "humidity", "pressure", "data_analysis"],
        complexity: 6.0,
        priority: 8.0,
        estimated_duration: 12.0,
    },
    TaskTemplate {
        name: "Traffic Pattern Analysis",
        description: "Analyze GPS and motion data for traffic optimization",
        required_capabilities: &["location", "motion", "pattern_recognition"],
        complexity: 7.0,
        priority: 9.0,
        estimated_duration: 15.0,
    },
    TaskTemplate {
        name: "Battery Optimization",
        description: "Optimize power consumption across all IoT devices",
        required_capabilities: &["power", "optimization", "resource_management"],
        complexity: 8.0,
        priority: 7.0,
        estimated_duration: 18.0,
    },
    TaskTemplate {
        name: "Security Surveillance",
        description: "Monitor security cameras and motion sensors",
        required_capabilities: &["camera", "motion", "pattern_recognition"],
        complexity: 7.0,
        priority: 10.0,
        estimated_duration: 20.0,
    },
    TaskTemplate {
        name: "Climate Control",
        description: "Control HVAC systems based on environmental data",
        required_capabilities: &["controller", "actuator", "temperature", "humidity"],
        complexity: 6.0,
        priority: 8.0,
        estimated_duration: 14.0,
    },
];

pub const DYNAMIC_TASKS: [TaskTemplate; 3] = [
    TaskTemplate {
        name: "Emergency Response",
        description: "Coordinate emergency response using all available sensors",
        required_capabilities: &["location", "camera", "motion", "decision_making"],
        complexity: 9.0,
        priority: 10.0,
        estimated_duration: 25.0,
    },
    TaskTemplate {
        name: "Energy Conservation",
        description: "Implement energy conservation measures across the network",
        required_capabilities: &["power", "optimization", "controller"],
        complexity: 7.0,
        priority: 8.0,
        estimated_duration: 16.0,
    },
    TaskTemplate {
        name: "Predictive Maintenance",
        description: "Predict and schedule maintenance for IoT devices",
        required_capabilities: &["data_analysis", "pattern_recognition", "prediction"],
        complexity: 8.0,
        priority: 7.0,
        estimated_duration: 22.0,
    },
];

/// Field devices typed by the capability they serve
const FIELD_DEVICES: [(&str, &str, SensorKind); 3] = [
    ("ThermalSensor-A1", "temperature_reading", SensorKind::SensorHub),
    ("GeoTracker-B2", "location_tracking", SensorKind::SensorHub),
    ("PowerNode-C3", "power_status", SensorKind::Cpu),
];

/// Device registry with the four sensor kinds plus the field devices
pub fn demo_registry() -> SimulatedDeviceRegistry {
    let mut registry = SimulatedDeviceRegistry::with_demo_devices();
    for (name, tag, kind) in FIELD_DEVICES {
        if let Err(e) = registry.add_tagged_device(name, tag, kind) {
            warn!(device = name, error = %e, "skipping demo device");
        }
    }
    registry
}

/// Add the demo agents and initial tasks
pub fn seed(controller: &mut Controller) {
    for (name, capabilities) in DEMO_AGENTS {
        controller.add_agent(name, capabilities.iter().copied());
    }
    for template in &INITIAL_TASKS {
        controller.create_task(template.build(template.name));
    }
    info!(
        agents = DEMO_AGENTS.len(),
        tasks = INITIAL_TASKS.len(),
        "demo scenario seeded"
    );
}

/// Create one randomly chosen dynamic task
pub fn spawn_dynamic_task<R: Rng + ?Sized>(controller: &mut Controller, rng: &mut R) -> Option<TaskId> {
    let template = DYNAMIC_TASKS.choose(rng)?;
    let name = format!("{} #{}", template.name, rng.random_range(1000..10000));
    Some(controller.create_task(template.build(name)))
}

/// Routes pending tasks no agent took to a matching device, and frees the
/// device once the task leaves the pending state.
#[derive(Debug, Default)]
pub struct DeviceFallback {
    bound: HashSet<TaskId>,
}

impl DeviceFallback {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of newly bound tasks
    pub fn run(&mut self, controller: &mut Controller) -> usize {
        let finished: Vec<TaskId> = self
            .bound
            .iter()
            .copied()
            .filter(|id| {
                controller
                    .task(id)
                    .is_none_or(|task| task.status() != TaskStatus::Pending)
            })
            .collect();
        for task_id in finished {
            controller.complete_device_task(task_id);
            self.bound.remove(&task_id);
        }

        let pending: Vec<(TaskId, Vec<String>)> = controller
            .tasks()
            .into_iter()
            .filter(|task| task.is_pending() && !self.bound.contains(&task.id))
            .map(|task| (task.id, task.required_capabilities.clone()))
            .collect();

        let mut newly_bound = 0;
        for (task_id, capabilities) in pending {
            for capability in &capabilities {
                if controller.assign_task_to_best_device(task_id, capability).is_some() {
                    self.bound.insert(task_id);
                    newly_bound += 1;
                    break;
                }
            }
        }
        newly_bound
    }

    pub fn bound(&self) -> usize {
        self.bound.len()
    }
}
