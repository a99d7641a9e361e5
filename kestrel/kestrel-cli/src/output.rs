//! Output formatting for the CLI

use comfy_table::{Cell, Color, ContentArrangement, Table, presets::UTF8_FULL};
use kestrel_core::{AgentStatus, DeviceInfo, DeviceStatus, SystemSnapshot, TaskStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
    Plain,
}

fn status_cell(status: AgentStatus) -> Cell {
    let color = match status {
        AgentStatus::Idle => Color::Green,
        AgentStatus::Busy(_) => Color::Yellow,
        AgentStatus::Learning | AgentStatus::Optimizing => Color::Cyan,
    };
    Cell::new(status.label()).fg(color)
}

fn task_status_cell(status: TaskStatus) -> Cell {
    let color = match status {
        TaskStatus::Pending => Color::Yellow,
        TaskStatus::InProgress => Color::Cyan,
        TaskStatus::Completed => Color::Green,
        TaskStatus::Failed => Color::Red,
    };
    Cell::new(status.to_string()).fg(color)
}

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Agents with their learned confidences
pub fn agent_table(snapshot: &SystemSnapshot) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Agent", "Status", "Done", "Failed", "Success", "Adaptability", "Confidence"]);

    let mut agents: Vec<_> = snapshot.agents.values().collect();
    agents.sort_by(|a, b| a.name.cmp(&b.name));

    for agent in agents {
        let confidences = agent
            .capabilities
            .iter()
            .map(|(capability, confidence)| format!("{}={:.2}", capability, confidence))
            .collect::<Vec<_>>()
            .join(" ");

        table.add_row(vec![
            Cell::new(&agent.name),
            status_cell(agent.status),
            Cell::new(agent.total_tasks_completed),
            Cell::new(agent.total_tasks_failed),
            Cell::new(format!("{:.1}%", agent.average_success_rate * 100.0)),
            Cell::new(format!("{:.3}", agent.adaptability_score)),
            Cell::new(confidences),
        ]);
    }
    table
}

/// Tasks ordered by creation time
pub fn task_table(snapshot: &SystemSnapshot) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Task", "Priority", "Status", "Agent", "Minutes"]);

    let mut tasks: Vec<_> = snapshot.tasks.values().collect();
    tasks.sort_by_key(|task| task.created_at);

    for task in tasks {
        let agent = task
            .assigned_agent
            .as_ref()
            .and_then(|id| snapshot.agents.get(id))
            .map(|agent| agent.name.clone())
            .unwrap_or_else(|| "-".to_string());
        let minutes = task
            .actual_duration
            .map(|d| format!("{:.1}", d))
            .unwrap_or_else(|| "-".to_string());

        table.add_row(vec![
            Cell::new(&task.name),
            Cell::new(format!("{:.0}", task.priority)),
            task_status_cell(task.status),
            Cell::new(agent),
            Cell::new(minutes),
        ]);
    }
    table
}

pub fn device_table(devices: &[DeviceInfo]) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Device", "Type", "Status", "Battery", "Signal"]);

    for device in devices {
        let color = match device.status {
            DeviceStatus::Online => Color::Green,
            DeviceStatus::Busy => Color::Yellow,
            DeviceStatus::Offline => Color::Red,
        };
        table.add_row(vec![
            Cell::new(&device.name),
            Cell::new(&device.device_type),
            Cell::new(device.status.to_string()).fg(color),
            Cell::new(format!("{:.1}%", device.battery_level)),
            Cell::new(format!("{:.1}%", device.signal_strength)),
        ]);
    }
    table
}

/// One-line metrics summary
pub fn metrics_line(snapshot: &SystemSnapshot) -> String {
    let m = &snapshot.metrics;
    format!(
        "created={} completed={} failed={} efficiency={:.1}% utilization={:.1}% avg_minutes={:.1} training={}",
        m.total_tasks_created,
        m.total_tasks_completed,
        m.total_tasks_failed,
        m.system_efficiency * 100.0,
        m.agent_utilization * 100.0,
        m.average_completion_time,
        snapshot.training_mode
    )
}

/// Print a final report in the requested format
pub fn print_report(snapshot: &SystemSnapshot, devices: &[DeviceInfo], format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", snapshot.to_json()?),
        OutputFormat::Plain => {
            println!("{}", metrics_line(snapshot));
            for agent in snapshot.agents.values() {
                println!(
                    "agent\t{}\t{}\t{}\t{}\t{:.3}",
                    agent.name,
                    agent.status.label(),
                    agent.total_tasks_completed,
                    agent.total_tasks_failed,
                    agent.adaptability_score
                );
            }
        }
        OutputFormat::Human => {
            println!("\nAgents\n{}", agent_table(snapshot));
            println!("\nTasks\n{}", task_table(snapshot));
            if !devices.is_empty() {
                println!("\nDevices\n{}", device_table(devices));
            }
            println!("\n{}", metrics_line(snapshot));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kestrel_core::{Controller, Task};

    #[test]
    fn test_tables_list_every_row() {
        let mut controller = Controller::new();
        controller.add_agent("Analyst", ["x"]);
        controller.add_agent("Planner", ["y"]);
        controller.create_task(Task::new("Report", "", ["x"]));
        controller.assign_tasks();

        let snapshot = controller.snapshot();
        let agents = agent_table(&snapshot).to_string();
        assert!(agents.contains("Analyst"));
        assert!(agents.contains("Planner"));
        assert!(agents.contains("busy"));

        let tasks = task_table(&snapshot).to_string();
        assert!(tasks.contains("Report"));
        assert!(tasks.contains("in_progress"));
    }

    #[test]
    fn test_metrics_line() {
        let controller = Controller::new();
        let line = metrics_line(&controller.snapshot());
        assert!(line.starts_with("created=0 completed=0 failed=0"));
        assert!(line.ends_with("training=false"));
    }
}
