use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use std::path::Path;
use vagrantkit::{Backend, MachineStatus};

use crate::Context;
use crate::config::Config;
use crate::ui;

#[derive(Debug, Serialize)]
struct NodeStatus {
    node: String,
    status: String,
}

pub fn run(ctx: &Context, config_path: &Path, json: bool) -> Result<()> {
    let ws = super::open(ctx, config_path)?;
    let statuses = collect(&ws.config, &ws.machines)?;

    if json {
        println!("{}", to_json(&statuses)?);
        return Ok(());
    }

    ui::header("Machine Status");
    for (node, status) in &statuses {
        let label = status.to_string();
        let label = match status {
            MachineStatus::Running => label.green(),
            MachineStatus::NotCreated => label.dimmed(),
            MachineStatus::Other(_) => label.yellow(),
        };
        println!("  {node:<24} {label}");
    }
    Ok(())
}

fn collect(config: &Config, machines: &dyn Backend) -> Result<Vec<(String, MachineStatus)>> {
    config
        .nodes
        .iter()
        .map(|node| -> Result<(String, MachineStatus)> {
            Ok((node.name.clone(), machines.status(&node.name)?))
        })
        .collect()
}

fn to_json(statuses: &[(String, MachineStatus)]) -> Result<String> {
    let rows: Vec<NodeStatus> = statuses
        .iter()
        .map(|(node, status)| NodeStatus {
            node: node.clone(),
            status: status.as_state().to_string(),
        })
        .collect();
    Ok(serde_json::to_string_pretty(&rows)?)
}
