use anyhow::{Context as _, Result};
use std::fs;
use std::path::Path;
use vagrantkit::{Backend, MachineStatus};

use crate::Context;
use crate::config::Config;
use crate::project::Project;
use crate::ui;

pub fn run(ctx: &Context, config_path: &Path, yes: bool) -> Result<()> {
    let ws = super::open(ctx, config_path)?;
    destroy(&ws.project, &ws.config, &ws.machines, || {
        if yes {
            return Ok(true);
        }
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(format!(
                "Destroy all machines and remove {}?",
                ws.project.dir.display()
            ))
            .default(false)
            .interact()?;
        Ok(confirmed)
    })
}

/// Destroy every machine of the project once `confirm` agrees.
///
/// Refuses when no machine has been created.
fn destroy(
    project: &Project,
    config: &Config,
    machines: &dyn Backend,
    confirm: impl FnOnce() -> Result<bool>,
) -> Result<()> {
    let mut created = Vec::new();
    for node in &config.nodes {
        let status = machines.status(&node.name)?;
        if status != MachineStatus::NotCreated {
            created.push(format!("{} ({status})", node.name));
        }
    }
    if created.is_empty() {
        anyhow::bail!("no machine has been created; nothing to destroy");
    }

    ui::info(&format!("Machines: {}", created.join(", ")));
    if !confirm()? {
        ui::warn("Aborted");
        return Ok(());
    }

    for line in machines.destroy()? {
        ui::dim(&line?);
    }

    if project.dir.exists() {
        fs::remove_dir_all(&project.dir)
            .with_context(|| format!("cannot remove {}", project.dir.display()))?;
    }
    ui::success("Successfully destroyed");
    Ok(())
}
