use anyhow::Result;
use std::path::Path;

use crate::Context;
use crate::converge::{Orchestrator, SshConnector};
use crate::runner::SystemRunner;

pub fn run(ctx: &Context, config_path: &Path, node: Option<&str>) -> Result<()> {
    let ws = super::open(ctx, config_path)?;
    let orchestrator = Orchestrator {
        project: &ws.project,
        config: &ws.config,
        machines: &ws.machines,
        connector: &SshConnector,
        runner: &SystemRunner,
    };
    orchestrator.converge_all(node)
}
