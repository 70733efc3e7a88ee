use anyhow::Result;
use std::path::Path;
use vagrantkit::Backend;

use crate::Context;
use crate::converge::ConvergeError;

pub fn run(ctx: &Context, config_path: &Path, node: &str) -> Result<()> {
    let ws = super::open(ctx, config_path)?;
    if ws.config.node(node).is_none() {
        return Err(ConvergeError::NodeNotFound(node.to_string()).into());
    }
    ws.machines.ssh(node)?;
    Ok(())
}
