use anyhow::Result;
use std::path::Path;

use crate::Context;
use crate::converge::SshConnector;
use crate::verify::Verifier;

pub fn run(ctx: &Context, config_path: &Path, node: Option<&str>) -> Result<()> {
    let ws = super::open(ctx, config_path)?;
    let verifier = Verifier {
        project: &ws.project,
        config: &ws.config,
        machines: &ws.machines,
        connector: &SshConnector,
    };
    verifier.verify_all(node)
}
