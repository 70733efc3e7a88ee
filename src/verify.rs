//! Verification runs the node's verifier over SSH; its exit status is the verdict.

use anyhow::{Context, Result};
use sshkit::sudo;
use vagrantkit::Backend;

use crate::config::{Config, NodeSpec, VerifierSpec};
use crate::converge::{Connector, NodeRemote, select_nodes};
use crate::project::Project;
use crate::ui;

const GOSS: &str = "/usr/bin/goss";

pub fn goss_command(goss_file: &str) -> String {
    sudo(GOSS, &["--gossfile", goss_file, "validate"])
}

pub struct Verifier<'a> {
    pub project: &'a Project,
    pub config: &'a Config,
    pub machines: &'a dyn Backend,
    pub connector: &'a dyn Connector,
}

impl Verifier<'_> {
    /// Verify `only`, or every node in order, stopping at the first failure.
    pub fn verify_all(&self, only: Option<&str>) -> Result<()> {
        for node in select_nodes(self.config, only)? {
            ui::info(&format!("Verifying node {}", node.name));
            self.verify(node)?;
            ui::success(&format!("Verified node {}", node.name));
        }
        Ok(())
    }

    pub fn verify(&self, node: &NodeSpec) -> Result<()> {
        let verifier = node.require_verifier()?;
        let mut remote = NodeRemote::new(
            &node.name,
            &self.project.dir,
            self.machines,
            self.connector,
        );
        let host = remote.host()?;

        match verifier {
            VerifierSpec::Goss { goss_file } => {
                host.run(&goss_command(goss_file), true)
                    .with_context(|| format!("node {}: goss validation failed", node.name))?;
            }
        }
        Ok(())
    }
}
