//! Node convergence.
//!
//! Each node goes through the same stages in order:
//!
//! 1. **Configuration**: reuse the generated Vagrantfile, or render one.
//! 2. **Artifacts**: write missing per-node host artifacts.
//! 3. **Machine**: create and boot, re-provision, or refuse, by status.
//! 4. **Files**: upload each declared file whose destination is missing.
//! 5. **Provisioners**: run each provisioner in declaration order.
//!
//! Every side effect is guarded by an existence check, so a run that failed
//! part way can simply be repeated. The first error aborts the node and every
//! node after it.

mod connector;
mod error;
mod remote;

#[cfg(test)]
mod tests;

pub use connector::{Connector, SshConnector};
pub use error::{ConvergeError, hint};
pub use remote::{NodeRemote, WORKDIR};

use anyhow::{Context, Result};
use sshkit::{FileUpload, Remote, remote_join, shell_command, sudo};
use std::fmt;
use std::fs;
use std::path::Path;
use vagrantkit::{Backend, MachineStatus};

use crate::ansible;
use crate::config::{AnsibleSpec, Config, FileSpec, NodeSpec, ProvisionerSpec};
use crate::project::{ANSIBLE_SCRIPT, Project};
use crate::runner::CommandRunner;
use crate::template;
use crate::ui;

/// Host program the `ansible` provisioner needs.
pub const ANSIBLE_PLAYBOOK: &str = "ansible-playbook";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ConfigReady,
    ArtifactsStaged,
    MachineEnsured,
    FilesDeployed,
    Provisioned,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stage = match self {
            Self::ConfigReady => "preparing machine configuration",
            Self::ArtifactsStaged => "staging artifacts",
            Self::MachineEnsured => "ensuring machine",
            Self::FilesDeployed => "deploying files",
            Self::Provisioned => "provisioning",
        };
        f.write_str(stage)
    }
}

fn stage_context(node: &NodeSpec, stage: Stage) -> String {
    format!("node {}: {stage}", node.name)
}

/// `only`'s node, or every node in declaration order.
pub fn select_nodes<'c>(config: &'c Config, only: Option<&str>) -> Result<Vec<&'c NodeSpec>> {
    match only {
        Some(name) => {
            let node = config
                .node(name)
                .ok_or_else(|| ConvergeError::NodeNotFound(name.to_string()))?;
            Ok(vec![node])
        }
        None => Ok(config.nodes.iter().collect()),
    }
}

pub struct Orchestrator<'a> {
    pub project: &'a Project,
    pub config: &'a Config,
    pub machines: &'a dyn Backend,
    pub connector: &'a dyn Connector,
    pub runner: &'a dyn CommandRunner,
}

impl Orchestrator<'_> {
    /// Converge `only`, or every node in order.
    pub fn converge_all(&self, only: Option<&str>) -> Result<()> {
        for node in select_nodes(self.config, only)? {
            self.converge(node)?;
            ui::success(&format!("Converged node {}", node.name));
        }
        Ok(())
    }

    pub fn converge(&self, node: &NodeSpec) -> Result<()> {
        ui::section(&format!("Converging node {}", node.name));

        let vagrantfile = self
            .prepare_config()
            .with_context(|| stage_context(node, Stage::ConfigReady))?;
        self.stage_artifacts(node)
            .with_context(|| stage_context(node, Stage::ArtifactsStaged))?;
        self.ensure_machine(node, &vagrantfile)
            .with_context(|| stage_context(node, Stage::MachineEnsured))?;

        let mut remote = NodeRemote::new(
            &node.name,
            &self.project.dir,
            self.machines,
            self.connector,
        );
        self.deploy_files(node, &mut remote)
            .with_context(|| stage_context(node, Stage::FilesDeployed))?;
        self.provision(node, &mut remote)
            .with_context(|| stage_context(node, Stage::Provisioned))?;
        Ok(())
    }

    /// The existing Vagrantfile, or a freshly rendered one for all nodes.
    fn prepare_config(&self) -> Result<String> {
        let path = self.project.vagrantfile();
        if path.exists() {
            log::debug!("reusing {}", path.display());
            return fs::read_to_string(&path)
                .with_context(|| format!("cannot read {}", path.display()));
        }
        Ok(template::render_vagrantfile(
            self.config,
            &self.project.base_dir,
        ))
    }

    fn stage_artifacts(&self, node: &NodeSpec) -> Result<()> {
        let node_dir = self.project.node_dir(&node.name);
        fs::create_dir_all(&node_dir)
            .with_context(|| format!("cannot create {}", node_dir.display()))?;

        for (index, provisioner) in node.provisioner.iter().enumerate() {
            match provisioner {
                ProvisionerSpec::Shell { content } => {
                    write_once(&self.project.shell_script(&node.name, index), content)?;
                }
                ProvisionerSpec::AnsibleLocal { .. } => {
                    write_once(&self.project.ansible_script(&node.name), ansible::BOOTSTRAP)?;
                }
                ProvisionerSpec::Ansible(_) => {}
            }
        }
        Ok(())
    }

    fn ensure_machine(&self, node: &NodeSpec, vagrantfile: &str) -> Result<()> {
        let name = node.name.as_str();
        match self.machines.status(name)? {
            MachineStatus::NotCreated => {
                self.machines.create(vagrantfile)?;
                ui::info(&format!("Created machine configuration for {name}"));
                for line in self.machines.boot(name)? {
                    ui::dim(&line?);
                }
                ui::success(&format!("Booted node {name}"));
            }
            MachineStatus::Running => {
                self.machines.reapply(name)?;
                ui::success(&format!("Reapplied node {name}"));
            }
            MachineStatus::Other(state) => {
                return Err(ConvergeError::UnrecoverableState {
                    node: name.to_string(),
                    state,
                }
                .into());
            }
        }
        Ok(())
    }

    fn deploy_files(&self, node: &NodeSpec, remote: &mut NodeRemote<'_>) -> Result<()> {
        if node.files.is_empty() {
            return Ok(());
        }
        let host = remote.workspace()?;
        for file in &node.files {
            deploy_file(host, file)?;
        }
        Ok(())
    }

    fn provision(&self, node: &NodeSpec, remote: &mut NodeRemote<'_>) -> Result<()> {
        let total = node.provisioner.len();
        for (index, provisioner) in node.provisioner.iter().enumerate() {
            let kind = provisioner.kind();
            ui::step(index + 1, total, &format!("Provisioning {} with {kind}", node.name));
            self.run_provisioner(node, remote, index, provisioner)
                .with_context(|| format!("provisioner {index} ({kind})"))?;
        }
        if total > 0 {
            ui::success(&format!("Provisioned node {}", node.name));
        }
        Ok(())
    }

    fn run_provisioner(
        &self,
        node: &NodeSpec,
        remote: &mut NodeRemote<'_>,
        index: usize,
        provisioner: &ProvisionerSpec,
    ) -> Result<()> {
        match provisioner {
            ProvisionerSpec::Shell { content } => run_shell(remote.workspace()?, index, content),
            ProvisionerSpec::AnsibleLocal { playbook } => {
                self.run_ansible_local(node, remote.workspace()?, playbook.as_deref())
            }
            ProvisionerSpec::Ansible(spec) => self.run_ansible(node, remote, spec),
        }
    }

    fn run_ansible_local(
        &self,
        node: &NodeSpec,
        host: &dyn Remote,
        playbook: Option<&str>,
    ) -> Result<()> {
        let marker = remote_join(WORKDIR, ANSIBLE_SCRIPT);
        if host.exists(&marker)? {
            ui::dim(&format!("ansible already bootstrapped ({marker} exists)"));
        } else {
            let script_path = self.project.ansible_script(&node.name);
            let script = fs::read(&script_path)
                .with_context(|| format!("cannot read {}", script_path.display()))?;
            let tmp = sshkit::temp_path(WORKDIR);
            host.write(&tmp, &script)?;
            host.run(&sudo("bash", &[&tmp]), true)?;
            host.run(&shell_command("mv", &[&tmp, &marker]), false)?;
            ui::success("Bootstrapped ansible");
        }

        if let Some(playbook) = playbook {
            host.run(&sudo(ANSIBLE_PLAYBOOK, &[playbook]), true)?;
        }
        Ok(())
    }

    fn run_ansible(
        &self,
        node: &NodeSpec,
        remote: &mut NodeRemote<'_>,
        spec: &AnsibleSpec,
    ) -> Result<()> {
        if !self.runner.exists(ANSIBLE_PLAYBOOK) {
            return Err(ConvergeError::MissingExecutable(ANSIBLE_PLAYBOOK).into());
        }

        let inventory = self.project.inventory(&node.name);
        if !inventory.exists() {
            let content = ansible::render_inventory(remote.endpoint()?, &spec.groups);
            fs::write(&inventory, content)
                .with_context(|| format!("cannot write {}", inventory.display()))?;
            log::info!("wrote {}", inventory.display());
        }

        let args = ansible::playbook_args(&inventory, spec);
        ui::dim(&format!("{ANSIBLE_PLAYBOOK} {}", args.join(" ")));
        self.runner
            .run(ANSIBLE_PLAYBOOK, &args, &self.project.base_dir)
    }
}

fn deploy_file(host: &dyn Remote, file: &FileSpec) -> Result<()> {
    if host.exists(&file.path)? {
        ui::dim(&format!("{} exists, skipping", file.path));
        return Ok(());
    }
    let upload = FileUpload {
        path: &file.path,
        content: file.content.as_bytes(),
        user: file.user.as_deref(),
        group: file.group.as_deref(),
        mode: file.mode,
    };
    sshkit::upload(host, WORKDIR, &upload)?;
    ui::success(&format!("Uploaded {}", file.path));
    Ok(())
}

fn run_shell(host: &dyn Remote, index: usize, content: &str) -> Result<()> {
    let script = remote_join(WORKDIR, &format!("{index}.sh"));
    host.write(&script, content.as_bytes())?;
    host.run(&sudo("bash", &[&script]), true)?;
    Ok(())
}

/// Write `content` to `path` unless something is already there.
fn write_once(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    fs::write(path, content).with_context(|| format!("cannot write {}", path.display()))?;
    log::info!("wrote {}", path.display());
    Ok(())
}
