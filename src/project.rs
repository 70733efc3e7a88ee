//! On-disk layout of a project.
//!
//! For `path/to/web.yml` the project directory is `path/to/.web`. It holds
//! the Vagrantfile, the Ansible inventories and one directory per node that
//! is mounted into that node's guest.

use regex::Regex;
use std::path::{Path, PathBuf};

use crate::config::ConfigError;

const CONFIG_FILE_NAME: &str = r"^\.?([A-Za-z0-9_-]+)\.ya?ml$";

/// Name of the bootstrap script for ansible-local nodes.
pub const ANSIBLE_SCRIPT: &str = "ansible.sh";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    /// Directory containing the configuration file
    pub base_dir: PathBuf,
    /// Generated state, `<base_dir>/.<stem>`
    pub dir: PathBuf,
}

impl Project {
    /// Derive the project layout from the configuration file path.
    pub fn for_config(config_path: &Path) -> Result<Self, ConfigError> {
        let absolute =
            std::path::absolute(config_path).map_err(|source| ConfigError::Read {
                path: config_path.to_path_buf(),
                source,
            })?;
        let extension_error = || ConfigError::Extension(config_path.to_path_buf());

        let file_name = absolute
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(extension_error)?;
        let pattern = Regex::new(CONFIG_FILE_NAME)?;
        let stem = pattern
            .captures(file_name)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or_else(extension_error)?;

        let base_dir = absolute
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(extension_error)?;
        let dir = base_dir.join(format!(".{stem}"));
        Ok(Self { base_dir, dir })
    }

    pub fn vagrantfile(&self) -> PathBuf {
        self.dir.join(vagrantkit::VAGRANTFILE)
    }

    /// Host directory mounted at `/clover` in the node's guest.
    pub fn node_dir(&self, node: &str) -> PathBuf {
        self.dir.join(node)
    }

    pub fn inventory(&self, node: &str) -> PathBuf {
        self.dir.join(format!("ansiblehosts_{node}"))
    }

    /// `<index>.sh` for the shell provisioner at `index`.
    pub fn shell_script(&self, node: &str, index: usize) -> PathBuf {
        self.node_dir(node).join(format!("{index}.sh"))
    }

    pub fn ansible_script(&self, node: &str) -> PathBuf {
        self.node_dir(node).join(ANSIBLE_SCRIPT)
    }
}
