//! Node configuration (`clover.yml`).
//!
//! The file lists nodes; each node names a provider, an ordered list of
//! provisioners, an optional verifier and files to place on the machine.
//! Unknown provider, provisioner and verifier kinds fail at parse time.

use regex::Regex;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::template::{ForwardedPort, SyncedFolder};

/// Config file used when none is given.
pub const DEFAULT_CONFIG: &str = "clover.yml";

const NODE_NAME: &str = r"^[A-Za-z0-9][A-Za-z0-9._-]*$";

/// Problems with the configuration file or its contents.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid configuration in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("configuration file must have a .yml or .yaml extension: {}", .0.display())]
    Extension(PathBuf),

    #[error("configuration declares no nodes")]
    NoNodes,

    #[error("invalid node name {0:?}: use letters, digits, '.', '_' or '-'")]
    InvalidNodeName(String),

    #[error("node {0} is declared more than once")]
    DuplicateNode(String),

    #[error("node {node}: invalid forwarded port {entry:?}, expected guest:host:proto or guest_ip:guest:host_ip:host:proto")]
    ForwardedPort { node: String, entry: String },

    #[error("node {node}: invalid synced folder {entry:?}, expected host_dir:guest_dir")]
    SyncedFolder { node: String, entry: String },

    #[error("node {node}: file {path} is declared more than once")]
    DuplicateFile { node: String, path: String },

    #[error("node {0} has no verifier")]
    NoVerifier(String),

    #[error(transparent)]
    Pattern(#[from] regex::Error),
}

/// The whole configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub nodes: Vec<NodeSpec>,
}

/// One machine and everything that should happen to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSpec {
    pub name: String,
    pub provider: Provider,
    /// Execution order is list order.
    #[serde(default, alias = "provisioners")]
    pub provisioner: Vec<ProvisionerSpec>,
    #[serde(default)]
    pub verifier: Option<VerifierSpec>,
    #[serde(default)]
    pub files: Vec<FileSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "kebab-case")]
pub enum Provider {
    Vagrant(VagrantProvider),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VagrantProvider {
    #[serde(rename = "box")]
    pub image: String,
    /// `host_dir:guest_dir` pairs.
    #[serde(default)]
    pub synced_folders: Vec<String>,
    #[serde(default)]
    pub network: Network,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Network {
    #[serde(default)]
    pub forwarded_port: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "kebab-case")]
pub enum ProvisionerSpec {
    /// Script run as root on the machine
    Shell { content: String },
    /// Ansible installed and run on the machine itself
    AnsibleLocal {
        #[serde(default)]
        playbook: Option<String>,
    },
    /// `ansible-playbook` run from this host against the machine
    Ansible(AnsibleSpec),
}

impl ProvisionerSpec {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Shell { .. } => "shell",
            Self::AnsibleLocal { .. } => "ansible-local",
            Self::Ansible(_) => "ansible",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnsibleSpec {
    pub playbook: String,
    #[serde(default)]
    pub extra_vars: Vec<String>,
    /// Inventory groups the node is placed in.
    #[serde(default)]
    pub groups: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "kebab-case")]
pub enum VerifierSpec {
    Goss { goss_file: String },
}

/// A file placed on the machine if nothing exists at `path` yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSpec {
    pub path: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub group: Option<String>,
    /// Permission bits; `0` leaves the default.
    ///
    /// Written as bare octal digits (`644`, `0644`) or as a string (`"0o644"`).
    /// An unquoted `0o644` reaches us as the YAML integer 420 and is read as
    /// `0o420`, so the `0o` prefix must be quoted.
    #[serde(default, deserialize_with = "deserialize_mode")]
    pub mode: u32,
}

impl Config {
    /// Read, parse and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self =
            serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        log::debug!("loaded {} node(s) from {}", config.nodes.len(), path.display());
        Ok(config)
    }

    /// Check invariants serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.nodes.is_empty() {
            return Err(ConfigError::NoNodes);
        }

        let name_pattern = Regex::new(NODE_NAME)?;
        let mut names = HashSet::new();
        for node in &self.nodes {
            if !name_pattern.is_match(&node.name) {
                return Err(ConfigError::InvalidNodeName(node.name.clone()));
            }
            if !names.insert(node.name.as_str()) {
                return Err(ConfigError::DuplicateNode(node.name.clone()));
            }
            node.validate()?;
        }
        Ok(())
    }

    pub fn node(&self, name: &str) -> Option<&NodeSpec> {
        self.nodes.iter().find(|n| n.name == name)
    }
}

impl NodeSpec {
    fn validate(&self) -> Result<(), ConfigError> {
        let Provider::Vagrant(vagrant) = &self.provider;
        for entry in &vagrant.network.forwarded_port {
            ForwardedPort::parse(entry).ok_or_else(|| ConfigError::ForwardedPort {
                node: self.name.clone(),
                entry: entry.clone(),
            })?;
        }
        for entry in &vagrant.synced_folders {
            SyncedFolder::parse(entry).ok_or_else(|| ConfigError::SyncedFolder {
                node: self.name.clone(),
                entry: entry.clone(),
            })?;
        }

        let mut paths = HashSet::new();
        for file in &self.files {
            if !paths.insert(file.path.as_str()) {
                return Err(ConfigError::DuplicateFile {
                    node: self.name.clone(),
                    path: file.path.clone(),
                });
            }
        }
        Ok(())
    }

    /// The node's verifier, or an error naming the node.
    pub fn require_verifier(&self) -> Result<&VerifierSpec, ConfigError> {
        self.verifier
            .as_ref()
            .ok_or_else(|| ConfigError::NoVerifier(self.name.clone()))
    }

    pub fn vagrant(&self) -> &VagrantProvider {
        let Provider::Vagrant(vagrant) = &self.provider;
        vagrant
    }
}

/// Permission bits from octal digits, with or without a `0`/`0o` prefix.
pub fn parse_mode(digits: &str) -> Result<u32, String> {
    let trimmed = digits.trim();
    let octal = trimmed.strip_prefix("0o").unwrap_or(trimmed);
    let mode = u32::from_str_radix(octal, 8)
        .map_err(|_| format!("invalid file mode {digits:?}: expected octal digits such as 0644"))?;
    if mode > 0o7777 {
        return Err(format!("invalid file mode {digits:?}: larger than 7777"));
    }
    Ok(mode)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawMode {
    Digits(u64),
    Text(String),
}

/// YAML integers are read digit for digit as octal, so `mode: 644` means `0o644`.
fn deserialize_mode<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let digits = match RawMode::deserialize(deserializer)? {
        RawMode::Digits(n) => n.to_string(),
        RawMode::Text(s) => s,
    };
    parse_mode(&digits).map_err(de::Error::custom)
}
