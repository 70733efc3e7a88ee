//! Types shared by all Vagrant backends.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::error::Result;

/// Lifecycle status of one machine, as far as convergence cares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MachineStatus {
    /// Vagrant has never created this machine
    NotCreated,
    /// The machine is up
    Running,
    /// Any other state (`poweroff`, `saved`, `aborted`, ...), kept verbatim
    Other(String),
}

impl MachineStatus {
    /// Map a Vagrant `state` value onto a status.
    pub fn from_state(state: &str) -> Self {
        match state.trim() {
            "not_created" => Self::NotCreated,
            "running" => Self::Running,
            other => Self::Other(other.to_string()),
        }
    }

    /// The Vagrant `state` value this status was read from.
    pub fn as_state(&self) -> &str {
        match self {
            Self::NotCreated => "not_created",
            Self::Running => "running",
            Self::Other(state) => state,
        }
    }
}

impl fmt::Display for MachineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotCreated => f.write_str("not created"),
            Self::Running => f.write_str("running"),
            Self::Other(state) => f.write_str(state),
        }
    }
}

/// SSH connection details reported by `vagrant ssh-config`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SshDetails {
    /// `HostName`
    pub host: String,
    /// `User`
    pub user: String,
    /// `Port`
    pub port: u16,
    /// `IdentityFile`
    pub identity_file: PathBuf,
}

/// Lines of output from a long-running vagrant command.
///
/// Yields lines as the process prints them and ends when the process exits.
/// A non-zero exit is reported as a final `Err` item. Not restartable.
pub type LogLines = Box<dyn Iterator<Item = Result<String>>>;
