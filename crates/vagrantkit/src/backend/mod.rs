//! Backend abstraction for machine lifecycle operations.
//!
//! The [`Backend`] trait is what the orchestrator drives. The real
//! implementation shells out to `vagrant`; tests supply recording mocks.

pub mod vagrant;

use crate::error::Result;
use crate::types::{LogLines, MachineStatus, SshDetails};
use std::path::Path;

/// Machine lifecycle operations for the machines of one project directory.
pub trait Backend {
    /// Current status of `machine`.
    fn status(&self, machine: &str) -> Result<MachineStatus>;

    /// Materialize the machine configuration from a rendered blob.
    fn create(&self, config: &str) -> Result<()>;

    /// Boot `machine`, yielding its log lines as they are printed.
    fn boot(&self, machine: &str) -> Result<LogLines>;

    /// Re-run the machine's own provisioning with inherited streams.
    fn reapply(&self, machine: &str) -> Result<()>;

    /// SSH connection details for a running `machine`.
    fn ssh_config(&self, machine: &str) -> Result<SshDetails>;

    /// Destroy every machine of the project, yielding log lines.
    fn destroy(&self) -> Result<LogLines>;

    /// Open an interactive shell on `machine`.
    fn ssh(&self, machine: &str) -> Result<()>;
}

/// Get the default backend (real vagrant CLI) rooted at `dir`.
pub fn default_backend(dir: &Path) -> Result<vagrant::VagrantBackend> {
    vagrant::VagrantBackend::new(dir)
}
