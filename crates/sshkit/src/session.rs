//! The command-execution half of a remote host.

use crate::error::Result;

/// Output of a successful remote command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Everything the command wrote to standard output
    pub stdout: String,
}

/// Runs commands on a remote host.
///
/// Implementations run `command` through the remote login shell in a fresh
/// channel and return only after the command has exited and all of its
/// output has been forwarded.
pub trait Session {
    /// Run a command.
    ///
    /// Standard error is always forwarded to the local standard error as it
    /// arrives. Standard output is captured; with `echo` it is also
    /// forwarded live to the local standard output.
    ///
    /// A non-zero exit status is reported as [`crate::Error::Command`]
    /// carrying the captured output.
    fn run(&self, command: &str, echo: bool) -> Result<CommandOutput>;
}
