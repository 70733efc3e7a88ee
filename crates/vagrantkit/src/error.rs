//! Error types for Vagrant operations.

use std::io;
use thiserror::Error;

/// Errors that can occur while driving Vagrant.
#[derive(Debug, Error)]
pub enum Error {
    /// `vagrant` is not on PATH
    #[error("vagrant not found. Install it from https://developer.hashicorp.com/vagrant")]
    VagrantNotFound,

    /// A vagrant invocation exited unsuccessfully
    #[error("`{command}` failed{}: {stderr}", status_suffix(.status))]
    CommandFailed {
        /// The command line that was run
        command: String,
        /// Exit status, if the process exited normally
        status: Option<i32>,
        /// Standard error output, when captured
        stderr: String,
    },

    /// Vagrant output did not have the expected shape
    #[error("cannot parse {what}: {message}")]
    Parse {
        /// Which output was being parsed
        what: &'static str,
        /// What was wrong with it
        message: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    pub(crate) fn parse(what: &'static str, message: impl Into<String>) -> Self {
        Error::Parse {
            what,
            message: message.into(),
        }
    }
}

fn status_suffix(status: &Option<i32>) -> String {
    status.map(|c| format!(" with status {c}")).unwrap_or_default()
}

/// Result type for Vagrant operations
pub type Result<T> = std::result::Result<T, Error>;
