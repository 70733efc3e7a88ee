//! Error types for remote sessions and file transfers.
//!
//! Connection failures, non-zero remote exits and upload failures are kept
//! apart so callers can report them differently. Nothing in this crate
//! retries; every error is surfaced on first occurrence.

use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The step of an upload that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStep {
    /// Writing content to the temporary path
    WriteTemp,
    /// Checking or creating the destination directory
    CreateDir,
    /// Moving the temporary file onto the destination
    Move,
    /// Changing owner and group
    Chown,
    /// Changing permission bits
    Chmod,
}

impl fmt::Display for UploadStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let step = match self {
            Self::WriteTemp => "writing temporary file",
            Self::CreateDir => "creating destination directory",
            Self::Move => "moving into place",
            Self::Chown => "changing owner",
            Self::Chmod => "changing mode",
        };
        f.write_str(step)
    }
}

/// Errors that can occur while talking to a remote node.
#[derive(Debug, Error)]
pub enum Error {
    /// Private key file could not be opened
    #[error("cannot read identity file {path}: {source}")]
    IdentityFile {
        /// Path of the key file
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// TCP connection could not be established
    #[error("cannot reach {address}: {source}")]
    Unreachable {
        /// `host:port` that was dialed
        address: String,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// SSH protocol handshake failed
    #[error("ssh handshake with {address} failed: {source}")]
    Handshake {
        /// `host:port` of the peer
        address: String,
        /// Underlying libssh2 error
        #[source]
        source: ssh2::Error,
    },

    /// The server did not accept the key, or the key is invalid
    #[error("authentication as {user} rejected: {message}")]
    AuthRejected {
        /// Remote user name
        user: String,
        /// Reason reported by libssh2
        message: String,
    },

    /// Remote command exited with a non-zero status
    #[error("command `{command}` exited with status {exit_code}{}", output_suffix(.output))]
    Command {
        /// The command line that was executed
        command: String,
        /// Remote exit status
        exit_code: i32,
        /// Standard output captured before exit
        output: String,
    },

    /// A stat failed for a reason other than "no such file"
    #[error("cannot stat {path}: {message}")]
    Stat {
        /// Remote path
        path: String,
        /// Reason reported by the SFTP server
        message: String,
    },

    /// One step of an upload failed
    #[error("upload to {path} failed while {step}: {source}")]
    Upload {
        /// Final destination path
        path: String,
        /// The step that failed
        step: UploadStep,
        /// What went wrong
        #[source]
        source: Box<Error>,
    },

    /// Any other libssh2 error
    #[error("ssh error: {0}")]
    Ssh(#[from] ssh2::Error),

    /// IO error while streaming or writing
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Whether this error happened before a session was usable.
    pub fn is_connection(&self) -> bool {
        matches!(
            self,
            Error::IdentityFile { .. }
                | Error::Unreachable { .. }
                | Error::Handshake { .. }
                | Error::AuthRejected { .. }
        )
    }

    /// Remote exit status, if this is (or wraps) a command failure.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Error::Command { exit_code, .. } => Some(*exit_code),
            Error::Upload { source, .. } => source.exit_code(),
            _ => None,
        }
    }

    pub(crate) fn upload(path: &str, step: UploadStep, source: Error) -> Self {
        Error::Upload {
            path: path.to_string(),
            step,
            source: Box::new(source),
        }
    }
}

/// Captured stdout of a failed command, appended to its message when present.
fn output_suffix(output: &str) -> String {
    let output = output.trim();
    if output.is_empty() {
        String::new()
    } else {
        format!("\n{output}")
    }
}

/// Result type for remote operations
pub type Result<T> = std::result::Result<T, Error>;
