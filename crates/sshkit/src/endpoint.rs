//! Connection facts for one node.

use std::fmt;
use std::path::PathBuf;

/// Where and how to reach a node over SSH.
///
/// Resolved fresh for every convergence run and never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Host name or address
    pub host: String,
    /// Remote user
    pub user: String,
    /// TCP port
    pub port: u16,
    /// Private key used for public-key authentication
    pub identity_file: PathBuf,
}

impl Endpoint {
    /// `host:port`, suitable for dialing.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}", self.user, self.host, self.port)
    }
}
