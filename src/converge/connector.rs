use sshkit::{Connection, Endpoint, Remote};

use crate::progress;

/// Opens remote sessions.
pub trait Connector {
    fn connect(&self, endpoint: &Endpoint) -> sshkit::Result<Box<dyn Remote>>;
}

/// Connects over SSH with libssh2.
pub struct SshConnector;

impl Connector for SshConnector {
    fn connect(&self, endpoint: &Endpoint) -> sshkit::Result<Box<dyn Remote>> {
        let pb = progress::spinner(&format!("Connecting to {endpoint}"));
        match Connection::connect(endpoint) {
            Ok(conn) => {
                progress::finish_success(&pb, &format!("Connected to {endpoint}"));
                Ok(Box::new(conn))
            }
            Err(e) => {
                progress::finish_error(&pb, &format!("Cannot connect to {endpoint}"));
                Err(e)
            }
        }
    }
}
