//! Lazily opened, per-node remote access.
//!
//! SSH details are resolved and the connection opened on first use, then
//! reused for the rest of the run. Nothing is cached across runs.

use anyhow::{Context, Result};
use sshkit::{Endpoint, Remote};
use std::path::Path;
use vagrantkit::Backend;

use super::connector::Connector;
use crate::progress;

/// Remote working directory, relative to the login user's home.
pub const WORKDIR: &str = ".clover";

pub struct NodeRemote<'a> {
    node: &'a str,
    project_dir: &'a Path,
    machines: &'a dyn Backend,
    connector: &'a dyn Connector,
    endpoint: Option<Endpoint>,
    conn: Option<Box<dyn Remote>>,
    workspace_ready: bool,
}

impl<'a> NodeRemote<'a> {
    pub fn new(
        node: &'a str,
        project_dir: &'a Path,
        machines: &'a dyn Backend,
        connector: &'a dyn Connector,
    ) -> Self {
        Self {
            node,
            project_dir,
            machines,
            connector,
            endpoint: None,
            conn: None,
            workspace_ready: false,
        }
    }

    pub fn endpoint(&mut self) -> Result<&Endpoint> {
        let endpoint = match self.endpoint.take() {
            Some(endpoint) => endpoint,
            None => self.resolve()?,
        };
        Ok(self.endpoint.insert(endpoint))
    }

    /// The node's connection, opened on first call.
    pub fn host(&mut self) -> Result<&dyn Remote> {
        let conn = match self.conn.take() {
            Some(conn) => conn,
            None => {
                let endpoint = self.endpoint()?.clone();
                self.connector
                    .connect(&endpoint)
                    .with_context(|| format!("cannot connect to node {}", self.node))?
            }
        };
        Ok(&**self.conn.insert(conn))
    }

    /// The connection, with [`WORKDIR`] present on the node.
    pub fn workspace(&mut self) -> Result<&dyn Remote> {
        if !self.workspace_ready {
            self.host()?
                .ensure_dir(WORKDIR)
                .with_context(|| format!("cannot create {WORKDIR} on node {}", self.node))?;
            self.workspace_ready = true;
        }
        self.host()
    }

    fn resolve(&self) -> Result<Endpoint> {
        let pb = progress::spinner(&format!("Resolving SSH details for {}", self.node));
        let details = self.machines.ssh_config(self.node);
        pb.finish_and_clear();
        let details =
            details.with_context(|| format!("cannot resolve SSH details for node {}", self.node))?;

        let identity_file = if details.identity_file.is_absolute() {
            details.identity_file
        } else {
            self.project_dir.join(details.identity_file)
        };
        log::debug!("{}: ssh {}@{}:{}", self.node, details.user, details.host, details.port);

        Ok(Endpoint {
            host: details.host,
            user: details.user,
            port: details.port,
            identity_file,
        })
    }
}
