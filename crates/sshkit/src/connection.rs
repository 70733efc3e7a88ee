//! libssh2-backed connection.
//!
//! One [`Connection`] holds a single authenticated SSH session plus an SFTP
//! subsystem opened on it. Every [`Session::run`] opens a new channel on the
//! shared session, so commands run strictly one after another.
//!
//! ## Host keys
//!
//! The server's host key is accepted without consulting a known-hosts
//! store.

use std::fs::File;
use std::io::{self, Write};
use std::net::TcpStream;
use std::path::Path;

use ssh2::ErrorCode;

use crate::channel::FileChannel;
use crate::endpoint::Endpoint;
use crate::error::{Error, Result};
use crate::session::{CommandOutput, Session};
use crate::stream::drain_both;
use crate::tee::Tee;

/// SFTP status code for "no such file".
const SFTP_NO_SUCH_FILE: i32 = 2;

/// Permission bits for directories created over SFTP.
const DIR_MODE: i32 = 0o755;

/// An authenticated connection to one node.
pub struct Connection {
    endpoint: Endpoint,
    session: ssh2::Session,
    sftp: ssh2::Sftp,
}

impl Connection {
    /// Dial, handshake and authenticate with the endpoint's private key.
    pub fn connect(endpoint: &Endpoint) -> Result<Self> {
        File::open(&endpoint.identity_file).map_err(|source| Error::IdentityFile {
            path: endpoint.identity_file.clone(),
            source,
        })?;

        let address = endpoint.address();
        log::debug!("connecting to {}", address);
        let tcp = TcpStream::connect(&address).map_err(|source| Error::Unreachable {
            address: address.clone(),
            source,
        })?;

        let mut session = ssh2::Session::new()?;
        session.set_tcp_stream(tcp);
        session
            .handshake()
            .map_err(|source| Error::Handshake { address, source })?;

        session
            .userauth_pubkey_file(&endpoint.user, None, &endpoint.identity_file, None)
            .map_err(|e| Error::AuthRejected {
                user: endpoint.user.clone(),
                message: e.message().to_string(),
            })?;
        if !session.authenticated() {
            return Err(Error::AuthRejected {
                user: endpoint.user.clone(),
                message: "server did not accept the key".to_string(),
            });
        }

        let sftp = session.sftp()?;
        log::info!("connected to {}", endpoint);

        Ok(Self {
            endpoint: endpoint.clone(),
            session,
            sftp,
        })
    }

    /// The endpoint this connection was opened against.
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Drain stderr and stdout of `channel` on two threads.
    ///
    /// The session must be in non-blocking mode while this runs so that
    /// neither thread holds the session lock while its stream is idle.
    fn forward(channel: &ssh2::Channel, captured: &mut Vec<u8>, echo: bool) -> io::Result<()> {
        let stderr = channel.stderr();
        let stdout = channel.stream(0);
        if echo {
            drain_both(stderr, &mut io::stderr(), stdout, &mut Tee::new(captured, io::stdout()))
        } else {
            drain_both(stderr, &mut io::stderr(), stdout, captured)
        }
    }
}

impl Session for Connection {
    fn run(&self, command: &str, echo: bool) -> Result<CommandOutput> {
        log::debug!("{}: {}", self.endpoint, command);

        let mut channel = self.session.channel_session()?;
        channel.exec(command)?;

        let mut captured = Vec::new();
        self.session.set_blocking(false);
        let forwarded = Self::forward(&channel, &mut captured, echo);
        self.session.set_blocking(true);
        forwarded?;

        channel.wait_close()?;
        let exit_code = channel.exit_status()?;
        let stdout = String::from_utf8_lossy(&captured).into_owned();

        if exit_code != 0 {
            return Err(Error::Command {
                command: command.to_string(),
                exit_code,
                output: stdout,
            });
        }

        Ok(CommandOutput { stdout })
    }
}

impl FileChannel for Connection {
    fn exists(&self, path: &str) -> Result<bool> {
        match self.sftp.lstat(Path::new(path)) {
            Ok(_) => Ok(true),
            Err(e) if matches!(e.code(), ErrorCode::SFTP(SFTP_NO_SUCH_FILE)) => Ok(false),
            Err(e) => Err(Error::Stat {
                path: path.to_string(),
                message: e.message().to_string(),
            }),
        }
    }

    fn mkdir(&self, path: &str) -> Result<()> {
        self.sftp.mkdir(Path::new(path), DIR_MODE)?;
        Ok(())
    }

    fn write(&self, path: &str, content: &[u8]) -> Result<()> {
        let mut file = self.sftp.create(Path::new(path))?;
        file.write_all(content)?;
        file.flush()?;
        Ok(())
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        let _ = self.session.disconnect(None, "closing", None);
    }
}
