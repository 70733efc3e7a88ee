//! # sshkit
//!
//! Blocking SSH access to a single machine: run commands with live output,
//! check and create paths, and upload content with temp-then-move semantics.
//!
//! ## Example
//!
//! ```no_run
//! use sshkit::{Connection, Endpoint, FileChannel, FileUpload, Session};
//! use std::path::PathBuf;
//!
//! let endpoint = Endpoint {
//!     host: "127.0.0.1".into(),
//!     user: "vagrant".into(),
//!     port: 2222,
//!     identity_file: PathBuf::from(".vagrant/machines/web/virtualbox/private_key"),
//! };
//! let conn = Connection::connect(&endpoint).expect("connect");
//!
//! conn.ensure_dir(".work").unwrap();
//! if !conn.exists("/etc/motd").unwrap() {
//!     let file = FileUpload {
//!         path: "/etc/motd",
//!         content: b"hello\n",
//!         user: Some("root"),
//!         group: Some("root"),
//!         mode: 0o644,
//!     };
//!     sshkit::upload(&conn, ".work", &file).unwrap();
//! }
//! conn.run("uptime", true).unwrap();
//! ```
//!
//! ## Traits
//!
//! [`Session`] and [`FileChannel`] split a host into its command and file
//! halves. [`Connection`] implements both; tests substitute their own.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod channel;
pub mod command;
pub mod connection;
pub mod endpoint;
pub mod error;
pub mod session;
pub mod stream;
pub mod tee;
pub mod upload;

pub use channel::FileChannel;
pub use command::{remote_join, remote_parent, shell_command, sudo};
pub use connection::Connection;
pub use endpoint::Endpoint;
pub use error::{Error, Result, UploadStep};
pub use session::{CommandOutput, Session};
pub use tee::Tee;
pub use upload::{FileUpload, owner_spec, temp_path, upload};

/// A host that can both run commands and transfer files.
pub trait Remote: Session + FileChannel {}

impl<T: Session + FileChannel + ?Sized> Remote for T {}
