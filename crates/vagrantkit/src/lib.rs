//! # vagrantkit
//!
//! Thin Rust wrapper around the Vagrant CLI.
//!
//! This crate provides functionality for:
//! - Querying machine status (`vagrant status --machine-readable`)
//! - Writing a Vagrantfile and booting machines with streamed output
//! - Re-provisioning, destroying and opening interactive shells
//! - Resolving SSH connection details (`vagrant ssh-config`)
//!
//! ## Example
//!
//! ```no_run
//! use vagrantkit::{Backend, MachineStatus, default_backend};
//! use std::path::Path;
//!
//! let backend = default_backend(Path::new(".clover")).expect("vagrant not available");
//! if backend.status("web").unwrap() == MachineStatus::NotCreated {
//!     for line in backend.boot("web").unwrap() {
//!         println!("{}", line.unwrap());
//!     }
//! }
//! let ssh = backend.ssh_config("web").unwrap();
//! println!("{}@{}:{}", ssh.user, ssh.host, ssh.port);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod error;
pub mod parse;
pub mod types;

pub use backend::vagrant::{VAGRANTFILE, VagrantBackend};
pub use backend::{Backend, default_backend};
pub use error::{Error, Result};
pub use types::{LogLines, MachineStatus, SshDetails};
