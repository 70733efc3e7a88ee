//! Real Vagrant CLI backend using `vagrant` commands.
//!
//! Every invocation runs with the project directory as its working directory;
//! the process-wide current directory is never changed.

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::parse::{parse_ssh_config, parse_status};
use crate::types::{LogLines, MachineStatus, SshDetails};
use std::fs;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};

/// Name of the vagrant configuration file inside the project directory.
pub const VAGRANTFILE: &str = "Vagrantfile";

/// Backend that executes real `vagrant` commands.
pub struct VagrantBackend {
    /// Path to the vagrant executable
    vagrant_path: PathBuf,
    /// Project directory holding the Vagrantfile
    dir: PathBuf,
}

impl VagrantBackend {
    /// Create a backend for the project at `dir`.
    ///
    /// Returns an error if vagrant is not installed.
    pub fn new(dir: &Path) -> Result<Self> {
        let vagrant_path = which::which("vagrant").map_err(|_| Error::VagrantNotFound)?;
        Ok(Self::with_executable(vagrant_path, dir))
    }

    /// Create a backend using an explicit vagrant executable.
    pub fn with_executable(vagrant_path: impl Into<PathBuf>, dir: &Path) -> Self {
        Self {
            vagrant_path: vagrant_path.into(),
            dir: dir.to_path_buf(),
        }
    }

    /// Path of the Vagrantfile this backend uses.
    pub fn vagrantfile(&self) -> PathBuf {
        self.dir.join(VAGRANTFILE)
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(&self.vagrant_path);
        cmd.args(args).current_dir(&self.dir);
        cmd
    }

    /// Run vagrant, capture stdout, and check for success.
    fn run_captured(&self, args: &[&str]) -> Result<String> {
        log::debug!("vagrant {}", args.join(" "));
        let output = self.command(args).output()?;
        if !output.status.success() {
            return Err(Error::CommandFailed {
                command: display_command(args),
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Run vagrant with inherited streams.
    fn run_inherited(&self, args: &[&str]) -> Result<()> {
        log::debug!("vagrant {}", args.join(" "));
        let status = self
            .command(args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()?;
        if !status.success() {
            return Err(Error::CommandFailed {
                command: display_command(args),
                status: status.code(),
                stderr: String::new(),
            });
        }
        Ok(())
    }

    /// Spawn vagrant with piped stdout, returning its lines lazily.
    fn run_streaming(&self, args: &[&str]) -> Result<LogLines> {
        log::debug!("vagrant {}", args.join(" "));
        let mut child = self
            .command(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::Io(std::io::Error::other("child stdout not captured")))?;
        Ok(Box::new(ChildLines {
            command: display_command(args),
            child,
            lines: BufReader::new(stdout).lines(),
            finished: false,
        }))
    }
}

impl Backend for VagrantBackend {
    fn status(&self, machine: &str) -> Result<MachineStatus> {
        if !self.vagrantfile().exists() {
            return Ok(MachineStatus::NotCreated);
        }
        let output = self.run_captured(&["status", machine, "--machine-readable"])?;
        parse_status(&output, machine)
    }

    fn create(&self, config: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.vagrantfile(), config)?;
        log::debug!("wrote {}", self.vagrantfile().display());
        Ok(())
    }

    fn boot(&self, machine: &str) -> Result<LogLines> {
        self.run_streaming(&["up", machine])
    }

    fn reapply(&self, machine: &str) -> Result<()> {
        self.run_inherited(&["provision", machine])
    }

    fn ssh_config(&self, machine: &str) -> Result<SshDetails> {
        let output = self.run_captured(&["ssh-config", machine])?;
        parse_ssh_config(&output)
    }

    fn destroy(&self) -> Result<LogLines> {
        self.run_streaming(&["destroy", "-f"])
    }

    fn ssh(&self, machine: &str) -> Result<()> {
        self.run_inherited(&["ssh", machine])
    }
}

fn display_command(args: &[&str]) -> String {
    format!("vagrant {}", args.join(" "))
}

/// Lines of a running child's stdout; reaps the child at end of output.
struct ChildLines {
    command: String,
    child: Child,
    lines: Lines<BufReader<ChildStdout>>,
    finished: bool,
}

impl Iterator for ChildLines {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.lines.next() {
            Some(Ok(line)) => Some(Ok(line)),
            Some(Err(e)) => {
                self.finished = true;
                let _ = self.child.kill();
                let _ = self.child.wait();
                Some(Err(e.into()))
            }
            None => {
                self.finished = true;
                match self.child.wait() {
                    Ok(status) if status.success() => None,
                    Ok(status) => Some(Err(Error::CommandFailed {
                        command: self.command.clone(),
                        status: status.code(),
                        stderr: String::new(),
                    })),
                    Err(e) => Some(Err(e.into())),
                }
            }
        }
    }
}

impl Drop for ChildLines {
    fn drop(&mut self) {
        if !self.finished {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}
