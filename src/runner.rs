use anyhow::{Context, Result};
use std::path::Path;
use std::process::{Command, Stdio};

/// Runs programs on the controlling host.
pub trait CommandRunner {
    /// Check if a program is on PATH
    fn exists(&self, program: &str) -> bool;

    /// Run a program in `cwd` with inherited stdio; non-zero exit is an error
    fn run(&self, program: &str, args: &[String], cwd: &Path) -> Result<()>;
}

pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn exists(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }

    fn run(&self, program: &str, args: &[String], cwd: &Path) -> Result<()> {
        log::debug!("{} {} (in {})", program, args.join(" "), cwd.display());
        let status = Command::new(program)
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .with_context(|| format!("Failed to execute: {} {}", program, args.join(" ")))?;

        if !status.success() {
            match status.code() {
                Some(code) => anyhow::bail!("{program} exited with status {code}"),
                None => anyhow::bail!("{program} was terminated by a signal"),
            }
        }
        Ok(())
    }
}
