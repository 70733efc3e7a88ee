//! Parsers for vagrant command output.

use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::types::{MachineStatus, SshDetails};

/// Parse `vagrant status <machine> --machine-readable`.
///
/// Rows look like `timestamp,target,type,data`; the `state` row for
/// `machine` carries the status.
pub fn parse_status(output: &str, machine: &str) -> Result<MachineStatus> {
    output
        .lines()
        .filter_map(|line| {
            let mut fields = line.splitn(4, ',');
            let _timestamp = fields.next()?;
            let target = fields.next()?;
            let kind = fields.next()?;
            let data = fields.next()?;
            (kind == "state" && target == machine).then_some(data)
        })
        .next()
        .map(MachineStatus::from_state)
        .ok_or_else(|| Error::parse("status", format!("no state reported for machine {machine}")))
}

/// Parse `vagrant ssh-config <machine>`.
pub fn parse_ssh_config(output: &str) -> Result<SshDetails> {
    let mut host = None;
    let mut user = None;
    let mut port = None;
    let mut identity_file = None;

    for line in output.lines() {
        let Some((key, value)) = line.trim().split_once(char::is_whitespace) else {
            continue;
        };
        let value = unquote(value.trim());
        match key {
            "HostName" => host = Some(value.to_string()),
            "User" => user = Some(value.to_string()),
            "Port" => {
                let parsed = value
                    .parse::<u16>()
                    .map_err(|e| Error::parse("ssh-config", format!("invalid Port {value:?}: {e}")))?;
                port = Some(parsed);
            }
            // Vagrant may list several keys; the first one is the machine's own.
            "IdentityFile" if identity_file.is_none() => {
                identity_file = Some(PathBuf::from(value));
            }
            _ => {}
        }
    }

    let missing = |field: &str| Error::parse("ssh-config", format!("missing {field}"));
    Ok(SshDetails {
        host: host.ok_or_else(|| missing("HostName"))?,
        user: user.ok_or_else(|| missing("User"))?,
        port: port.ok_or_else(|| missing("Port"))?,
        identity_file: identity_file.ok_or_else(|| missing("IdentityFile"))?,
    })
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}
