//! Ansible artifacts: the guest bootstrap script, inventories and
//! `ansible-playbook` arguments.

use sshkit::Endpoint;
use std::path::Path;

use crate::config::AnsibleSpec;

/// Installs Ansible on the guest with apt or yum.
pub const BOOTSTRAP: &str = r#"#!/bin/bash
set -e

if command -v ansible-playbook >/dev/null 2>&1; then
  exit 0
fi

if command -v apt-get >/dev/null 2>&1; then
  export DEBIAN_FRONTEND=noninteractive
  apt-get update
  apt-get install -y ansible
elif command -v yum >/dev/null 2>&1; then
  yum install -y epel-release || true
  yum install -y ansible
else
  echo "no supported package manager (apt-get or yum) found" >&2
  exit 1
fi
"#;

/// Inventory with a `default` host, repeated under each group.
pub fn render_inventory(endpoint: &Endpoint, groups: &[String]) -> String {
    let host = format!(
        "default ansible_host={} ansible_user={} ansible_port={} ansible_ssh_private_key_file={}",
        endpoint.host,
        endpoint.user,
        endpoint.port,
        endpoint.identity_file.display()
    );

    let mut out = format!("{host}\n");
    for group in groups {
        out.push_str(&format!("\n[{group}]\n{host}\n"));
    }
    out
}

/// `-i <inventory> <playbook> [--extra-vars v]...`
pub fn playbook_args(inventory: &Path, spec: &AnsibleSpec) -> Vec<String> {
    let mut args = vec![
        "-i".to_string(),
        inventory.display().to_string(),
        spec.playbook.clone(),
    ];
    for var in &spec.extra_vars {
        args.push("--extra-vars".to_string());
        args.push(var.clone());
    }
    args
}
