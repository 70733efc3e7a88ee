//! Vagrantfile rendering.
//!
//! One `config.vm.define` block per node. The default `/vagrant` share is
//! disabled and the node's host directory is mounted at `/clover` instead.
//! Provisioning is not expressed here; it runs over SSH after boot.

use std::path::{Path, PathBuf};

use crate::config::Config;

/// Guest mount point of the per-node host directory.
pub const GUEST_MOUNT: &str = "/clover";

const LOOPBACK: &str = "127.0.0.1";

/// `guest:host:proto` or `guest_ip:guest:host_ip:host:proto`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardedPort {
    pub guest_ip: String,
    pub guest: u16,
    pub host_ip: String,
    pub host: u16,
    pub protocol: String,
}

impl ForwardedPort {
    pub fn parse(entry: &str) -> Option<Self> {
        let parts: Vec<&str> = entry.split(':').map(str::trim).collect();
        let (guest_ip, guest, host_ip, host, protocol) = match parts.as_slice() {
            [guest, host, proto] => (LOOPBACK, *guest, LOOPBACK, *host, *proto),
            [guest_ip, guest, host_ip, host, proto] => (*guest_ip, *guest, *host_ip, *host, *proto),
            _ => return None,
        };
        if !matches!(protocol, "tcp" | "udp") || guest_ip.is_empty() || host_ip.is_empty() {
            return None;
        }
        Some(Self {
            guest_ip: guest_ip.to_string(),
            guest: guest.parse().ok()?,
            host_ip: host_ip.to_string(),
            host: host.parse().ok()?,
            protocol: protocol.to_string(),
        })
    }
}

/// `host_dir:guest_dir`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncedFolder {
    pub host: String,
    pub guest: String,
}

impl SyncedFolder {
    pub fn parse(entry: &str) -> Option<Self> {
        let mut parts = entry.split(':');
        let host = parts.next()?.trim();
        let guest = parts.next()?.trim();
        if parts.next().is_some() || host.is_empty() || guest.is_empty() {
            return None;
        }
        Some(Self {
            host: host.to_string(),
            guest: guest.to_string(),
        })
    }

    /// Host directory with `~` expanded, relative paths taken from `base_dir`.
    pub fn host_path(&self, base_dir: &Path) -> PathBuf {
        let expanded = PathBuf::from(shellexpand::tilde(&self.host).as_ref());
        if expanded.is_absolute() {
            expanded
        } else {
            base_dir.join(expanded)
        }
    }
}

/// Render the Vagrantfile for every node of `config`.
///
/// Entries are assumed valid; [`Config::validate`] rejects malformed ones
/// before rendering.
pub fn render_vagrantfile(config: &Config, base_dir: &Path) -> String {
    let mut lines = vec!["Vagrant.configure(\"2\") do |config|".to_string()];

    for node in &config.nodes {
        let vagrant = node.vagrant();
        let name = ruby_str(&node.name);

        lines.push(format!("  config.vm.define {name} do |node|"));
        lines.push(format!("    node.vm.box = {}", ruby_str(&vagrant.image)));
        lines.push(format!("    node.vm.hostname = {name}"));

        for port in vagrant
            .network
            .forwarded_port
            .iter()
            .filter_map(|p| ForwardedPort::parse(p))
        {
            lines.push(format!(
                "    node.vm.network \"forwarded_port\", guest_ip: {}, guest: {}, host_ip: {}, host: {}, protocol: {}",
                ruby_str(&port.guest_ip),
                port.guest,
                ruby_str(&port.host_ip),
                port.host,
                ruby_str(&port.protocol),
            ));
        }

        lines.push("    node.vm.synced_folder \".\", \"/vagrant\", disabled: true".to_string());
        lines.push(format!(
            "    node.vm.synced_folder {name}, {}",
            ruby_str(GUEST_MOUNT)
        ));
        for folder in vagrant
            .synced_folders
            .iter()
            .filter_map(|f| SyncedFolder::parse(f))
        {
            let host = folder.host_path(base_dir);
            lines.push(format!(
                "    node.vm.synced_folder {}, {}",
                ruby_str(&host.to_string_lossy()),
                ruby_str(&folder.guest)
            ));
        }

        lines.push("  end".to_string());
    }

    lines.push("end".to_string());
    lines.join("\n") + "\n"
}

/// Double-quoted Ruby string literal.
fn ruby_str(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '#' if chars.peek() == Some(&'{') => out.push_str("\\#"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(yaml: &str) -> Config {
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        config.validate().unwrap();
        config
    }

    #[test]
    fn test_forwarded_port_short_form() {
        let port = ForwardedPort::parse("80:8080:tcp").unwrap();
        assert_eq!(port.guest_ip, "127.0.0.1");
        assert_eq!(port.guest, 80);
        assert_eq!(port.host_ip, "127.0.0.1");
        assert_eq!(port.host, 8080);
        assert_eq!(port.protocol, "tcp");
    }

    #[test]
    fn test_forwarded_port_long_form() {
        let port = ForwardedPort::parse("10.0.2.15:53:0.0.0.0:5353:udp").unwrap();
        assert_eq!(port.guest_ip, "10.0.2.15");
        assert_eq!(port.host, 5353);
        assert_eq!(port.protocol, "udp");
    }

    #[test]
    fn test_forwarded_port_rejects_malformed() {
        assert!(ForwardedPort::parse("80:8080").is_none());
        assert!(ForwardedPort::parse("80:http:tcp").is_none());
        assert!(ForwardedPort::parse("80:8080:sctp").is_none());
        assert!(ForwardedPort::parse("a:b:c:d").is_none());
        assert!(ForwardedPort::parse("80:70000:tcp").is_none());
    }

    #[test]
    fn test_synced_folder_paths() {
        let base = Path::new("/work/project");

        let relative = SyncedFolder::parse("src:/srv/src").unwrap();
        assert_eq!(relative.host_path(base), PathBuf::from("/work/project/src"));
        assert_eq!(relative.guest, "/srv/src");

        let absolute = SyncedFolder::parse("/data:/data").unwrap();
        assert_eq!(absolute.host_path(base), PathBuf::from("/data"));

        let home = SyncedFolder::parse("~/code:/code").unwrap();
        if std::env::var_os("HOME").is_some() {
            assert!(!home.host_path(base).starts_with("/work/project"));
        }

        assert!(SyncedFolder::parse("/a").is_none());
        assert!(SyncedFolder::parse("/a:/b:/c").is_none());
        assert!(SyncedFolder::parse(":/b").is_none());
    }

    #[test]
    fn test_ruby_str_escapes() {
        assert_eq!(ruby_str("plain"), "\"plain\"");
        assert_eq!(ruby_str("a\"b"), "\"a\\\"b\"");
        assert_eq!(ruby_str("c:\\dir"), "\"c:\\\\dir\"");
        assert_eq!(ruby_str("#{system('x')}"), "\"\\#{system('x')}\"");
        assert_eq!(ruby_str("issue #1"), "\"issue #1\"");
    }

    #[test]
    fn test_render_vagrantfile() {
        let config = config(
            r#"
nodes:
  - name: web
    provider:
      name: vagrant
      box: ubuntu/jammy64
      synced_folders: ["app:/srv/app"]
      network:
        forwarded_port: ["80:8080:tcp"]
  - name: db
    provider:
      name: vagrant
      box: debian/bookworm64
"#,
        );
        let rendered = render_vagrantfile(&config, Path::new("/work"));

        let expected = r#"Vagrant.configure("2") do |config|
  config.vm.define "web" do |node|
    node.vm.box = "ubuntu/jammy64"
    node.vm.hostname = "web"
    node.vm.network "forwarded_port", guest_ip: "127.0.0.1", guest: 80, host_ip: "127.0.0.1", host: 8080, protocol: "tcp"
    node.vm.synced_folder ".", "/vagrant", disabled: true
    node.vm.synced_folder "web", "/clover"
    node.vm.synced_folder "/work/app", "/srv/app"
  end
  config.vm.define "db" do |node|
    node.vm.box = "debian/bookworm64"
    node.vm.hostname = "db"
    node.vm.synced_folder ".", "/vagrant", disabled: true
    node.vm.synced_folder "db", "/clover"
  end
end
"#;
        assert_eq!(rendered, expected);
    }
}
