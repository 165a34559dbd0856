//! Launcher configuration.
//!
//! Read once at startup from `vmdesk.toml`. Every field has a default, so a
//! missing file is fine and an empty file means "all defaults":
//!
//! ```toml
//! vm_name = "RDPWindows"
//! rdp_port = 3389
//! # rdp_ip = "192.168.122.50"   # skip address discovery
//!
//! [credentials]
//! user = "alice"
//! password = "hunter2"
//! domain = ""
//!
//! [client]
//! program = "xfreerdp"
//! scale = 100
//! extra_flags = ["/sound"]
//! ```

use std::fmt;
use std::net::Ipv4Addr;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use tracing::info;

pub const DEFAULT_VM_NAME: &str = "RDPWindows";
pub const DEFAULT_RDP_PORT: u16 = 3389;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LauncherConfig {
    /// libvirt domain name of the managed VM.
    pub vm_name: String,
    /// Remote-desktop port inside the guest.
    pub rdp_port: u16,
    /// Address supplied up front; address discovery is skipped when set.
    pub rdp_ip: Option<Ipv4Addr>,
    pub credentials: Credentials,
    pub client: ClientConfig,
    /// Groups the invoking user must belong to before any VM is touched.
    pub required_groups: Vec<String>,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            vm_name: DEFAULT_VM_NAME.to_string(),
            rdp_port: DEFAULT_RDP_PORT,
            rdp_ip: None,
            credentials: Credentials::default(),
            client: ClientConfig::default(),
            required_groups: vec!["libvirt".to_string(), "kvm".to_string()],
        }
    }
}

/// Session credentials. Passed through to the client untouched.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Credentials {
    pub user: String,
    pub password: String,
    pub domain: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("domain", &self.domain)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    /// Remote-desktop client executable.
    pub program: String,
    /// Desktop scale factor in percent.
    pub scale: u16,
    /// Appended verbatim after the built-in flags.
    pub extra_flags: Vec<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            program: "xfreerdp".to_string(),
            scale: 100,
            extra_flags: Vec::new(),
        }
    }
}

impl LauncherConfig {
    /// Parse a config from TOML text.
    pub fn from_toml(text: &str) -> anyhow::Result<Self> {
        toml::from_str(text).context("failed to parse config")
    }

    /// Load from `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("failed to read {}", path.display()));
            }
        };

        let config =
            Self::from_toml(&text).with_context(|| format!("in {}", path.display()))?;
        info!(path = %path.display(), vm = %config.vm_name, "config loaded");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_all_defaults() {
        let cfg = LauncherConfig::from_toml("").unwrap();
        assert_eq!(cfg, LauncherConfig::default());
        assert_eq!(cfg.vm_name, "RDPWindows");
        assert_eq!(cfg.rdp_port, 3389);
        assert_eq!(cfg.required_groups, vec!["libvirt", "kvm"]);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = LauncherConfig::from_toml(
            r#"
            rdp_ip = "192.168.122.50"

            [credentials]
            user = "alice"
            password = "s3cret"

            [client]
            extra_flags = ["/sound"]
            "#,
        )
        .unwrap();

        assert_eq!(cfg.rdp_ip, Some(Ipv4Addr::new(192, 168, 122, 50)));
        assert_eq!(cfg.credentials.user, "alice");
        assert_eq!(cfg.credentials.domain, "");
        assert_eq!(cfg.client.program, "xfreerdp");
        assert_eq!(cfg.client.scale, 100);
        assert_eq!(cfg.client.extra_flags, vec!["/sound"]);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(LauncherConfig::from_toml("vm_nmae = \"typo\"").is_err());
    }

    #[test]
    fn bad_address_is_rejected() {
        assert!(LauncherConfig::from_toml("rdp_ip = \"not-an-ip\"").is_err());
    }

    #[test]
    fn debug_output_hides_password() {
        let creds = Credentials {
            user: "alice".into(),
            password: "s3cret".into(),
            domain: String::new(),
        };
        let rendered = format!("{creds:?}");
        assert!(rendered.contains("alice"));
        assert!(!rendered.contains("s3cret"));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = LauncherConfig::load(&dir.path().join("vmdesk.toml")).unwrap();
        assert_eq!(cfg, LauncherConfig::default());
    }

    #[test]
    fn file_on_disk_is_parsed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vmdesk.toml");
        std::fs::write(&path, "vm_name = \"win11\"\nrdp_port = 3390\n").unwrap();

        let cfg = LauncherConfig::load(&path).unwrap();
        assert_eq!(cfg.vm_name, "win11");
        assert_eq!(cfg.rdp_port, 3390);
    }

    #[test]
    fn malformed_file_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vmdesk.toml");
        std::fs::write(&path, "rdp_port = \"lots\"").unwrap();

        let err = LauncherConfig::load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("vmdesk.toml"));
    }
}
