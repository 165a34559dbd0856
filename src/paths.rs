//! Where vmdesk looks for its config file and writes its dev log.
//!
//! - Config: `$XDG_CONFIG_HOME/vmdesk/vmdesk.toml` (or `~/.config/...`)
//! - Logs:   `$XDG_DATA_HOME/vmdesk/logs/` (or `~/.local/share/...`)

use std::path::{Path, PathBuf};

const APP_NAME: &str = "vmdesk";
const CONFIG_FILE: &str = "vmdesk.toml";

/// Resolved application paths.
#[derive(Debug, Clone)]
pub struct AppPaths {
    pub config_file: PathBuf,
    pub logs: PathBuf,
}

impl AppPaths {
    /// Resolve from the environment. Does not create anything.
    pub fn resolve() -> Option<Self> {
        let home = std::env::var("HOME").ok().map(PathBuf::from)?;
        Some(Self::from_env(
            &home,
            std::env::var("XDG_CONFIG_HOME").ok(),
            std::env::var("XDG_DATA_HOME").ok(),
        ))
    }

    fn from_env(home: &Path, xdg_config: Option<String>, xdg_data: Option<String>) -> Self {
        let config_dir = match xdg_config.filter(|s| !s.is_empty()) {
            Some(xdg) => PathBuf::from(xdg).join(APP_NAME),
            None => home.join(".config").join(APP_NAME),
        };
        let data_dir = match xdg_data.filter(|s| !s.is_empty()) {
            Some(xdg) => PathBuf::from(xdg).join(APP_NAME),
            None => home.join(".local").join("share").join(APP_NAME),
        };

        Self {
            config_file: config_dir.join(CONFIG_FILE),
            logs: data_dir.join("logs"),
        }
    }
}
