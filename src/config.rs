//! Configuration handling for vpn-menu
//!
//! Every field has a default, so a missing file or a partial file both work.
//! The defaults drive `nmcli` exactly the way the menu always has.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::menu::Capabilities;

pub const LOCAL_CONFIG_FILE: &str = "vpn-menu.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub backend: BackendConfig,
    pub menu: MenuConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Connection manager binary
    pub program: String,
    /// Profile type passed to `connection import type <..>`
    pub import_type: String,
    /// Run the export through `sudo_program` (secrets need root)
    pub export_with_sudo: bool,
    pub sudo_program: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            program: "nmcli".to_string(),
            import_type: "openvpn".to_string(),
            export_with_sudo: true,
            sudo_program: "sudo".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MenuConfig {
    /// Offer the Export action
    pub export: bool,
    /// Pick connections from a list instead of typing the name
    pub selection_lists: bool,
}

impl Default for MenuConfig {
    fn default() -> Self {
        Self {
            export: true,
            selection_lists: true,
        }
    }
}

impl MenuConfig {
    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            supports_export: self.export,
            supports_selection_lists: self.selection_lists,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load config from an explicit path, or the first default location that exists
    ///
    /// Search order: `./vpn-menu.toml`, then `<config dir>/vpn-menu/config.toml`.
    /// An explicit path must exist; the default locations fall back to defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            debug!("Loading config from {}", path.display());
            return Self::load(path);
        }

        for candidate in default_locations() {
            if candidate.exists() {
                debug!("Loading config from {}", candidate.display());
                return Self::load(&candidate);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }
}

fn default_locations() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(LOCAL_CONFIG_FILE)];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("vpn-menu").join("config.toml"));
    }
    paths
}
