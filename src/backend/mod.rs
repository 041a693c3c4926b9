//! Connection manager backends
//!
//! [`ConnectionBackend`] is the only thing the menu talks to. A backend
//! implements the per-verb primitives for one external tool; the composite
//! operations (disconnect everything, status, export to a file) are shared.

pub mod nmcli;
pub mod runner;

pub use nmcli::NmcliBackend;
pub use runner::{CommandOutput, CommandRunner, SystemRunner};

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Connection type tag that marks an entry as a VPN
pub const VPN_KIND: &str = "vpn";

pub const EXPORT_EXTENSION: &str = ".ovpn";

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Error: failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("Error: {status}\n{output}")]
    Failed { status: String, output: String },
    #[error("Error: could not determine home directory")]
    HomeDirUnavailable,
    #[error("Error writing to file: {0}")]
    Write(#[from] io::Error),
}

/// One connection profile known to the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionEntry {
    pub name: String,
    pub kind: String,
}

impl ConnectionEntry {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
        }
    }

    pub fn is_vpn(&self) -> bool {
        self.kind == VPN_KIND
    }
}

/// What a backend operation reports back to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationResult {
    pub success: bool,
    pub message: String,
}

impl OperationResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

impl From<BackendError> for OperationResult {
    fn from(err: BackendError) -> Self {
        Self::failed(err.to_string())
    }
}

impl From<Result<String, BackendError>> for OperationResult {
    fn from(result: Result<String, BackendError>) -> Self {
        match result {
            Ok(text) => Self::ok(text),
            Err(e) => e.into(),
        }
    }
}

/// Where an exported profile is written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportTarget {
    pub path: PathBuf,
}

impl ExportTarget {
    /// Resolve the destination for exporting `name`
    ///
    /// An empty `destination` means `<home>/<name>.ovpn`. Otherwise the given
    /// path is used, with `.ovpn` appended when missing and a leading `~/`
    /// expanded against `home`.
    pub fn resolve(
        name: &str,
        destination: &str,
        home: Option<&Path>,
    ) -> Result<Self, BackendError> {
        if destination.is_empty() {
            let home = home.ok_or(BackendError::HomeDirUnavailable)?;
            return Ok(Self {
                path: home.join(format!("{}{}", name, EXPORT_EXTENSION)),
            });
        }

        let mut file = destination.to_string();
        if !file.ends_with(EXPORT_EXTENSION) {
            file.push_str(EXPORT_EXTENSION);
        }

        let path = match file.strip_prefix("~/") {
            Some(rest) => home.ok_or(BackendError::HomeDirUnavailable)?.join(rest),
            None => PathBuf::from(file),
        };

        Ok(Self { path })
    }
}

/// Write `contents` to `path`, readable and writable by the owner only
pub fn write_private(path: &Path, contents: &str) -> io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;

    // mode() only applies when the file is created
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    }

    file.write_all(contents.as_bytes())?;
    Ok(())
}

/// Collapse multi-line tool output so each result stays on one line
fn single_line(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn vpn_only(entries: Vec<ConnectionEntry>) -> Vec<ConnectionEntry> {
    entries.into_iter().filter(ConnectionEntry::is_vpn).collect()
}

/// Interface to an external connection manager
pub trait ConnectionBackend {
    /// List connections known to the tool, or only the active ones
    fn query(&self, active_only: bool) -> Result<Vec<ConnectionEntry>, BackendError>;

    /// Bring a connection up (single attempt)
    fn activate(&self, name: &str) -> OperationResult;

    fn deactivate(&self, name: &str) -> OperationResult;

    /// Detailed settings of one connection
    fn details(&self, name: &str) -> OperationResult;

    /// Import a profile file as a VPN connection
    fn import_profile(&self, path: &str) -> OperationResult;

    /// Delete a connection permanently. Callers confirm first.
    fn remove(&self, name: &str) -> OperationResult;

    /// Exported configuration text of one connection
    fn export_config(&self, name: &str) -> Result<String, BackendError>;

    fn try_list_all(&self) -> Result<Vec<ConnectionEntry>, BackendError> {
        self.query(false)
    }

    /// All connections; empty if the tool could not be queried
    fn list_all(&self) -> Vec<ConnectionEntry> {
        self.try_list_all().unwrap_or_else(|e| {
            warn!("Failed to list connections: {}", e);
            Vec::new()
        })
    }

    fn list_vpns(&self) -> Vec<ConnectionEntry> {
        vpn_only(self.list_all())
    }

    fn try_list_active_vpns(&self) -> Result<Vec<ConnectionEntry>, BackendError> {
        Ok(vpn_only(self.query(true)?))
    }

    fn list_active_vpns(&self) -> Vec<ConnectionEntry> {
        self.try_list_active_vpns().unwrap_or_else(|e| {
            warn!("Failed to list active connections: {}", e);
            Vec::new()
        })
    }

    /// Take down every active VPN, one result line per connection
    ///
    /// A failure on one connection does not stop the others.
    fn deactivate_all(&self) -> OperationResult {
        let active = match self.try_list_active_vpns() {
            Ok(active) => active,
            Err(e) => return e.into(),
        };
        if active.is_empty() {
            return OperationResult::ok("No active VPN connections found");
        }

        let mut success = true;
        let mut lines = Vec::with_capacity(active.len());
        for entry in &active {
            info!("Deactivating {}", entry.name);
            let result = self.deactivate(&entry.name);
            if !result.success {
                warn!("Failed to deactivate {}", entry.name);
                success = false;
            }
            lines.push(format!(
                "Disconnecting {}: {}",
                entry.name,
                single_line(&result.message)
            ));
        }

        OperationResult {
            success,
            message: lines.join("\n"),
        }
    }

    /// Details of every active VPN, one labeled block each
    fn status(&self) -> OperationResult {
        let active = match self.try_list_active_vpns() {
            Ok(active) => active,
            Err(e) => return e.into(),
        };
        if active.is_empty() {
            return OperationResult::ok("No active VPN connections");
        }

        let mut success = true;
        let mut message = String::from("Active VPN connections:\n");
        for entry in &active {
            let details = self.details(&entry.name);
            success &= details.success;
            message.push_str(&format!("--- {} ---\n{}\n", entry.name, details.message));
        }

        OperationResult { success, message }
    }

    /// Export `name` to `destination` (empty for the default) under the user's home
    fn export(&self, name: &str, destination: &str) -> OperationResult {
        let home = dirs::home_dir();
        self.export_in(name, destination, home.as_deref())
    }

    /// [`export`](Self::export) against an explicit home directory
    fn export_in(&self, name: &str, destination: &str, home: Option<&Path>) -> OperationResult {
        let target = match ExportTarget::resolve(name, destination, home) {
            Ok(target) => target,
            Err(e) => return e.into(),
        };

        // A failed export never touches the destination
        let config = match self.export_config(name) {
            Ok(config) => config,
            Err(e) => {
                warn!("Export of {} failed", name);
                return e.into();
            }
        };

        if let Err(e) = write_private(&target.path, &config) {
            return BackendError::Write(e).into();
        }

        info!("Exported {} to {}", name, target.path.display());
        OperationResult::ok(format!(
            "Successfully exported VPN configuration to {}",
            target.path.display()
        ))
    }
}
