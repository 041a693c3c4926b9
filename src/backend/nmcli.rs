//! NetworkManager backend driven through `nmcli`
//!
//! Listings use terse mode (`-t -f NAME,TYPE`), which prints one
//! `NAME:TYPE` record per line and escapes `:` and `\` inside values
//! with a backslash.

use super::runner::{CommandRunner, SystemRunner};
use super::{BackendError, ConnectionBackend, ConnectionEntry, OperationResult};
use crate::config::BackendConfig;
use tracing::{debug, info};

const LISTING_FIELDS: usize = 2;

pub struct NmcliBackend<R = SystemRunner> {
    runner: R,
    program: String,
    import_type: String,
    /// Elevation wrapper for `connection export`, if any
    export_via: Option<String>,
}

impl NmcliBackend<SystemRunner> {
    pub fn new(config: &BackendConfig) -> Self {
        Self::with_runner(config, SystemRunner::new())
    }
}

impl<R: CommandRunner> NmcliBackend<R> {
    pub fn with_runner(config: &BackendConfig, runner: R) -> Self {
        Self {
            runner,
            program: config.program.clone(),
            import_type: config.import_type.clone(),
            export_via: config
                .export_with_sudo
                .then(|| config.sudo_program.clone()),
        }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    fn exec(&self, args: &[&str]) -> Result<String, BackendError> {
        self.exec_as(&self.program, args)
    }

    fn exec_as(&self, program: &str, args: &[&str]) -> Result<String, BackendError> {
        let output = self
            .runner
            .run(program, args)
            .map_err(|source| BackendError::Spawn {
                program: program.to_string(),
                source,
            })?;

        if !output.success {
            debug!("{} failed with {}", program, output.status_text());
            return Err(BackendError::Failed {
                status: output.status_text(),
                output: output.text,
            });
        }

        Ok(output.text)
    }
}

impl<R: CommandRunner> ConnectionBackend for NmcliBackend<R> {
    fn query(&self, active_only: bool) -> Result<Vec<ConnectionEntry>, BackendError> {
        let mut args = vec!["-t", "-f", "NAME,TYPE", "connection", "show"];
        if active_only {
            args.push("--active");
        }
        let output = self.exec(&args)?;
        Ok(parse_listing(&output))
    }

    fn activate(&self, name: &str) -> OperationResult {
        info!("Activating {}", name);
        self.exec(&["connection", "up", name]).into()
    }

    fn deactivate(&self, name: &str) -> OperationResult {
        self.exec(&["connection", "down", name]).into()
    }

    fn details(&self, name: &str) -> OperationResult {
        self.exec(&["connection", "show", name]).into()
    }

    fn import_profile(&self, path: &str) -> OperationResult {
        info!("Importing {} as {}", path, self.import_type);
        self.exec(&["connection", "import", "type", self.import_type.as_str(), "file", path])
            .into()
    }

    fn remove(&self, name: &str) -> OperationResult {
        info!("Deleting {}", name);
        self.exec(&["connection", "delete", name]).into()
    }

    fn export_config(&self, name: &str) -> Result<String, BackendError> {
        match &self.export_via {
            Some(sudo) => self.exec_as(sudo, &[self.program.as_str(), "connection", "export", name]),
            None => self.exec(&["connection", "export", name]),
        }
    }
}

/// Parse terse `NAME:TYPE` listing output
///
/// Lines that are blank or do not have exactly two fields are skipped.
pub fn parse_listing(output: &str) -> Vec<ConnectionEntry> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| {
            let mut fields = split_terse(line);
            if fields.len() != LISTING_FIELDS || fields[0].is_empty() {
                debug!("Skipping listing line: {:?}", line);
                return None;
            }
            let kind = fields.pop()?;
            let name = fields.pop()?;
            Some(ConnectionEntry { name, kind })
        })
        .collect()
}

/// Split one terse record on unescaped `:`, removing escapes
fn split_terse(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(escaped) = chars.next() {
                    current.push(escaped);
                }
            }
            ':' => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);

    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::runner::testing::{fail, ok, FakeRunner};
    use tempfile::TempDir;

    const LISTING: &str = "home:802-11-wireless\nwork-vpn:vpn\nalt-vpn:vpn\n";

    fn backend(runner: FakeRunner) -> NmcliBackend<FakeRunner> {
        NmcliBackend::with_runner(&BackendConfig::default(), runner)
    }

    fn names(entries: &[ConnectionEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn test_parse_listing_scenario() {
        let entries = parse_listing("home:802-11-wireless\nwork-vpn:vpn\nalt-vpn:vpn");

        assert_eq!(names(&entries), vec!["home", "work-vpn", "alt-vpn"]);
        assert_eq!(entries[0].kind, "802-11-wireless");
        assert!(entries[1].is_vpn());
    }

    #[test]
    fn test_parse_listing_skips_malformed() {
        let output = "\nno-colon-here\na:b:c\n:vpn\nok:vpn\n   \nwired:802-3-ethernet\n";
        let entries = parse_listing(output);

        assert_eq!(names(&entries), vec!["ok", "wired"]);
    }

    #[test]
    fn test_parse_listing_unescapes() {
        let entries = parse_listing("corp\\:east:vpn\nback\\\\slash:vpn\n");

        assert_eq!(names(&entries), vec!["corp:east", "back\\slash"]);
        assert!(entries.iter().all(ConnectionEntry::is_vpn));
    }

    #[test]
    fn test_parse_listing_kind_must_match_exactly() {
        let entries = parse_listing("a:vpn-ish\nb:wireguard\nc:vpn\n");
        let vpns: Vec<_> = entries.into_iter().filter(ConnectionEntry::is_vpn).collect();

        assert_eq!(names(&vpns), vec!["c"]);
    }

    #[test]
    fn test_list_vpns_and_all() {
        let nm = backend(FakeRunner::new(|_| ok(LISTING)));

        assert_eq!(names(&nm.list_all()), vec!["home", "work-vpn", "alt-vpn"]);
        assert_eq!(names(&nm.list_vpns()), vec!["work-vpn", "alt-vpn"]);
        assert_eq!(
            nm.runner().calls()[0],
            vec!["nmcli", "-t", "-f", "NAME,TYPE", "connection", "show"]
        );
    }

    #[test]
    fn test_list_active_uses_active_flag() {
        let nm = backend(FakeRunner::new(|_| ok("work-vpn:vpn\n")));

        assert_eq!(names(&nm.list_active_vpns()), vec!["work-vpn"]);
        assert_eq!(nm.runner().calls()[0].last().unwrap(), "--active");
    }

    #[test]
    fn test_list_failure_is_soft() {
        let nm = backend(FakeRunner::new(|_| fail(8, "Error: NetworkManager is not running.\n")));

        assert!(nm.list_vpns().is_empty());

        let err = nm.try_list_all().unwrap_err();
        assert!(err.to_string().contains("NetworkManager is not running"));
    }

    #[test]
    fn test_spawn_failure_is_soft() {
        let nm = backend(FakeRunner::new(|_| {
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "not found"))
        }));

        assert!(nm.list_all().is_empty());
        let result = nm.activate("work");
        assert!(!result.success);
        assert!(result.message.starts_with("Error: failed to run nmcli"));
    }

    #[test]
    fn test_activate() {
        let nm = backend(FakeRunner::new(|_| {
            ok("Connection successfully activated (D-Bus active path: /x/1)\n")
        }));

        let result = nm.activate("work-vpn");

        assert!(result.success);
        assert!(result.message.contains("successfully activated"));
        assert_eq!(nm.runner().calls(), vec![vec!["nmcli", "connection", "up", "work-vpn"]]);
    }

    #[test]
    fn test_activate_failure_keeps_output() {
        let nm = backend(FakeRunner::new(|_| {
            fail(4, "Error: Connection activation failed: timeout.\n")
        }));

        let result = nm.activate("work-vpn");

        assert!(!result.success);
        assert_eq!(
            result.message,
            "Error: exit status 4\nError: Connection activation failed: timeout.\n"
        );
        assert_eq!(nm.runner().calls().len(), 1);
    }

    #[test]
    fn test_deactivate_all_reports_every_entry() {
        let nm = backend(FakeRunner::new(|call| {
            if call.iter().any(|a| a == "--active") {
                ok("a:vpn\nwifi:802-11-wireless\nb:vpn\nc:vpn\n")
            } else {
                fail(10, "Error: not an active connection.\n")
            }
        }));

        let result = nm.deactivate_all();

        assert!(!result.success);
        assert_eq!(result.message.lines().count(), 3);
        assert_eq!(nm.runner().count_matching(&["connection", "down"]), 3);
        assert_eq!(nm.runner().count_matching(&["down", "wifi"]), 0);
    }

    #[test]
    fn test_status_empty_no_detail_calls() {
        let nm = backend(FakeRunner::new(|_| ok("wifi:802-11-wireless\n")));

        let result = nm.status();

        assert_eq!(result.message, "No active VPN connections");
        assert_eq!(nm.runner().calls().len(), 1);
    }

    #[test]
    fn test_status_fetches_details() {
        let nm = backend(FakeRunner::new(|call| {
            if call.iter().any(|a| a == "--active") {
                ok("work-vpn:vpn\n")
            } else {
                ok("connection.id:                work-vpn\n")
            }
        }));

        let result = nm.status();

        assert!(result.message.starts_with("Active VPN connections:\n--- work-vpn ---\n"));
        assert_eq!(nm.runner().count_matching(&["connection", "show", "work-vpn"]), 1);
    }

    #[test]
    fn test_import_and_remove_args() {
        let nm = backend(FakeRunner::new(|_| ok("")));

        nm.import_profile("/tmp/office.ovpn");
        nm.remove("office");

        assert_eq!(
            nm.runner().calls(),
            vec![
                vec!["nmcli", "connection", "import", "type", "openvpn", "file", "/tmp/office.ovpn"],
                vec!["nmcli", "connection", "delete", "office"],
            ]
        );
    }

    #[test]
    fn test_export_runs_through_sudo() {
        let temp_dir = TempDir::new().unwrap();
        let nm = backend(FakeRunner::new(|_| ok("client\ndev tun\n")));

        let result = nm.export_in("work-vpn", "", Some(temp_dir.path()));

        assert!(result.success);
        assert_eq!(
            nm.runner().calls(),
            vec![vec!["sudo", "nmcli", "connection", "export", "work-vpn"]]
        );
        let written = std::fs::read_to_string(temp_dir.path().join("work-vpn.ovpn")).unwrap();
        assert_eq!(written, "client\ndev tun\n");
    }

    #[test]
    fn test_export_without_sudo() {
        let config = BackendConfig {
            export_with_sudo: false,
            ..BackendConfig::default()
        };
        let nm = NmcliBackend::with_runner(&config, FakeRunner::new(|_| ok("client\n")));

        nm.export_config("work-vpn").unwrap();

        assert_eq!(
            nm.runner().calls(),
            vec![vec!["nmcli", "connection", "export", "work-vpn"]]
        );
    }

    #[test]
    fn test_export_permission_error_skips_write() {
        let temp_dir = TempDir::new().unwrap();
        let nm = backend(FakeRunner::new(|_| {
            fail(1, "sudo: a terminal is required to read the password\n")
        }));

        let result = nm.export_in("work-vpn", "", Some(temp_dir.path()));

        assert!(!result.success);
        assert!(result.message.contains("a terminal is required"));
        assert!(!temp_dir.path().join("work-vpn.ovpn").exists());
    }

    #[test]
    fn test_export_name_containing_error_succeeds() {
        let temp_dir = TempDir::new().unwrap();
        let nm = backend(FakeRunner::new(|_| ok("# ErrorBudget-vpn\nclient\n")));

        let result = nm.export_in("ErrorBudget-vpn", "", Some(temp_dir.path()));

        assert!(result.success);
        assert!(temp_dir.path().join("ErrorBudget-vpn.ovpn").exists());
    }
}
