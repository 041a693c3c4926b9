//! Interactive menu
//!
//! One idle state: show the actions, run the chosen one against the backend,
//! print what it reported, repeat until Exit. Backend failures are printed
//! and the loop carries on; only a broken terminal ends it early.

pub mod prompt;

pub use prompt::{LinePrompter, PromptError, Prompter};

use crate::backend::{ConnectionBackend, ConnectionEntry};
use tracing::{debug, info};

/// Which menu variant to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Offer the Export action
    pub supports_export: bool,
    /// Pick connections from a list; otherwise the name is typed in
    pub supports_selection_lists: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            supports_export: true,
            supports_selection_lists: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Connect,
    Disconnect,
    List,
    Status,
    Add,
    Remove,
    Export,
    Exit,
}

impl Action {
    pub const ALL: [Action; 8] = [
        Action::Connect,
        Action::Disconnect,
        Action::List,
        Action::Status,
        Action::Add,
        Action::Remove,
        Action::Export,
        Action::Exit,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Action::Connect => "Connect to VPN",
            Action::Disconnect => "Disconnect from VPN",
            Action::List => "List available VPNs",
            Action::Status => "Show VPN status",
            Action::Add => "Add VPN",
            Action::Remove => "Remove VPN",
            Action::Export => "Export VPN config",
            Action::Exit => "Exit",
        }
    }

    /// Actions offered for `caps`, in menu order
    pub fn available(caps: Capabilities) -> Vec<Action> {
        Self::ALL
            .into_iter()
            .filter(|a| *a != Action::Export || caps.supports_export)
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

/// Numbered listing of VPN names, or a notice when there are none
pub fn format_vpn_list(entries: &[ConnectionEntry]) -> String {
    if entries.is_empty() {
        return "No VPN connections found".to_string();
    }

    let mut result = String::from("Available VPN connections:\n");
    for (i, entry) in entries.iter().enumerate() {
        result.push_str(&format!("{}. {}\n", i + 1, entry.name));
    }
    result
}

pub struct MenuController<B, P> {
    backend: B,
    prompter: P,
    capabilities: Capabilities,
}

impl<B: ConnectionBackend, P: Prompter> MenuController<B, P> {
    pub fn new(backend: B, prompter: P, capabilities: Capabilities) -> Self {
        Self {
            backend,
            prompter,
            capabilities,
        }
    }

    pub fn into_parts(self) -> (B, P) {
        (self.backend, self.prompter)
    }

    /// Run until Exit is chosen or the main menu is cancelled
    pub fn run(&mut self) -> Result<(), PromptError> {
        let actions = Action::available(self.capabilities);
        let labels: Vec<String> = actions.iter().map(|a| a.label().to_string()).collect();

        loop {
            let Some(index) = self.prompter.select("Choose an action", &labels)? else {
                info!("Menu cancelled, exiting");
                return Ok(());
            };
            let action = actions[index];
            debug!("Selected {:?}", action);

            if self.dispatch(action)? == Flow::Exit {
                return Ok(());
            }
        }
    }

    fn dispatch(&mut self, action: Action) -> Result<Flow, PromptError> {
        match action {
            Action::Connect => self.connect()?,
            Action::Disconnect => self.disconnect()?,
            Action::List => self.list()?,
            Action::Status => self.status()?,
            Action::Add => self.add()?,
            Action::Remove => self.remove()?,
            Action::Export => self.export()?,
            Action::Exit => return Ok(Flow::Exit),
        }
        Ok(Flow::Continue)
    }

    fn connect(&mut self) -> Result<(), PromptError> {
        let vpns = self.backend.list_vpns();
        if vpns.is_empty() {
            return self.prompter.say("No VPN connections available");
        }

        if let Some(name) = self.pick_connection("Select VPN to connect", &vpns)? {
            let result = self.backend.activate(&name);
            self.prompter.say(&result.message)?;
        }
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), PromptError> {
        let result = self.backend.deactivate_all();
        self.prompter.say(&result.message)
    }

    fn list(&mut self) -> Result<(), PromptError> {
        let vpns = self.backend.list_vpns();
        self.prompter.say(&format_vpn_list(&vpns))
    }

    fn status(&mut self) -> Result<(), PromptError> {
        self.prompter.say("VPN Status:")?;
        let result = self.backend.status();
        self.prompter.say(&result.message)
    }

    fn add(&mut self) -> Result<(), PromptError> {
        if let Some(path) = self.prompter.input("Enter path to .ovpn file", None)? {
            let result = self.backend.import_profile(&path);
            self.prompter.say(&result.message)?;
        }
        Ok(())
    }

    fn remove(&mut self) -> Result<(), PromptError> {
        let vpns = self.backend.list_vpns();
        if vpns.is_empty() {
            return self.prompter.say("No VPN connections available to remove");
        }

        let Some(name) = self.pick_connection("Select VPN to remove", &vpns)? else {
            return Ok(());
        };

        let question = format!("Are you sure you want to remove {}?", name);
        if self.prompter.confirm(&question)? == Some(true) {
            let result = self.backend.remove(&name);
            self.prompter.say(&result.message)?;
        } else {
            debug!("Removal of {} not confirmed", name);
        }
        Ok(())
    }

    fn export(&mut self) -> Result<(), PromptError> {
        let vpns = self.backend.list_vpns();
        if vpns.is_empty() {
            return self.prompter.say("No VPN connections available to export");
        }

        let Some(name) = self.pick_connection("Select VPN to export", &vpns)? else {
            return Ok(());
        };

        let hint = format!("~/{}.ovpn", name);
        if let Some(destination) = self
            .prompter
            .input("Enter export path (leave empty for default)", Some(hint.as_str()))?
        {
            let result = self.backend.export(&name, &destination);
            self.prompter.say(&result.message)?;
        }
        Ok(())
    }

    /// Choose a connection from `vpns`, or type its name when lists are disabled
    fn pick_connection(
        &mut self,
        title: &str,
        vpns: &[ConnectionEntry],
    ) -> Result<Option<String>, PromptError> {
        if !self.capabilities.supports_selection_lists {
            let name = self.prompter.input("Enter VPN name", None)?;
            return Ok(name.filter(|n| !n.is_empty()));
        }

        let names: Vec<String> = vpns.iter().map(|e| e.name.clone()).collect();
        let picked = self.prompter.select(title, &names)?;
        Ok(picked.map(|i| names[i].clone()))
    }
}
