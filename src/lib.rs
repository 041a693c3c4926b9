//! vpn-menu - Interactive terminal menu for NetworkManager VPN profiles
//!
//! All VPN work is delegated to an external connection manager (`nmcli` by
//! default). This crate renders the menu, invokes the tool with fixed
//! argument templates, parses its terse output, and prints the results.
//!
//! # Architecture
//!
//! - `backend`: `ConnectionBackend` trait and the `nmcli` implementation
//! - `menu`: action menu, dispatch, and terminal prompts
//! - `config`: Configuration file handling (TOML)

pub mod backend;
pub mod config;
pub mod menu;

pub use backend::{ConnectionBackend, ConnectionEntry, NmcliBackend, OperationResult};
pub use config::Config;
pub use menu::{Capabilities, MenuController};
