//! External process invocation
//!
//! All process spawning goes through [`CommandRunner`] so backends can be
//! exercised without a real connection manager installed.

use std::io;
use std::process::Command;
use tracing::debug;

/// Outcome of one external invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    /// Exit code, `None` if the process was killed by a signal
    pub code: Option<i32>,
    /// stdout followed by stderr
    pub text: String,
}

impl CommandOutput {
    /// Human readable exit status, e.g. `exit status 10`
    pub fn status_text(&self) -> String {
        match self.code {
            Some(code) => format!("exit status {}", code),
            None => "terminated by signal".to_string(),
        }
    }
}

pub trait CommandRunner {
    /// Run `program` with `args` to completion and capture its combined output
    fn run(&self, program: &str, args: &[&str]) -> io::Result<CommandOutput>;
}

/// Runs commands on the host with `std::process::Command`
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SystemRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[&str]) -> io::Result<CommandOutput> {
        debug!("Running {} {:?}", program, args);
        let output = Command::new(program).args(args).output()?;

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));

        debug!("{} exited with {}", program, output.status);
        Ok(CommandOutput {
            success: output.status.success(),
            code: output.status.code(),
            text,
        })
    }
}
