//! Terminal prompts
//!
//! Every prompt returns `Ok(None)` when the user backs out, so callers can
//! skip the action. `Err` means the terminal itself is unusable.

use std::io::{self, BufRead, Write};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PromptError {
    #[error("Terminal I/O failed: {0}")]
    Io(#[from] io::Error),
}

pub trait Prompter {
    /// Pick one of `options`, returning its index
    fn select(&mut self, title: &str, options: &[String]) -> Result<Option<usize>, PromptError>;

    /// Free text; `placeholder` is shown as a hint only
    fn input(
        &mut self,
        title: &str,
        placeholder: Option<&str>,
    ) -> Result<Option<String>, PromptError>;

    fn confirm(&mut self, title: &str) -> Result<Option<bool>, PromptError>;

    /// Show a message to the user
    fn say(&mut self, text: &str) -> Result<(), PromptError>;
}

/// Line-oriented prompter over any reader/writer pair
pub struct LinePrompter<R, W> {
    input: R,
    output: W,
}

impl LinePrompter<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> LinePrompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Print `prompt` and read one line; `None` on end of input
    fn ask(&mut self, prompt: &str) -> Result<Option<String>, PromptError> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            writeln!(self.output)?;
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }
}

impl<R: BufRead, W: Write> Prompter for LinePrompter<R, W> {
    fn select(&mut self, title: &str, options: &[String]) -> Result<Option<usize>, PromptError> {
        if options.is_empty() {
            return Ok(None);
        }

        writeln!(self.output, "{}", title)?;
        for (i, option) in options.iter().enumerate() {
            writeln!(self.output, "  {}) {}", i + 1, option)?;
        }

        let prompt = format!("Select [1-{}] (q to cancel): ", options.len());
        loop {
            let Some(answer) = self.ask(&prompt)? else {
                return Ok(None);
            };
            if answer.is_empty() {
                continue;
            }
            if answer.eq_ignore_ascii_case("q") {
                return Ok(None);
            }
            match answer.parse::<usize>() {
                Ok(n) if (1..=options.len()).contains(&n) => return Ok(Some(n - 1)),
                _ => writeln!(self.output, "Invalid choice: {}", answer)?,
            }
        }
    }

    fn input(
        &mut self,
        title: &str,
        placeholder: Option<&str>,
    ) -> Result<Option<String>, PromptError> {
        let prompt = match placeholder {
            Some(hint) => format!("{} [{}]: ", title, hint),
            None => format!("{}: ", title),
        };
        self.ask(&prompt)
    }

    fn confirm(&mut self, title: &str) -> Result<Option<bool>, PromptError> {
        let prompt = format!("{} [y/N]: ", title);
        loop {
            let Some(answer) = self.ask(&prompt)? else {
                return Ok(None);
            };
            match answer.to_ascii_lowercase().as_str() {
                "y" | "yes" => return Ok(Some(true)),
                "" | "n" | "no" => return Ok(Some(false)),
                _ => writeln!(self.output, "Please answer y or n")?,
            }
        }
    }

    fn say(&mut self, text: &str) -> Result<(), PromptError> {
        writeln!(self.output, "{}", text)?;
        self.output.flush()?;
        Ok(())
    }
}
