//! Interactive prompts and progress rendering
//!
//! Commands fall back to prompting for any value not given on the command
//! line. End of input is treated as an empty answer, so piping a file into
//! the binary never blocks.

pub mod progress;

use anyhow::Result;
use std::io::{self, BufRead, StdinLock, Stdout, Write};

pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl Prompter<StdinLock<'static>, Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Print `prompt` and read one trimmed line; `None` at end of input
    pub fn ask(&mut self, prompt: &str) -> Result<Option<String>> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            writeln!(self.output)?;
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// Like [`Prompter::ask`] but an empty answer (or EOF) yields `default`
    pub fn ask_or(&mut self, prompt: &str, default: &str) -> Result<String> {
        Ok(self
            .ask(prompt)?
            .filter(|answer| !answer.is_empty())
            .unwrap_or_else(|| default.to_string()))
    }

    /// Yes only for `y`/`yes`, case-insensitive
    pub fn confirm(&mut self, prompt: &str) -> Result<bool> {
        Ok(matches!(
            self.ask(prompt)?.map(|a| a.to_lowercase()).as_deref(),
            Some("y") | Some("yes")
        ))
    }

    /// Read lines until a blank line or end of input
    pub fn read_block(&mut self, prompt: &str) -> Result<String> {
        writeln!(self.output, "{}", prompt)?;
        self.output.flush()?;
        let mut content = String::new();
        let mut line = String::new();
        loop {
            line.clear();
            if self.input.read_line(&mut line)? == 0 || line.trim().is_empty() {
                break;
            }
            content.push_str(line.trim_end());
            content.push('\n');
        }
        Ok(content)
    }
}
