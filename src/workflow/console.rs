use anyhow::Result;
use std::fmt::Display;
use std::io::{BufRead, Write};
use thiserror::Error;

/// Raised when the input stream ends mid-conversation.
#[derive(Debug, Error)]
#[error("console input closed")]
pub struct InputClosed;

/// Line-oriented prompt over any reader/writer pair.
///
/// Invalid answers are handled here by asking again; they never reach callers.
pub struct Console<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Console { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    pub fn say(&mut self, text: impl Display) -> Result<()> {
        writeln!(self.output, "{}", text)?;
        Ok(())
    }

    /// Prints `prompt` and returns the next line with surrounding whitespace removed.
    pub fn ask(&mut self, prompt: &str) -> Result<String> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;

        // Undecodable bytes become U+FFFD and fail validation like any other bad answer
        let mut line = Vec::new();
        if self.input.read_until(b'\n', &mut line)? == 0 {
            return Err(InputClosed.into());
        }
        Ok(String::from_utf8_lossy(&line).trim().to_string())
    }

    pub fn ask_yes_no(&mut self, prompt: &str) -> Result<bool> {
        let prompt = format!("{} (yes/no): ", prompt);
        loop {
            match self.ask(&prompt)?.to_lowercase().as_str() {
                "yes" | "y" => return Ok(true),
                "no" | "n" => return Ok(false),
                _ => self.say("Invalid input. Please enter 'yes' or 'no'.")?,
            }
        }
    }

    /// Asks until the answer is an integer between 1 and 5.
    pub fn ask_rating(&mut self, prompt: &str) -> Result<u8> {
        loop {
            match self.ask(prompt)?.parse::<i64>() {
                Ok(rating @ 1..=5) => return Ok(rating as u8),
                Ok(_) => self.say("Please enter a number between 1 and 5.")?,
                Err(_) => self.say("Invalid input. Please enter a number.")?,
            }
        }
    }
}
