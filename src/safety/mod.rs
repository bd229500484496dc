//! Confirmation before a destructive job.
//!
//! - Dry-run mode: skips confirmation (messages are counted, not deleted)
//! - Force flag: skips confirmation
//! - Non-TTY or JSON logging: skips the prompt
//! - Otherwise the user must type the exact confirmation word

#[cfg(test)]
mod safety_properties;

use crate::config::Config;
use crate::types::error::DcrmError;
use anyhow::{Result, anyhow};
use std::io::{BufRead, IsTerminal, Write};

/// Word the user must type to start deleting.
pub const CONFIRMATION_WORD: &str = "DELETE";

// ---------------------------------------------------------------------------
// PromptHandler trait (for testability)
// ---------------------------------------------------------------------------

/// Reads the user's confirmation.
///
/// The default implementation ([`StdioPromptHandler`]) uses stdin/stdout.
pub trait PromptHandler: Send + Sync {
    /// Describe what is about to be deleted and read one line of input.
    ///
    /// Returns the trimmed input.
    fn read_confirmation(&self, target_display: &str) -> Result<String>;

    /// Whether both stdin and stdout are connected to a TTY.
    fn is_interactive(&self) -> bool;
}

pub struct StdioPromptHandler;

impl PromptHandler for StdioPromptHandler {
    fn read_confirmation(&self, target_display: &str) -> Result<String> {
        println!("You are about to delete {target_display}.");
        println!("Deleted messages cannot be recovered.");
        print!("Type '{CONFIRMATION_WORD}' to confirm: ");
        std::io::stdout().flush()?;

        let mut input = String::new();
        std::io::stdin().lock().read_line(&mut input)?;
        Ok(input.trim().to_string())
    }

    fn is_interactive(&self) -> bool {
        std::io::stdin().is_terminal() && std::io::stdout().is_terminal()
    }
}

// ---------------------------------------------------------------------------
// SafetyChecker
// ---------------------------------------------------------------------------

pub struct SafetyChecker {
    dry_run: bool,
    force: bool,
    json_logging: bool,
    prompt_handler: Box<dyn PromptHandler>,
}

impl SafetyChecker {
    pub fn new(config: &Config) -> Self {
        Self::with_prompt_handler(config, Box::new(StdioPromptHandler))
    }

    pub fn with_prompt_handler(config: &Config, prompt_handler: Box<dyn PromptHandler>) -> Self {
        let json_logging = config
            .tracing_config
            .map(|tc| tc.json_tracing)
            .unwrap_or(false);

        Self {
            dry_run: config.dry_run,
            force: config.force,
            json_logging,
            prompt_handler,
        }
    }

    /// Returns `Err(DcrmError::Cancelled)` if the user declines.
    pub fn check_before_deletion(&self, target_display: &str) -> Result<()> {
        if self.dry_run || self.force {
            return Ok(());
        }

        // JSON output would be corrupted by the prompt.
        if self.json_logging || !self.prompt_handler.is_interactive() {
            return Ok(());
        }

        let input = self.prompt_handler.read_confirmation(target_display)?;
        if input != CONFIRMATION_WORD {
            return Err(anyhow!(DcrmError::Cancelled));
        }

        Ok(())
    }
}
