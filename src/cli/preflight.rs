//! Pre-flight checks before expensive operations.
//!
//! Validates that required tools and API keys are available before starting
//! operations that would otherwise fail midway.

use crate::config::TranslationProvider;
use crate::error::{Result, TekstingError};
use crate::translation::DEEPL_API_KEY_ENV;
use std::process::Command;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Transcription needs ffmpeg and an AssemblyAI key.
    Transcribe,
    /// Translation needs the key of the chosen provider.
    Translate(TranslationProvider),
    /// Muxing needs ffmpeg.
    Mux,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation) -> Result<()> {
    match operation {
        Operation::Transcribe => {
            check_api_key(crate::transcription::API_KEY_ENV)?;
            check_tool("ffmpeg")?;
        }
        Operation::Translate(TranslationProvider::Deepl) => check_api_key(DEEPL_API_KEY_ENV)?,
        Operation::Translate(TranslationProvider::Openai) => check_api_key(crate::openai::API_KEY_ENV)?,
        Operation::Translate(TranslationProvider::None) => {}
        Operation::Mux => check_tool("ffmpeg")?,
    }
    Ok(())
}

/// Check that an API key is present in the environment.
fn check_api_key(var: &str) -> Result<()> {
    match std::env::var(var) {
        Ok(key) if !key.is_empty() => Ok(()),
        Ok(_) => Err(TekstingError::Config(format!(
            "{} is empty. Set it with: export {}='...'",
            var, var
        ))),
        Err(_) => Err(TekstingError::Config(format!(
            "{} not set. Set it with: export {}='...'",
            var, var
        ))),
    }
}

/// Check if an external tool is available.
fn check_tool(name: &str) -> Result<()> {
    match Command::new(name).arg("-version").output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(TekstingError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(TekstingError::ToolNotFound(name.to_string())),
        Err(e) => Err(TekstingError::ToolNotFound(format!("{}: {}", name, e))),
    }
}
