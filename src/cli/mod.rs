//! CLI module for Teksting.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Teksting - Translated subtitles synchronized to speech
///
/// Turns word-level transcripts into translated, correctly timed SRT, WebVTT
/// and ASS subtitles. The name "Teksting" is Norwegian for "subtitling."
#[derive(Parser, Debug)]
#[command(name = "teksting")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check system requirements and configuration
    Doctor,

    /// Translate a transcript and write synchronized subtitles
    Sync {
        /// Transcript JSON (AssemblyAI or teksting format), or an audio/video file to transcribe first
        input: PathBuf,

        /// Target language (defaults to translation.target_language)
        #[arg(short, long)]
        to: Option<String>,

        /// Source language (defaults to the detected language)
        #[arg(long)]
        from: Option<String>,

        /// Output formats, comma separated (srt, vtt, ass)
        #[arg(short, long, value_delimiter = ',')]
        format: Vec<String>,

        /// Output path without extension (defaults to the input name)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Translation provider (deepl, openai, none)
        #[arg(long)]
        provider: Option<String>,

        /// Also store the full result as JSON for `teksting render`
        #[arg(long)]
        save: bool,
    },

    /// Transcribe audio or video into a word timeline JSON file
    Transcribe {
        /// Audio or video file
        input: PathBuf,

        /// Output JSON file (defaults to <input>.words.json)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Spoken language code, or "auto"
        #[arg(short, long)]
        language: Option<String>,
    },

    /// Render a stored sync result in other formats
    Render {
        /// Result JSON written by `teksting sync --save`
        result: PathBuf,

        /// Output formats, comma separated (srt, vtt, ass)
        #[arg(short, long, value_delimiter = ',', required = true)]
        format: Vec<String>,

        /// Output path without extension
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Add subtitles to a video
    Mux {
        /// Video file
        video: PathBuf,

        /// Subtitle file (srt, vtt or ass)
        subtitles: PathBuf,

        /// Output video file
        #[arg(short, long)]
        output: PathBuf,

        /// soft (selectable stream) or burn (drawn into the picture)
        #[arg(short, long, default_value = "soft")]
        mode: String,
    },

    /// Check a subtitle file or transcript for quality problems
    Check {
        /// Subtitle file or transcript JSON
        input: PathBuf,
    },

    /// Start HTTP API server for integration with other systems
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "sync.max_chars_per_line")
        key: String,
        /// Configuration value
        value: String,
    },

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}
