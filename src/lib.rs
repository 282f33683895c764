//! Teksting - translated subtitles synchronized to speech
//!
//! Takes a word-level transcript with per-word timing and speaker labels,
//! translates it segment by segment, and fits the translation back onto the
//! original timing as SRT, WebVTT or ASS subtitles.
//!
//! The name "Teksting" is Norwegian for "subtitling."
//!
//! # Architecture
//!
//! - `transcription` - Word timelines and the AssemblyAI client
//! - `segmentation` - Speaker-turn segmentation
//! - `translation` - Translator adapters (DeepL, OpenAI, identity) and retries
//! - `retiming` - Fitting translated text into a segment's time envelope
//! - `subtitle` - SRT, WebVTT and ASS emission and parsing
//! - `orchestrator` - The synchronization pipeline
//! - `report` - Warnings collected during a run
//! - `quality` - Checks for finished subtitle tracks
//! - `media` - ffmpeg helpers for audio extraction and muxing
//!
//! # Example
//!
//! ```rust,no_run
//! use teksting::config::Settings;
//! use teksting::orchestrator::Synchronizer;
//! use teksting::transcription::WordTimeline;
//! use teksting::translation::create_translator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let timeline = WordTimeline::load(std::path::Path::new("talk.json"))?;
//!
//!     let synchronizer = Synchronizer::new(&settings.sync, create_translator(&settings)?);
//!     let mut output = synchronizer.run(&timeline, None, "DE").await?;
//!
//!     let options = (&settings.output).into();
//!     for (format, bytes) in output.render(&["srt".to_string()], &options) {
//!         std::fs::write(format!("talk.{}", format.extension()), bytes)?;
//!     }
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod media;
pub mod openai;
pub mod orchestrator;
pub mod quality;
pub mod report;
pub mod retiming;
pub mod segmentation;
pub mod subtitle;
pub mod transcription;
pub mod translation;

pub use error::{Result, TekstingError};
