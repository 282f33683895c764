//! Transcription module for Teksting.
//!
//! Word-level transcript models and the AssemblyAI client that produces them.
//! Speech recognition itself happens in the hosted service; this module only
//! requests it and turns the result into a validated [`WordTimeline`].

mod assemblyai;
mod models;

pub use assemblyai::{AssemblyAiTranscriber, API_KEY_ENV};
pub use models::{
    format_ms, mean_confidence, repair_asr_words, AsrMetadata, RepairKind, Word, WordRepair, WordTimeline,
};

use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Trait for speech recognition services.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe an audio file into a word-level timeline.
    async fn transcribe(&self, audio_path: &Path) -> Result<WordTimeline>;
}
