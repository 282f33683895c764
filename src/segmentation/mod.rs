//! Speaker-turn segmentation of word timelines.
//!
//! Segments are the unit of translation: each one is translated on its own and
//! re-timed inside its own time envelope.

mod speaker;

pub use speaker::SpeakerSegmenter;

use crate::transcription::{mean_confidence, Word};
use serde::{Deserialize, Serialize};

/// A contiguous run of words attributed to one speaker turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Position of this segment in the timeline (0-based).
    pub index: usize,
    /// Start of the first word.
    pub start_ms: u64,
    /// End of the last word.
    pub end_ms: u64,
    /// Speaker shared by every word, if diarization ran.
    pub speaker_id: Option<String>,
    /// Words in this segment, in order.
    pub words: Vec<Word>,
    /// Translation assigned by the translator adapter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translated_text: Option<String>,
}

impl Segment {
    /// Build a segment from a non-empty run of words.
    pub(crate) fn from_words(index: usize, words: Vec<Word>) -> Self {
        let start_ms = words.first().map(|w| w.start_ms).unwrap_or(0);
        let end_ms = words.last().map(|w| w.end_ms).unwrap_or(start_ms);
        let speaker_id = words.first().and_then(|w| w.speaker_id.clone());

        Self {
            index,
            start_ms,
            end_ms,
            speaker_id,
            words,
            translated_text: None,
        }
    }

    /// Source-language text, words joined by single spaces.
    pub fn source_text(&self) -> String {
        self.words
            .iter()
            .map(|w| w.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Duration of this segment in milliseconds.
    pub fn duration_ms(&self) -> u64 {
        self.end_ms - self.start_ms
    }

    /// Mean word confidence.
    pub fn mean_confidence(&self) -> f32 {
        mean_confidence(&self.words).unwrap_or(0.0)
    }

    /// Return a copy with the translation set.
    pub fn with_translation(mut self, translated_text: impl Into<String>) -> Self {
        self.translated_text = Some(translated_text.into());
        self
    }
}
