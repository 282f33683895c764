//! Data models for word-level transcripts.

use crate::error::{Result, TekstingError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

/// Overlaps up to this length are resolved by moving the later word's start.
const SMALL_OVERLAP_MS: u64 = 50;
/// Length given to words reported without a duration.
const MIN_WORD_MS: u64 = 10;

// ============================================================================
// Words
// ============================================================================

/// A single recognised word with millisecond timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    /// The word text, punctuation attached.
    pub text: String,
    /// Start time in milliseconds.
    pub start_ms: u64,
    /// End time in milliseconds.
    pub end_ms: u64,
    /// Recognition confidence in [0, 1].
    pub confidence: f32,
    /// Speaker label from diarization, if enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker_id: Option<String>,
}

impl Word {
    /// Create a new word without a speaker label.
    pub fn new(text: impl Into<String>, start_ms: u64, end_ms: u64, confidence: f32) -> Self {
        Self {
            text: text.into(),
            start_ms,
            end_ms,
            confidence,
            speaker_id: None,
        }
    }

    /// Attach a speaker label.
    pub fn with_speaker(mut self, speaker_id: impl Into<String>) -> Self {
        self.speaker_id = Some(speaker_id.into());
        self
    }

    /// Duration of this word in milliseconds.
    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }
}

// ============================================================================
// Pass-through metadata
// ============================================================================

/// Transcript-level analysis results from the ASR service.
///
/// Synchronization never reads these; they are carried unmodified into the
/// sync output for downstream reporting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AsrMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlights: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entities: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapters: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_safety: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iab_categories: Option<Value>,
}

impl AsrMetadata {
    /// True if no analysis results are present.
    pub fn is_empty(&self) -> bool {
        self.highlights.is_none()
            && self.sentiment.is_none()
            && self.entities.is_none()
            && self.chapters.is_none()
            && self.content_safety.is_none()
            && self.iab_categories.is_none()
    }
}

// ============================================================================
// ASR word repair
// ============================================================================

/// How a recognised word's timing was changed before validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairKind {
    /// Start moved to the end of the previous word.
    Clamped,
    /// Overlap shared with the previous word.
    Split,
    /// Missing duration filled in.
    Extended,
    /// Blank word removed.
    Dropped,
}

impl std::fmt::Display for RepairKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            RepairKind::Clamped => "start moved after the previous word",
            RepairKind::Split => "overlap shared with the previous word",
            RepairKind::Extended => "zero-length word extended",
            RepairKind::Dropped => "blank word dropped",
        };
        f.write_str(text)
    }
}

/// One change made to ASR output, with the timing as reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordRepair {
    /// Position in the ASR word list.
    pub index: usize,
    pub text: String,
    pub kind: RepairKind,
    pub start_ms: u64,
    pub end_ms: u64,
}

impl std::fmt::Display for WordRepair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "word {} ({:?}) at {}: {}",
            self.index,
            self.text,
            format_ms(self.start_ms),
            self.kind
        )
    }
}

/// Remove overlaps and empty spans from ASR words.
///
/// Small overlaps move the later word's start; larger ones are split at their
/// midpoint while the previous word keeps at least 1ms. Words that end up
/// without a duration are extended to 10ms.
pub fn repair_asr_words(words: Vec<Word>) -> (Vec<Word>, Vec<WordRepair>) {
    let mut fixed: Vec<Word> = Vec::with_capacity(words.len());
    let mut repairs = Vec::new();

    for (index, mut word) in words.into_iter().enumerate() {
        let (start_ms, end_ms) = (word.start_ms, word.end_ms);
        let record = |repairs: &mut Vec<WordRepair>, word: &Word, kind| {
            repairs.push(WordRepair {
                index,
                text: word.text.clone(),
                kind,
                start_ms,
                end_ms,
            })
        };

        if word.text.trim().is_empty() {
            record(&mut repairs, &word, RepairKind::Dropped);
            continue;
        }

        let mut extended = false;
        if word.end_ms <= word.start_ms {
            record(&mut repairs, &word, RepairKind::Extended);
            extended = true;
        }

        if let Some(prev) = fixed.last_mut() {
            if word.start_ms < prev.end_ms {
                let overlap = prev.end_ms - word.start_ms;
                let mid = word.start_ms + overlap / 2;
                if overlap > SMALL_OVERLAP_MS && mid > prev.start_ms {
                    record(&mut repairs, &word, RepairKind::Split);
                    prev.end_ms = mid;
                } else {
                    record(&mut repairs, &word, RepairKind::Clamped);
                }
                word.start_ms = prev.end_ms;
            }
        }

        if word.end_ms <= word.start_ms {
            if !extended {
                record(&mut repairs, &word, RepairKind::Extended);
            }
            word.end_ms = word.start_ms + MIN_WORD_MS;
        }
        fixed.push(word);
    }

    for repair in &repairs {
        debug!("Repaired {}", repair);
    }
    if !repairs.is_empty() {
        info!("Repaired timing of {} ASR words", repairs.len());
    }
    (fixed, repairs)
}

// ============================================================================
// Word timeline
// ============================================================================

/// Serialized shape of a timeline, validated on the way in.
#[derive(Deserialize)]
struct TimelineData {
    words: Vec<Word>,
    #[serde(default)]
    language_code: Option<String>,
    #[serde(default)]
    metadata: AsrMetadata,
    #[serde(default)]
    repairs: Vec<WordRepair>,
}

/// Immutable, validated, time-ordered sequence of recognised words.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TimelineData")]
pub struct WordTimeline {
    words: Vec<Word>,
    #[serde(skip_serializing_if = "Option::is_none")]
    language_code: Option<String>,
    #[serde(skip_serializing_if = "AsrMetadata::is_empty")]
    metadata: AsrMetadata,
    /// Changes made to ASR words before validation.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    repairs: Vec<WordRepair>,
}

impl TryFrom<TimelineData> for WordTimeline {
    type Error = TekstingError;

    fn try_from(data: TimelineData) -> Result<Self> {
        Ok(WordTimeline::new(data.words)?
            .with_language(data.language_code)
            .with_metadata(data.metadata)
            .with_repairs(data.repairs))
    }
}

impl WordTimeline {
    /// Create a timeline, validating every word and their ordering.
    ///
    /// Overlapping or malformed words are rejected; ASR output is repaired
    /// before it gets here. An empty word list is valid here; callers that
    /// need words reject it.
    pub fn new(words: Vec<Word>) -> Result<Self> {
        let mut prev_end: Option<u64> = None;

        for (i, word) in words.iter().enumerate() {
            if word.text.trim().is_empty() {
                return Err(TekstingError::Input(format!("word {} has empty text", i)));
            }
            if word.end_ms <= word.start_ms {
                return Err(TekstingError::Input(format!(
                    "word {} ({:?}) ends at {}ms, not after its start {}ms",
                    i, word.text, word.end_ms, word.start_ms
                )));
            }
            if !(0.0..=1.0).contains(&word.confidence) {
                return Err(TekstingError::Input(format!(
                    "word {} ({:?}) has confidence {} outside [0, 1]",
                    i, word.text, word.confidence
                )));
            }
            if let Some(prev_end) = prev_end {
                if word.start_ms < prev_end {
                    return Err(TekstingError::Input(format!(
                        "word {} ({:?}) starts at {}ms, before the previous word ends at {}ms",
                        i, word.text, word.start_ms, prev_end
                    )));
                }
            }
            prev_end = Some(word.end_ms);
        }

        Ok(Self {
            words,
            language_code: None,
            metadata: AsrMetadata::default(),
            repairs: Vec::new(),
        })
    }

    /// Set the detected or requested source language.
    pub fn with_language(mut self, language_code: Option<String>) -> Self {
        self.language_code = language_code;
        self
    }

    /// Attach pass-through ASR metadata.
    pub fn with_metadata(mut self, metadata: AsrMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    fn with_repairs(mut self, repairs: Vec<WordRepair>) -> Self {
        self.repairs = repairs;
        self
    }

    pub fn words(&self) -> &[Word] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn language_code(&self) -> Option<&str> {
        self.language_code.as_deref()
    }

    pub fn metadata(&self) -> &AsrMetadata {
        &self.metadata
    }

    /// Timing repairs applied to the ASR words this timeline came from.
    pub fn repairs(&self) -> &[WordRepair] {
        &self.repairs
    }

    /// End of the last word, or 0 for an empty timeline.
    pub fn duration_ms(&self) -> u64 {
        self.words.last().map(|w| w.end_ms).unwrap_or(0)
    }

    /// Full text (words joined by single spaces).
    pub fn full_text(&self) -> String {
        self.words
            .iter()
            .map(|w| w.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Mean word confidence, or None for an empty timeline.
    pub fn mean_confidence(&self) -> Option<f32> {
        mean_confidence(&self.words)
    }

    /// Parse a timeline from JSON.
    ///
    /// Accepts both the native serialized form (`start_ms`/`end_ms` fields)
    /// and a completed AssemblyAI transcript (`start`/`end` in milliseconds).
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Parse a timeline from an already-decoded JSON value.
    pub fn from_value(value: Value) -> Result<Self> {
        let native = value
            .get("words")
            .and_then(|w| w.as_array())
            .and_then(|w| w.first())
            .map(|w| w.get("start_ms").is_some())
            .unwrap_or(false);

        if native {
            Ok(serde_json::from_value(value)?)
        } else {
            from_assemblyai(value)
        }
    }

    /// Load a timeline from a JSON file.
    pub fn load(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }
}

/// Mean confidence of a word slice.
pub fn mean_confidence(words: &[Word]) -> Option<f32> {
    if words.is_empty() {
        return None;
    }
    Some(words.iter().map(|w| w.confidence).sum::<f32>() / words.len() as f32)
}

// ============================================================================
// AssemblyAI transcript parsing
// ============================================================================

#[derive(Deserialize)]
struct AssemblyAiWord {
    text: String,
    start: u64,
    end: u64,
    #[serde(default)]
    confidence: f32,
    #[serde(default)]
    speaker: Option<String>,
}

#[derive(Deserialize)]
struct AssemblyAiTranscript {
    #[serde(default)]
    words: Option<Vec<AssemblyAiWord>>,
    #[serde(default)]
    language_code: Option<String>,
    #[serde(default)]
    auto_highlights_result: Option<Value>,
    #[serde(default)]
    sentiment_analysis_results: Option<Value>,
    #[serde(default)]
    entities: Option<Value>,
    #[serde(default)]
    chapters: Option<Value>,
    #[serde(default)]
    content_safety_labels: Option<Value>,
    #[serde(default)]
    iab_categories_result: Option<Value>,
}

fn non_null(value: Option<Value>) -> Option<Value> {
    value.filter(|v| !v.is_null())
}

fn from_assemblyai(value: Value) -> Result<WordTimeline> {
    let transcript: AssemblyAiTranscript = serde_json::from_value(value)
        .map_err(|e| TekstingError::Input(format!("unrecognised transcript JSON: {}", e)))?;

    let words: Vec<Word> = transcript
        .words
        .ok_or_else(|| TekstingError::Input("transcript has no word-level timestamps".into()))?
        .into_iter()
        .map(|w| Word {
            text: w.text,
            start_ms: w.start,
            end_ms: w.end,
            confidence: w.confidence,
            speaker_id: w.speaker,
        })
        .collect();

    let metadata = AsrMetadata {
        highlights: non_null(transcript.auto_highlights_result),
        sentiment: non_null(transcript.sentiment_analysis_results),
        entities: non_null(transcript.entities),
        chapters: non_null(transcript.chapters),
        content_safety: non_null(transcript.content_safety_labels),
        iab_categories: non_null(transcript.iab_categories_result),
    };

    let (words, repairs) = repair_asr_words(words);

    Ok(WordTimeline::new(words)?
        .with_language(transcript.language_code)
        .with_metadata(metadata)
        .with_repairs(repairs))
}

/// Format milliseconds as MM:SS.mmm or HH:MM:SS.mmm for log and report output.
pub fn format_ms(ms: u64) -> String {
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let secs = (ms % 60_000) / 1000;
    let millis = ms % 1000;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, secs, millis)
    } else {
        format!("{:02}:{:02}.{:03}", minutes, secs, millis)
    }
}
