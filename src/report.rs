//! Warning report returned alongside synchronized subtitles.
//!
//! Non-fatal conditions never abort a run. Each one is recorded here with the
//! original timing of the affected segment so callers can reconcile gaps.

use crate::segmentation::Segment;
use crate::transcription::{format_ms, AsrMetadata, WordRepair};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Original time range of a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentSpan {
    pub segment: usize,
    pub start_ms: u64,
    pub end_ms: u64,
}

impl SegmentSpan {
    pub fn of(segment: &Segment) -> Self {
        Self {
            segment: segment.index,
            start_ms: segment.start_ms,
            end_ms: segment.end_ms,
        }
    }
}

impl std::fmt::Display for SegmentSpan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "segment {} [{} - {}]",
            self.segment,
            format_ms(self.start_ms),
            format_ms(self.end_ms)
        )
    }
}

/// Broad class of a warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningCategory {
    /// Re-timing could not honour every display constraint.
    Timing,
    /// Translation failed and a segment was excluded.
    Adapter,
    /// An output format could not be produced.
    Format,
    /// Source data looks unreliable.
    Quality,
}

/// A non-fatal condition encountered during synchronization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SyncWarning {
    /// The translation was empty; an empty cue covers the segment.
    EmptyTranslation { span: SegmentSpan },
    /// The segment cannot show every cue for the minimum display time.
    SegmentTooShort { span: SegmentSpan, required_ms: u64 },
    /// The final cue exceeds the maximum display time to reach the segment end.
    DisplayTooLong { span: SegmentSpan, cue_duration_ms: u64 },
    /// A single word is longer than a subtitle line.
    OverlongWord { span: SegmentSpan, word: String },
    /// Mean ASR confidence of the segment is below the threshold.
    LowConfidence { span: SegmentSpan, confidence: f32 },
    /// ASR word timing was adjusted to remove an overlap or gap in the data.
    WordRepaired { repair: WordRepair },
    /// Translation failed on every attempt; the segment has no cues.
    SegmentExcluded {
        span: SegmentSpan,
        attempts: u32,
        reason: String,
    },
    /// A requested output format is not supported.
    UnsupportedFormat { format: String, reason: String },
}

impl SyncWarning {
    pub fn category(&self) -> WarningCategory {
        match self {
            SyncWarning::EmptyTranslation { .. }
            | SyncWarning::SegmentTooShort { .. }
            | SyncWarning::DisplayTooLong { .. }
            | SyncWarning::OverlongWord { .. } => WarningCategory::Timing,
            SyncWarning::LowConfidence { .. } | SyncWarning::WordRepaired { .. } => WarningCategory::Quality,
            SyncWarning::SegmentExcluded { .. } => WarningCategory::Adapter,
            SyncWarning::UnsupportedFormat { .. } => WarningCategory::Format,
        }
    }

    /// Segment the warning refers to, if any.
    pub fn span(&self) -> Option<SegmentSpan> {
        match self {
            SyncWarning::EmptyTranslation { span }
            | SyncWarning::SegmentTooShort { span, .. }
            | SyncWarning::DisplayTooLong { span, .. }
            | SyncWarning::OverlongWord { span, .. }
            | SyncWarning::LowConfidence { span, .. }
            | SyncWarning::SegmentExcluded { span, .. } => Some(*span),
            SyncWarning::UnsupportedFormat { .. } | SyncWarning::WordRepaired { .. } => None,
        }
    }
}

impl std::fmt::Display for SyncWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncWarning::EmptyTranslation { span } => write!(f, "{}: empty translation", span),
            SyncWarning::SegmentTooShort { span, required_ms } => write!(
                f,
                "{}: too short for its text (needs {}ms at minimum display time)",
                span, required_ms
            ),
            SyncWarning::DisplayTooLong {
                span,
                cue_duration_ms,
            } => write!(f, "{}: final cue held for {}ms", span, cue_duration_ms),
            SyncWarning::OverlongWord { span, word } => {
                write!(f, "{}: word longer than a line: {}", span, word)
            }
            SyncWarning::LowConfidence { span, confidence } => {
                write!(f, "{}: low ASR confidence {:.2}", span, confidence)
            }
            SyncWarning::SegmentExcluded {
                span,
                attempts,
                reason,
            } => write!(
                f,
                "{}: excluded after {} attempts: {}",
                span, attempts, reason
            ),
            SyncWarning::WordRepaired { repair } => write!(f, "{}", repair),
            SyncWarning::UnsupportedFormat { format, reason } => {
                write!(f, "format {}: {}", format, reason)
            }
        }
    }
}

/// Summary of one synchronization run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub source_language: Option<String>,
    pub target_language: String,
    pub segments_total: usize,
    pub segments_synced: usize,
    pub segments_excluded: usize,
    pub cue_count: usize,
    pub warnings: Vec<SyncWarning>,
    /// ASR analysis results carried through untouched.
    #[serde(default, skip_serializing_if = "AsrMetadata::is_empty")]
    pub asr_metadata: AsrMetadata,
}

impl SyncReport {
    pub fn new(source_language: Option<String>, target_language: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            source_language,
            target_language: target_language.into(),
            segments_total: 0,
            segments_synced: 0,
            segments_excluded: 0,
            cue_count: 0,
            warnings: Vec::new(),
            asr_metadata: AsrMetadata::default(),
        }
    }

    pub fn push(&mut self, warning: SyncWarning) {
        self.warnings.push(warning);
    }

    /// Warnings of one category.
    pub fn warnings_in(&self, category: WarningCategory) -> impl Iterator<Item = &SyncWarning> {
        self.warnings.iter().filter(move |w| w.category() == category)
    }

    /// Spans of segments excluded after translation failures.
    pub fn excluded_spans(&self) -> Vec<SegmentSpan> {
        self.warnings_in(WarningCategory::Adapter)
            .filter_map(SyncWarning::span)
            .collect()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}
