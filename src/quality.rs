//! Quality checks for transcripts, translations and finished cue tracks.

use crate::config::SyncSettings;
use crate::retiming::{char_len, Cue};
use crate::segmentation::Segment;
use crate::transcription::{format_ms, RepairKind, WordTimeline};
use serde::Serialize;
use std::collections::BTreeMap;

/// Translations shorter or longer than this ratio of the source are suspicious.
const MIN_LENGTH_RATIO: f64 = 0.3;
const MAX_LENGTH_RATIO: f64 = 3.0;

/// A problem found by [`QualityChecker`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QualityIssue {
    InvalidTiming { cue: usize, start_ms: u64, end_ms: u64 },
    Overlap { cue: usize, start_ms: u64, previous_end_ms: u64 },
    ReadingSpeed { cue: usize, chars_per_second: f64 },
    TooShort { cue: usize, duration_ms: u64 },
    TooLong { cue: usize, duration_ms: u64 },
    LineTooLong { cue: usize, chars: usize },
    TooManyLines { cue: usize, lines: usize },
    LowConfidence { confidence: f32 },
    WordRepaired { word: usize, repair: RepairKind },
    TranslationLength { segment: usize, ratio: f64 },
}

impl std::fmt::Display for QualityIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QualityIssue::InvalidTiming { cue, start_ms, end_ms } => write!(
                f,
                "cue {}: ends at {} before it starts at {}",
                cue,
                format_ms(*end_ms),
                format_ms(*start_ms)
            ),
            QualityIssue::Overlap { cue, start_ms, previous_end_ms } => write!(
                f,
                "cue {}: starts at {} before previous cue ends at {}",
                cue,
                format_ms(*start_ms),
                format_ms(*previous_end_ms)
            ),
            QualityIssue::ReadingSpeed { cue, chars_per_second } => {
                write!(f, "cue {}: reading speed {:.1} chars/s", cue, chars_per_second)
            }
            QualityIssue::TooShort { cue, duration_ms } => write!(f, "cue {}: shown for only {}ms", cue, duration_ms),
            QualityIssue::TooLong { cue, duration_ms } => write!(f, "cue {}: shown for {}ms", cue, duration_ms),
            QualityIssue::LineTooLong { cue, chars } => write!(f, "cue {}: line of {} chars", cue, chars),
            QualityIssue::TooManyLines { cue, lines } => write!(f, "cue {}: {} lines", cue, lines),
            QualityIssue::LowConfidence { confidence } => {
                write!(f, "transcript confidence {:.2} is low", confidence)
            }
            QualityIssue::WordRepaired { word, repair } => write!(f, "word {}: {}", word, repair),
            QualityIssue::TranslationLength { segment, ratio } => {
                write!(f, "segment {}: translation is {:.2}x the source length", segment, ratio)
            }
        }
    }
}

/// Per-speaker totals of a transcript.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeakerStats {
    pub speaker_id: Option<String>,
    pub words: usize,
    pub speaking_ms: u64,
    pub mean_confidence: f32,
}

/// Checks output against the display limits of the sync settings.
#[derive(Debug, Clone)]
pub struct QualityChecker {
    min_confidence: f32,
    max_chars_per_second: f64,
    max_chars_per_line: usize,
    min_display_ms: u64,
    max_display_ms: u64,
}

impl Default for QualityChecker {
    fn default() -> Self {
        Self::new(&SyncSettings::default())
    }
}

impl QualityChecker {
    pub fn new(settings: &SyncSettings) -> Self {
        Self {
            min_confidence: settings.min_confidence,
            max_chars_per_second: settings.max_chars_per_second,
            max_chars_per_line: settings.max_chars_per_line,
            min_display_ms: settings.min_display_ms,
            max_display_ms: settings.max_display_ms,
        }
    }

    /// Check a cue track in display order.
    ///
    /// Empty cues are only checked for timing.
    pub fn check_cues(&self, cues: &[Cue]) -> Vec<QualityIssue> {
        let mut issues = Vec::new();
        let mut previous_end = None;

        for cue in cues {
            let n = cue.index;
            if cue.end_ms <= cue.start_ms {
                issues.push(QualityIssue::InvalidTiming {
                    cue: n,
                    start_ms: cue.start_ms,
                    end_ms: cue.end_ms,
                });
                previous_end = Some(cue.end_ms);
                continue;
            }
            if let Some(previous_end_ms) = previous_end.filter(|&end| cue.start_ms < end) {
                issues.push(QualityIssue::Overlap {
                    cue: n,
                    start_ms: cue.start_ms,
                    previous_end_ms,
                });
            }
            previous_end = Some(cue.end_ms);

            if cue.lines.is_empty() {
                continue;
            }

            let duration_ms = cue.duration_ms();
            if duration_ms < self.min_display_ms {
                issues.push(QualityIssue::TooShort { cue: n, duration_ms });
            } else if duration_ms > self.max_display_ms {
                issues.push(QualityIssue::TooLong { cue: n, duration_ms });
            }

            let chars_per_second = cue.char_count() as f64 * 1000.0 / duration_ms as f64;
            if chars_per_second > self.max_chars_per_second {
                issues.push(QualityIssue::ReadingSpeed { cue: n, chars_per_second });
            }

            if cue.lines.len() > 2 {
                issues.push(QualityIssue::TooManyLines {
                    cue: n,
                    lines: cue.lines.len(),
                });
            }
            // A single word on its own line is allowed to overflow.
            for line in &cue.lines {
                let chars = char_len(line);
                if chars > self.max_chars_per_line && line.contains(' ') {
                    issues.push(QualityIssue::LineTooLong { cue: n, chars });
                }
            }
        }

        issues
    }

    /// Check overall ASR confidence of a transcript and list repaired words.
    pub fn check_timeline(&self, timeline: &WordTimeline) -> Vec<QualityIssue> {
        let mut issues = Vec::new();
        if let Some(confidence) = timeline.mean_confidence().filter(|&c| c < self.min_confidence) {
            issues.push(QualityIssue::LowConfidence { confidence });
        }
        issues.extend(timeline.repairs().iter().map(|r| QualityIssue::WordRepaired {
            word: r.index,
            repair: r.kind,
        }));
        issues
    }

    /// Flag translations whose length is far from the source text.
    pub fn check_translations(&self, segments: &[Segment]) -> Vec<QualityIssue> {
        segments
            .iter()
            .filter_map(|segment| {
                let translated = segment.translated_text.as_deref()?;
                let source_len = char_len(&segment.source_text());
                if source_len == 0 || translated.trim().is_empty() {
                    return None;
                }
                let ratio = char_len(translated) as f64 / source_len as f64;
                (!(MIN_LENGTH_RATIO..=MAX_LENGTH_RATIO).contains(&ratio)).then_some(QualityIssue::TranslationLength {
                    segment: segment.index,
                    ratio,
                })
            })
            .collect()
    }
}

/// Totals per speaker, ordered by speaker id (unlabelled first).
pub fn speaker_stats(timeline: &WordTimeline) -> Vec<SpeakerStats> {
    let mut totals: BTreeMap<Option<&str>, (usize, u64, f64)> = BTreeMap::new();
    for word in timeline.words() {
        let entry = totals.entry(word.speaker_id.as_deref()).or_default();
        entry.0 += 1;
        entry.1 += word.duration_ms();
        entry.2 += word.confidence as f64;
    }

    totals
        .into_iter()
        .map(|(speaker_id, (words, speaking_ms, confidence_sum))| SpeakerStats {
            speaker_id: speaker_id.map(str::to_string),
            words,
            speaking_ms,
            mean_confidence: (confidence_sum / words as f64) as f32,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcription::Word;

    fn cue(index: usize, start_ms: u64, end_ms: u64, text: &str) -> Cue {
        Cue {
            index,
            start_ms,
            end_ms,
            lines: vec![text.to_string()],
            speaker_id: None,
        }
    }

    #[test]
    fn test_clean_track_has_no_issues() {
        let cues = vec![cue(1, 0, 2000, "Hello there."), cue(2, 2100, 4000, "General Kenobi.")];
        assert!(QualityChecker::default().check_cues(&cues).is_empty());
    }

    #[test]
    fn test_detects_timing_problems() {
        let cues = vec![
            cue(1, 0, 1000, "This line is read far too quickly by anyone"),
            cue(2, 900, 1500, "short"),
            cue(3, 2000, 2000, "zero"),
            cue(4, 3000, 12000, "long"),
        ];
        let issues = QualityChecker::default().check_cues(&cues);

        assert!(issues.contains(&QualityIssue::Overlap {
            cue: 2,
            start_ms: 900,
            previous_end_ms: 1000
        }));
        assert!(issues.contains(&QualityIssue::TooShort { cue: 2, duration_ms: 600 }));
        assert!(issues.iter().any(|i| matches!(i, QualityIssue::ReadingSpeed { cue: 1, .. })));
        assert!(issues.iter().any(|i| matches!(i, QualityIssue::InvalidTiming { cue: 3, .. })));
        assert!(issues.contains(&QualityIssue::TooLong { cue: 4, duration_ms: 9000 }));
    }

    #[test]
    fn test_line_length_allows_single_long_word() {
        let mut settings = SyncSettings::default();
        settings.max_chars_per_line = 10;
        let checker = QualityChecker::new(&settings);

        let cues = vec![cue(1, 0, 5000, "Donaudampfschiff"), cue(2, 5100, 9000, "two words here")];
        let issues = checker.check_cues(&cues);
        assert_eq!(issues, vec![QualityIssue::LineTooLong { cue: 2, chars: 14 }]);
    }

    #[test]
    fn test_timeline_confidence_and_speakers() {
        let timeline = WordTimeline::new(vec![
            Word::new("one", 0, 500, 0.5).with_speaker("A"),
            Word::new("two", 500, 1500, 0.6).with_speaker("B"),
            Word::new("three", 1500, 2000, 0.7).with_speaker("A"),
        ])
        .unwrap();

        let issues = QualityChecker::default().check_timeline(&timeline);
        assert!(matches!(issues[..], [QualityIssue::LowConfidence { .. }]));

        let stats = speaker_stats(&timeline);
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].speaker_id.as_deref(), Some("A"));
        assert_eq!((stats[0].words, stats[0].speaking_ms), (2, 1000));
        assert!((stats[0].mean_confidence - 0.6).abs() < 1e-6);
        assert_eq!(stats[1].speaking_ms, 1000);
    }

    #[test]
    fn test_timeline_repairs_listed() {
        let json = r#"{"words": [
            {"text": "a", "start": 0, "end": 300, "confidence": 0.95},
            {"text": "b", "start": 290, "end": 600, "confidence": 0.95}
        ]}"#;
        let timeline = WordTimeline::from_json(json).unwrap();
        assert_eq!(
            QualityChecker::default().check_timeline(&timeline),
            vec![QualityIssue::WordRepaired {
                word: 1,
                repair: RepairKind::Clamped
            }]
        );
    }

    #[test]
    fn test_translation_length_ratio() {
        let words = vec![Word::new("a", 0, 100, 0.9), Word::new("sentence", 100, 900, 0.9)];
        let segment = Segment {
            index: 0,
            start_ms: 0,
            end_ms: 900,
            speaker_id: None,
            words,
            translated_text: None,
        };
        let fine = segment.clone().with_translation("ein Satz");
        let bloated = segment.with_translation("eine sehr viel zu lange Übersetzung dieses Satzes");

        let checker = QualityChecker::default();
        assert!(checker.check_translations(&[fine]).is_empty());
        assert!(matches!(
            checker.check_translations(&[bloated])[..],
            [QualityIssue::TranslationLength { segment: 0, .. }]
        ));
    }
}
