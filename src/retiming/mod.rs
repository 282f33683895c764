//! Cue re-timing: fitting translated text into a segment's original timing.
//!
//! Translations carry no timing of their own and rarely match the source in
//! length. The re-timer splits a segment's translation into cues that respect
//! line and cue length limits, then shares the segment's fixed time budget
//! between them by character count. Time is never taken from outside
//! `[segment.start_ms, segment.end_ms]`.

mod allocation;
mod partition;
mod wrap;

pub use allocation::{allocate, Allocation};
pub use partition::{char_len, joined_len, partition, tokenize};
pub use wrap::{wrap, Wrapped};

use crate::config::SyncSettings;
use crate::report::{SegmentSpan, SyncWarning};
use crate::segmentation::Segment;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Part of a cue's allotted time given up as the gap before it.
///
/// The gap never takes more than half the cue, so a cue always keeps at
/// least half its allocation and never less than 1ms.
pub fn gap_within(duration_ms: u64, gap_ms: u64) -> u64 {
    gap_ms.min(duration_ms / 2)
}

/// One displayed subtitle unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cue {
    /// 1-based position in the output.
    pub index: usize,
    pub start_ms: u64,
    pub end_ms: u64,
    /// At most two lines; empty for an empty translation.
    pub lines: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker_id: Option<String>,
}

impl Cue {
    pub fn duration_ms(&self) -> u64 {
        self.end_ms - self.start_ms
    }

    /// Lines joined with newlines.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// Visible characters across all lines.
    pub fn char_count(&self) -> usize {
        self.lines.iter().map(|l| char_len(l)).sum()
    }
}

/// Limits applied while re-timing.
#[derive(Debug, Clone, PartialEq)]
pub struct RetimeConfig {
    pub max_chars_per_line: usize,
    pub max_chars_per_cue: usize,
    pub min_display_ms: u64,
    pub max_display_ms: u64,
    pub inter_cue_gap_ms: u64,
}

impl Default for RetimeConfig {
    fn default() -> Self {
        Self::from(&SyncSettings::default())
    }
}

impl From<&SyncSettings> for RetimeConfig {
    fn from(settings: &SyncSettings) -> Self {
        Self {
            max_chars_per_line: settings.max_chars_per_line,
            max_chars_per_cue: settings.max_chars_per_cue,
            min_display_ms: settings.min_display_ms,
            max_display_ms: settings.max_display_ms,
            inter_cue_gap_ms: settings.inter_cue_gap_ms,
        }
    }
}

/// Cues for one segment plus the timing warnings raised while building them.
#[derive(Debug, Clone, PartialEq)]
pub struct RetimeOutput {
    pub cues: Vec<Cue>,
    pub warnings: Vec<SyncWarning>,
}

/// Maps translated text onto a segment's timing envelope.
#[derive(Debug, Clone, Default)]
pub struct CueRetimer {
    config: RetimeConfig,
}

impl CueRetimer {
    pub fn new(config: RetimeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RetimeConfig {
        &self.config
    }

    /// Re-time a segment using its assigned translation.
    pub fn retime_segment(&self, segment: &Segment) -> RetimeOutput {
        let text = segment.translated_text.as_deref().unwrap_or("");
        self.retime(segment, text)
    }

    /// Build cues covering `[segment.start_ms, segment.end_ms]` for `translated_text`.
    ///
    /// Deterministic: the same segment, text and configuration always produce
    /// identical cues.
    pub fn retime(&self, segment: &Segment, translated_text: &str) -> RetimeOutput {
        let span = SegmentSpan::of(segment);
        let tokens = tokenize(translated_text);

        if tokens.is_empty() {
            return RetimeOutput {
                cues: vec![Cue {
                    index: 1,
                    start_ms: segment.start_ms,
                    end_ms: segment.end_ms,
                    lines: Vec::new(),
                    speaker_id: segment.speaker_id.clone(),
                }],
                warnings: vec![SyncWarning::EmptyTranslation { span }],
            };
        }

        let budget = segment.duration_ms();
        let chunks = self.chunk(&tokens, budget);
        let weights: Vec<usize> = chunks.iter().map(|c| c.chars).collect();
        let allocation = allocate(
            budget,
            &weights,
            self.config.min_display_ms,
            self.config.max_display_ms,
        );

        let mut warnings = Vec::new();
        let n = chunks.len() as u64;
        let required_ms = n * self.config.min_display_ms + (n - 1) * self.config.inter_cue_gap_ms;
        if required_ms > budget {
            warnings.push(SyncWarning::SegmentTooShort { span, required_ms });
        }
        if allocation.stretched {
            warnings.push(SyncWarning::DisplayTooLong {
                span,
                cue_duration_ms: allocation.duration(chunks.len() - 1),
            });
        }
        for token in &tokens {
            if char_len(token) > self.config.max_chars_per_line {
                warnings.push(SyncWarning::OverlongWord {
                    span,
                    word: token.to_string(),
                });
            }
        }

        let mut cues = Vec::with_capacity(chunks.len());
        let mut prev_boundary = 0;
        for (i, (chunk, &boundary)) in chunks.into_iter().zip(&allocation.boundaries).enumerate() {
            let duration = boundary - prev_boundary;
            let gap = if i == 0 {
                0
            } else {
                gap_within(duration, self.config.inter_cue_gap_ms)
            };

            cues.push(Cue {
                index: i + 1,
                start_ms: segment.start_ms + prev_boundary + gap,
                end_ms: segment.start_ms + boundary,
                lines: chunk.lines,
                speaker_id: segment.speaker_id.clone(),
            });
            prev_boundary = boundary;
        }

        debug!(
            "Re-timed segment {} ({}ms, {} chars) into {} cues",
            segment.index,
            budget,
            joined_len(&tokens),
            cues.len()
        );

        RetimeOutput { cues, warnings }
    }

    /// Split tokens into the fewest balanced chunks that each fit a cue.
    fn chunk(&self, tokens: &[&str], budget_ms: u64) -> Vec<Chunk> {
        let total = joined_len(tokens);
        // Every cue needs at least 1ms.
        let max_count = tokens.len().min(budget_ms.max(1) as usize);
        let mut count = total
            .div_ceil(self.config.max_chars_per_cue.max(1))
            .clamp(1, max_count);

        loop {
            let chunks: Vec<Chunk> = partition(tokens, count)
                .into_iter()
                .map(|range| {
                    let part = &tokens[range];
                    let wrapped = wrap(part, self.config.max_chars_per_line);
                    let chars = joined_len(part);
                    let fits = part.len() == 1
                        || (wrapped.fits && chars <= self.config.max_chars_per_cue);
                    Chunk {
                        lines: wrapped.lines,
                        chars,
                        fits,
                    }
                })
                .collect();

            if count >= max_count || chunks.iter().all(|c| c.fits) {
                return chunks;
            }
            count += 1;
        }
    }
}

/// A run of tokens destined for one cue.
struct Chunk {
    lines: Vec<String>,
    chars: usize,
    fits: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcription::Word;

    fn segment(start_ms: u64, end_ms: u64) -> Segment {
        Segment::from_words(0, vec![Word::new("source", start_ms, end_ms, 0.95)])
    }

    fn retimer(gap: u64) -> CueRetimer {
        CueRetimer::new(RetimeConfig {
            inter_cue_gap_ms: gap,
            ..Default::default()
        })
    }

    /// 150 characters: 24 five-letter words and one six-letter word.
    fn text_150() -> String {
        let mut words = vec!["abcde"; 25];
        words[24] = "abcdef";
        words.join(" ")
    }

    fn assert_covers(cues: &[Cue], start: u64, end: u64, gap: u64) {
        assert_eq!(cues.first().unwrap().start_ms, start);
        assert_eq!(cues.last().unwrap().end_ms, end);
        for pair in cues.windows(2) {
            assert!(pair[1].start_ms >= pair[0].end_ms);
            assert!(pair[1].start_ms - pair[0].end_ms <= gap);
        }
        for cue in cues {
            assert!(cue.start_ms < cue.end_ms);
        }
    }

    #[test]
    fn test_short_translation_single_cue() {
        let out = retimer(100).retime(&segment(0, 4000), "Hello world this is a test");

        assert!(out.warnings.is_empty());
        assert_eq!(
            out.cues,
            vec![Cue {
                index: 1,
                start_ms: 0,
                end_ms: 4000,
                lines: vec!["Hello world this is a test".to_string()],
                speaker_id: None,
            }]
        );
    }

    #[test]
    fn test_150_chars_two_proportional_cues() {
        let text = text_150();
        assert_eq!(text.chars().count(), 150);

        let out = retimer(0).retime(&segment(0, 10_000), &text);
        assert_eq!(out.cues.len(), 2);
        assert!(out.warnings.is_empty());

        let chars: Vec<usize> = out.cues.iter().map(|c| c.lines.join(" ").chars().count()).collect();
        let total_chars: usize = chars.iter().sum();
        let durations: Vec<u64> = out.cues.iter().map(Cue::duration_ms).collect();
        assert_eq!(durations.iter().sum::<u64>(), 10_000);

        for (duration, c) in durations.iter().zip(&chars) {
            let expected = 10_000.0 * *c as f64 / total_chars as f64;
            assert!((*duration as f64 - expected).abs() <= 1.0);
        }
        assert_covers(&out.cues, 0, 10_000, 0);
    }

    #[test]
    fn test_empty_translation() {
        let out = retimer(100).retime(&segment(500, 2500), "   ");

        assert_eq!(out.cues.len(), 1);
        assert!(out.cues[0].lines.is_empty());
        assert_eq!((out.cues[0].start_ms, out.cues[0].end_ms), (500, 2500));
        assert_eq!(out.warnings.len(), 1);
        assert!(matches!(out.warnings[0], SyncWarning::EmptyTranslation { .. }));
    }

    #[test]
    fn test_short_segment_keeps_true_length() {
        let out = retimer(100).retime(&segment(1000, 1300), "Ja.");

        assert_eq!(out.cues.len(), 1);
        assert_eq!((out.cues[0].start_ms, out.cues[0].end_ms), (1000, 1300));
        assert!(matches!(out.warnings[0], SyncWarning::SegmentTooShort { required_ms: 800, .. }));
    }

    #[test]
    fn test_gap_taken_from_later_cue() {
        let text = text_150();
        let out = retimer(100).retime(&segment(0, 10_000), &text);

        assert_eq!(out.cues.len(), 2);
        assert_eq!(out.cues[1].start_ms, out.cues[0].end_ms + 100);
        assert_covers(&out.cues, 0, 10_000, 100);
    }

    #[test]
    fn test_gap_never_starves_short_cues() {
        let text = "abcdefghij ".repeat(20);
        let out = retimer(100).retime(&segment(1000, 1300), &text);

        assert!(out.cues.len() > 1);
        for cue in &out.cues {
            assert!(cue.duration_ms() >= 30, "cue {:?} is too short", cue);
        }
        assert_covers(&out.cues, 1000, 1300, 100);
        let n = out.cues.len() as u64;
        assert!(out.warnings.iter().any(|w| matches!(
            w,
            SyncWarning::SegmentTooShort { required_ms, .. } if *required_ms == n * 800 + (n - 1) * 100
        )));
    }

    #[test]
    fn test_lines_respect_limit() {
        let text = "Meine Damen und Herren, heute sprechen wir über die Zukunft der \
                    erneuerbaren Energien in Europa und darüber, welche Rolle Wind, \
                    Sonne und Wasserkraft in den nächsten zwanzig Jahren spielen werden.";
        let out = retimer(100).retime(&segment(2000, 14_000), text);

        assert!(out.cues.len() >= 3);
        for cue in &out.cues {
            assert!(cue.lines.len() <= 2);
            for line in &cue.lines {
                assert!(line.chars().count() <= 42, "line too long: {}", line);
            }
        }
        let rejoined: Vec<String> = out.cues.iter().map(|c| c.lines.join(" ")).collect();
        assert_eq!(rejoined.join(" "), tokenize(text).join(" "));
        assert_covers(&out.cues, 2000, 14_000, 100);
    }

    #[test]
    fn test_long_segment_stretches_final_cue() {
        let out = retimer(0).retime(&segment(0, 30_000), "Hm.");

        assert_eq!(out.cues.len(), 1);
        assert_eq!(out.cues[0].end_ms, 30_000);
        assert!(matches!(
            out.warnings[0],
            SyncWarning::DisplayTooLong { cue_duration_ms: 30_000, .. }
        ));
    }

    #[test]
    fn test_overlong_word_reported() {
        let word = "Rindfleischetikettierungsüberwachungsaufgabenübertragungsgesetz";
        let out = retimer(0).retime(&segment(0, 5000), &format!("Das {} gilt.", word));

        assert!(out
            .warnings
            .iter()
            .any(|w| matches!(w, SyncWarning::OverlongWord { word: found, .. } if found == word)));
        assert_covers(&out.cues, 0, 5000, 0);
    }

    #[test]
    fn test_speaker_carried_to_cues() {
        let segment = Segment::from_words(
            2,
            vec![Word::new("Hi", 0, 2000, 0.9).with_speaker("B")],
        );
        let out = retimer(0).retime(&segment, "Hallo");
        assert_eq!(out.cues[0].speaker_id.as_deref(), Some("B"));
    }

    #[test]
    fn test_retime_is_idempotent() {
        let retimer = retimer(100);
        let segment = segment(1234, 9876).with_translation(text_150());

        let first = retimer.retime_segment(&segment);
        let second = retimer.retime_segment(&segment);
        assert_eq!(first, second);
    }
}
