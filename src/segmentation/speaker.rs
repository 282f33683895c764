//! Speaker and silence based segmentation.

use super::Segment;
use crate::transcription::{Word, WordTimeline};
use tracing::debug;

/// Splits a word timeline into speaker turns.
///
/// A new segment starts when the speaker label changes or when the pause
/// between two words is longer than the silence threshold.
#[derive(Debug, Clone)]
pub struct SpeakerSegmenter {
    silence_split_ms: u64,
}

impl SpeakerSegmenter {
    pub fn new(silence_split_ms: u64) -> Self {
        Self { silence_split_ms }
    }

    /// Segment a timeline. An empty timeline yields no segments.
    pub fn segment(&self, timeline: &WordTimeline) -> Vec<Segment> {
        let mut segments = Vec::new();
        let mut current: Vec<Word> = Vec::new();

        for word in timeline.words() {
            if let Some(prev) = current.last() {
                let speaker_changed = prev.speaker_id != word.speaker_id;
                let pause = word.start_ms.saturating_sub(prev.end_ms);

                if speaker_changed || pause > self.silence_split_ms {
                    let words = std::mem::take(&mut current);
                    segments.push(Segment::from_words(segments.len(), words));
                }
            }
            current.push(word.clone());
        }

        if !current.is_empty() {
            segments.push(Segment::from_words(segments.len(), current));
        }

        debug!(
            "Segmented {} words into {} segments",
            timeline.len(),
            segments.len()
        );
        segments
    }
}

impl Default for SpeakerSegmenter {
    fn default() -> Self {
        Self::new(2000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timeline(words: Vec<Word>) -> WordTimeline {
        WordTimeline::new(words).unwrap()
    }

    #[test]
    fn test_empty_timeline() {
        let segments = SpeakerSegmenter::default().segment(&timeline(Vec::new()));
        assert!(segments.is_empty());
    }

    #[test]
    fn test_splits_on_speaker_change() {
        let segments = SpeakerSegmenter::default().segment(&timeline(vec![
            Word::new("Hi", 0, 200, 0.9).with_speaker("A"),
            Word::new("Bob.", 250, 500, 0.9).with_speaker("A"),
            Word::new("Hello", 500, 800, 0.9).with_speaker("B"),
            Word::new("Alice.", 850, 1200, 0.9).with_speaker("B"),
        ]));

        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].source_text(), "Hi Bob.");
        assert_eq!(segments[0].speaker_id.as_deref(), Some("A"));
        assert_eq!((segments[0].start_ms, segments[0].end_ms), (0, 500));
        assert_eq!(segments[1].index, 1);
        assert_eq!(segments[1].speaker_id.as_deref(), Some("B"));
        assert_eq!((segments[1].start_ms, segments[1].end_ms), (500, 1200));
    }

    #[test]
    fn test_splits_on_long_silence() {
        let segments = SpeakerSegmenter::new(2000).segment(&timeline(vec![
            Word::new("one", 0, 300, 0.9),
            Word::new("two", 2300, 2600, 0.9),
            Word::new("three", 4601, 5000, 0.9),
        ]));

        // 2000ms pause is not above the threshold, 2001ms is.
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].source_text(), "one two");
        assert_eq!(segments[1].source_text(), "three");
        assert!(segments[0].speaker_id.is_none());
    }

    #[test]
    fn test_segments_partition_words() {
        let words: Vec<Word> = (0..20)
            .map(|i| {
                let speaker = if (i / 5) % 2 == 0 { "A" } else { "B" };
                Word::new(format!("w{}", i), i * 1000, i * 1000 + 400, 0.9).with_speaker(speaker)
            })
            .collect();
        let segments = SpeakerSegmenter::default().segment(&timeline(words.clone()));

        let rejoined: Vec<Word> = segments.iter().flat_map(|s| s.words.clone()).collect();
        assert_eq!(rejoined, words);
        assert_eq!(segments.len(), 4);
        for pair in segments.windows(2) {
            assert!(pair[0].end_ms <= pair[1].start_ms);
        }
    }
}
