//! Reading subtitle files back into cues.

use super::{timestamp, SubtitleFormat};
use crate::error::{Result, TekstingError};
use crate::retiming::Cue;
use regex::Regex;
use std::sync::LazyLock;

static TIMING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d+(?::\d{2}){1,2}[.,]\d{1,3})\s+-->\s+(\d+(?::\d{2}){1,2}[.,]\d{1,3})")
        .expect("valid timing regex")
});

static VOICE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^<v(?:\.[^ >]+)?\s+([^>]+)>").expect("valid voice regex"));

/// Parse a subtitle document.
pub fn parse_cues(text: &str, format: SubtitleFormat) -> Result<Vec<Cue>> {
    match format {
        SubtitleFormat::Srt | SubtitleFormat::Vtt => parse_blocks(text, format),
        SubtitleFormat::Ass => parse_ass(text),
    }
}

/// SRT and WebVTT share the blank-line separated block layout.
fn parse_blocks(text: &str, format: SubtitleFormat) -> Result<Vec<Cue>> {
    let text = text.trim_start_matches('\u{feff}').replace("\r\n", "\n");
    let mut cues = Vec::new();

    for (block_no, block) in text.split("\n\n").enumerate() {
        let lines: Vec<&str> = block.lines().collect();
        let Some(timing_pos) = lines.iter().position(|l| TIMING.is_match(l)) else {
            let first = lines.first().map(|l| l.trim()).unwrap_or("");
            let skippable = first.is_empty()
                || (format == SubtitleFormat::Vtt
                    && (first.starts_with("WEBVTT") || first.starts_with("NOTE") || first.starts_with("STYLE")));
            if skippable {
                continue;
            }
            return Err(TekstingError::Format(format!(
                "block {} has no timing line: {:?}",
                block_no + 1,
                first
            )));
        };

        let caps = TIMING
            .captures(lines[timing_pos])
            .ok_or_else(|| TekstingError::Format("timing line vanished".into()))?;
        let start_ms = timestamp::parse(&caps[1])?;
        let end_ms = timestamp::parse(&caps[2])?;

        let mut speaker_id = None;
        let mut cue_lines = Vec::new();
        for line in &lines[timing_pos + 1..] {
            let mut line = line.to_string();
            if let Some(voice) = VOICE.captures(&line) {
                speaker_id = Some(unescape_vtt(voice[1].trim()));
                line = line[voice[0].len()..].replace("</v>", "");
            }
            cue_lines.push(unescape_vtt(&line));
        }

        cues.push(Cue {
            index: cues.len() + 1,
            start_ms,
            end_ms,
            lines: cue_lines,
            speaker_id,
        });
    }

    Ok(cues)
}

fn unescape_vtt(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

fn parse_ass(text: &str) -> Result<Vec<Cue>> {
    let mut cues = Vec::new();

    for line in text.lines() {
        let Some(rest) = line.strip_prefix("Dialogue:") else {
            continue;
        };
        // Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text
        let fields: Vec<&str> = rest.trim_start().splitn(10, ',').collect();
        if fields.len() < 10 {
            return Err(TekstingError::Format(format!("malformed dialogue line: {:?}", line)));
        }

        let name = fields[4].trim();
        cues.push(Cue {
            index: cues.len() + 1,
            start_ms: timestamp::parse(fields[1])?,
            end_ms: timestamp::parse(fields[2])?,
            lines: fields[9]
                .split("\\N")
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect(),
            speaker_id: (!name.is_empty()).then(|| name.to_string()),
        });
    }

    Ok(cues)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subtitle::{emit, EmitOptions};

    fn sample() -> Vec<Cue> {
        vec![
            Cue {
                index: 1,
                start_ms: 1234,
                end_ms: 3456,
                lines: vec!["Erste Zeile".into(), "zweite Zeile".into()],
                speaker_id: Some("A".into()),
            },
            Cue {
                index: 2,
                start_ms: 3556,
                end_ms: 7089,
                lines: vec!["Fisch & Chips".into()],
                speaker_id: Some("B".into()),
            },
        ]
    }

    #[test]
    fn test_srt_roundtrip() {
        let cues = sample();
        let srt = String::from_utf8(emit(&cues, SubtitleFormat::Srt, &EmitOptions::default())).unwrap();
        let parsed = parse_cues(&srt, SubtitleFormat::Srt).unwrap();

        assert_eq!(parsed.len(), 2);
        for (a, b) in parsed.iter().zip(&cues) {
            assert_eq!((a.start_ms, a.end_ms), (b.start_ms, b.end_ms));
            assert_eq!(a.lines, b.lines);
        }
    }

    #[test]
    fn test_vtt_roundtrip_with_voices() {
        let cues = sample();
        let vtt = String::from_utf8(emit(&cues, SubtitleFormat::Vtt, &EmitOptions::default())).unwrap();
        let parsed = parse_cues(&vtt, SubtitleFormat::Vtt).unwrap();

        assert_eq!(parsed, cues);
    }

    #[test]
    fn test_ass_roundtrip_within_10ms() {
        let cues = sample();
        let ass = String::from_utf8(emit(&cues, SubtitleFormat::Ass, &EmitOptions::default())).unwrap();
        let parsed = parse_cues(&ass, SubtitleFormat::Ass).unwrap();

        assert_eq!(parsed.len(), 2);
        for (a, b) in parsed.iter().zip(&cues) {
            assert!(b.start_ms - a.start_ms < 10);
            assert!(b.end_ms - a.end_ms < 10);
            assert_eq!(a.lines, b.lines);
            assert_eq!(a.speaker_id, b.speaker_id);
        }
    }

    #[test]
    fn test_vtt_short_timestamps_and_notes() {
        let vtt = "WEBVTT\r\n\r\nNOTE generated by hand\r\n\r\n00:01.000 --> 00:02.500\r\nHi\r\n";
        let parsed = parse_cues(vtt, SubtitleFormat::Vtt).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!((parsed[0].start_ms, parsed[0].end_ms), (1000, 2500));
        assert_eq!(parsed[0].lines, vec!["Hi"]);
    }

    #[test]
    fn test_srt_block_without_timing_is_error() {
        let srt = "1\n00:00:00,000 --> 00:00:01,000\nok\n\n2\nno timing here\n";
        assert!(matches!(parse_cues(srt, SubtitleFormat::Srt), Err(TekstingError::Format(_))));
    }
}
