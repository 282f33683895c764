//! Check command - report quality problems in subtitles and transcripts.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::SyncOutput;
use crate::quality::{speaker_stats, QualityChecker, QualityIssue};
use crate::subtitle::load_cues;
use crate::transcription::{format_ms, WordTimeline};
use anyhow::Result;
use std::path::Path;

/// Run the check command.
///
/// JSON input is read as a transcript, or as a stored sync result when it is
/// not one. Anything else is parsed as a subtitle file.
pub fn run_check(input: &Path, settings: &Settings) -> Result<()> {
    let checker = QualityChecker::new(&settings.sync);

    let is_json = input
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    let issues = if is_json {
        match WordTimeline::load(input) {
            Ok(timeline) => check_timeline(&checker, &timeline),
            Err(timeline_err) => {
                let result = SyncOutput::load(input).map_err(|_| timeline_err)?;
                Output::header(&format!("Sync result: {}", input.display()));
                Output::kv("Cues", &result.cues.len().to_string());
                let mut issues = checker.check_cues(&result.cues);
                issues.extend(checker.check_translations(&result.segments));
                issues
            }
        }
    } else {
        let (format, cues) = load_cues(input)?;
        Output::header(&format!("{} subtitles: {}", format.extension().to_uppercase(), input.display()));
        Output::kv("Cues", &cues.len().to_string());
        checker.check_cues(&cues)
    };

    print_issues(&issues);
    Ok(())
}

fn check_timeline(checker: &QualityChecker, timeline: &WordTimeline) -> Vec<QualityIssue> {
    Output::header("Transcript");
    Output::kv("Words", &timeline.len().to_string());
    Output::kv("Duration", &format_ms(timeline.duration_ms()));
    if let Some(language) = timeline.language_code() {
        Output::kv("Language", language);
    }

    for stats in speaker_stats(timeline) {
        Output::list_item(&format!(
            "Speaker {}: {} words, {} speaking, confidence {:.2}",
            stats.speaker_id.as_deref().unwrap_or("-"),
            stats.words,
            format_ms(stats.speaking_ms),
            stats.mean_confidence
        ));
    }

    checker.check_timeline(timeline)
}

fn print_issues(issues: &[QualityIssue]) {
    println!();
    if issues.is_empty() {
        Output::success("No problems found.");
        return;
    }

    Output::warning(&format!("{} problem(s) found:", issues.len()));
    for issue in issues {
        Output::list_item(&issue.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_srt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.srt");
        std::fs::write(&path, "1\n00:00:00,000 --> 00:00:02,000\nHello\n\n2\n00:00:01,500 --> 00:00:03,000\nAgain\n").unwrap();

        assert!(run_check(&path, &Settings::default()).is_ok());
    }

    #[test]
    fn test_check_rejects_unknown_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("other.json");
        std::fs::write(&path, r#"{"hello": "world"}"#).unwrap();

        assert!(run_check(&path, &Settings::default()).is_err());
    }
}
