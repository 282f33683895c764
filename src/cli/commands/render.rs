//! Render command - re-emit a stored sync result.

use super::sync::write_subtitles;
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::SyncOutput;
use crate::subtitle::EmitOptions;
use anyhow::Result;
use std::path::{Path, PathBuf};

/// Run the render command.
pub fn run_render(result_path: &Path, formats: &[String], output: Option<PathBuf>, settings: &Settings) -> Result<()> {
    let mut result = SyncOutput::load(result_path)?;
    let warnings_before = result.report.warnings.len();

    let stem = output.unwrap_or_else(|| stem_of(result_path));
    let written = write_subtitles(&mut result, &stem, formats, &EmitOptions::from(&settings.output))?;

    for warning in &result.report.warnings[warnings_before..] {
        Output::warning(&warning.to_string());
    }
    for path in &written {
        Output::success(&format!("Wrote {} ({} cues)", path.display(), result.cues.len()));
    }

    Ok(())
}

/// `talk.sync.json` renders to `talk.<ext>`.
fn stem_of(result_path: &Path) -> PathBuf {
    let stem = result_path.with_extension("");
    if stem.extension().is_some_and(|e| e == "sync") {
        stem.with_extension("")
    } else {
        stem
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SyncSettings;
    use crate::orchestrator::Synchronizer;
    use crate::transcription::{Word, WordTimeline};
    use crate::translation::IdentityTranslator;
    use std::sync::Arc;

    #[test]
    fn test_stem_of() {
        assert_eq!(stem_of(Path::new("out/talk.sync.json")), PathBuf::from("out/talk"));
        assert_eq!(stem_of(Path::new("result.json")), PathBuf::from("result"));
    }

    #[tokio::test]
    async fn test_render_saved_result() {
        let dir = tempfile::tempdir().unwrap();
        let timeline = WordTimeline::new(vec![
            Word::new("Hei", 0, 600, 0.95).with_speaker("A"),
            Word::new("verden", 600, 1500, 0.95).with_speaker("A"),
        ])
        .unwrap();
        let result = Synchronizer::new(&SyncSettings::default(), Arc::new(IdentityTranslator))
            .run(&timeline, Some("NO"), "NO")
            .await
            .unwrap();
        let saved = dir.path().join("talk.sync.json");
        result.save(&saved).unwrap();

        run_render(&saved, &["vtt".into(), "ass".into()], None, &Settings::default()).unwrap();

        let vtt = std::fs::read_to_string(dir.path().join("talk.vtt")).unwrap();
        assert!(vtt.starts_with("WEBVTT"));
        assert!(vtt.contains("00:00:00.000 --> 00:00:01.500"));
        assert!(dir.path().join("talk.ass").exists());
    }
}
