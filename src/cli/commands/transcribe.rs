//! Transcribe command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::media::extract_audio;
use crate::transcription::{format_ms, AssemblyAiTranscriber, Transcriber, WordTimeline};
use anyhow::Result;
use std::path::{Path, PathBuf};

/// Extensions AssemblyAI accepts without extracting audio first.
const AUDIO_EXTENSIONS: [&str; 7] = ["wav", "mp3", "m4a", "flac", "ogg", "opus", "aac"];

/// Run the transcribe command.
pub async fn run_transcribe(
    input: &Path,
    output: Option<PathBuf>,
    language: Option<String>,
    mut settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Transcribe) {
        Output::error(&format!("{}", e));
        Output::info("Run 'teksting doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    if let Some(language) = language {
        settings.transcription.language = language;
    }

    let timeline = transcribe_media(input, &settings).await?;

    let output_path = output.unwrap_or_else(|| input.with_extension("words.json"));
    std::fs::write(&output_path, serde_json::to_string_pretty(&timeline)?)?;

    Output::success(&format!("Transcript written to {}", output_path.display()));
    Output::kv("Words", &timeline.len().to_string());
    Output::kv("Duration", &format_ms(timeline.duration_ms()));
    if let Some(language) = timeline.language_code() {
        Output::kv("Language", language);
    }
    if let Some(confidence) = timeline.mean_confidence() {
        Output::kv("Confidence", &format!("{:.2}", confidence));
    }

    Ok(())
}

/// Transcribe an audio or video file, extracting the audio track if needed.
pub(super) async fn transcribe_media(input: &Path, settings: &Settings) -> Result<WordTimeline> {
    if !input.exists() {
        return Err(anyhow::anyhow!("File not found: {}", input.display()));
    }

    let transcriber = AssemblyAiTranscriber::from_settings(&settings.transcription)?;

    let temp_dir = settings.temp_dir();
    std::fs::create_dir_all(&temp_dir)?;
    // Held until transcription is done so the extracted audio outlives the upload.
    let extracted = if is_audio(input) {
        None
    } else {
        let file = tempfile::Builder::new()
            .prefix("audio-")
            .suffix(".wav")
            .tempfile_in(&temp_dir)?;
        let spinner = Output::spinner("Extracting audio...");
        let result = extract_audio(input, file.path()).await;
        spinner.finish_and_clear();
        result?;
        Some(file)
    };
    let audio_path = extracted.as_ref().map(|f| f.path()).unwrap_or(input);

    let spinner = Output::spinner("Transcribing with AssemblyAI...");
    let result = transcriber.transcribe(audio_path).await;
    spinner.finish_and_clear();

    Ok(result?)
}

fn is_audio(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| AUDIO_EXTENSIONS.contains(&e.to_lowercase().as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_audio() {
        assert!(is_audio(Path::new("talk.MP3")));
        assert!(is_audio(Path::new("/tmp/a.wav")));
        assert!(!is_audio(Path::new("movie.mp4")));
        assert!(!is_audio(Path::new("noext")));
    }
}
