//! Sync command implementation.

use super::transcribe::transcribe_media;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::{Settings, TranslationProvider};
use crate::orchestrator::{SyncOutput, Synchronizer};
use crate::subtitle::{EmitOptions, SubtitleFormat};
use crate::transcription::WordTimeline;
use crate::translation::create_translator;
use anyhow::Result;
use std::path::{Path, PathBuf};

/// Options of `teksting sync` beyond the input path.
#[derive(Debug, Default)]
pub struct SyncArgs {
    pub to: Option<String>,
    pub from: Option<String>,
    pub formats: Vec<String>,
    pub output: Option<PathBuf>,
    pub provider: Option<String>,
    pub save: bool,
}

/// Run the sync command.
pub async fn run_sync(input: &Path, args: SyncArgs, mut settings: Settings) -> Result<()> {
    if let Some(provider) = &args.provider {
        settings.translation.provider = provider
            .parse::<TranslationProvider>()
            .map_err(|e| anyhow::anyhow!(e))?;
    }

    if let Err(e) = preflight::check(Operation::Translate(settings.translation.provider)) {
        Output::error(&format!("{}", e));
        Output::info("Run 'teksting doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let timeline = load_timeline(input, &settings).await?;
    let target = args.to.unwrap_or_else(|| settings.translation.target_language.clone());
    let source = args.from.or_else(|| settings.translation.source_language.clone());

    Output::info(&format!(
        "Synchronizing {} words into {} ({})",
        timeline.len(),
        target,
        settings.translation.provider
    ));

    let translator = create_translator(&settings)?;
    let synchronizer = Synchronizer::new(&settings.sync, translator).with_progress(true);
    let mut result = synchronizer.run(&timeline, source.as_deref(), &target).await?;

    let formats = if args.formats.is_empty() {
        settings.output.formats.clone()
    } else {
        args.formats
    };
    let stem = args.output.unwrap_or_else(|| default_stem(input));

    let written = write_subtitles(&mut result, &stem, &formats, &EmitOptions::from(&settings.output))?;

    let report_path = with_suffix(&stem, "report.json");
    std::fs::write(&report_path, serde_json::to_string_pretty(&result.report)?)?;

    if args.save {
        let result_path = with_suffix(&stem, "sync.json");
        result.save(&result_path)?;
        Output::kv("Result", &result_path.display().to_string());
    }

    Output::report(&result.report);
    for path in &written {
        Output::success(&format!("Wrote {}", path.display()));
    }
    Output::kv("Report", &report_path.display().to_string());

    Ok(())
}

/// Read a transcript JSON file, or transcribe a media file.
async fn load_timeline(input: &Path, settings: &Settings) -> Result<WordTimeline> {
    let is_json = input
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    if is_json {
        return Ok(WordTimeline::load(input)?);
    }

    if let Err(e) = preflight::check(Operation::Transcribe) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }
    transcribe_media(input, settings).await
}

/// Render every requested format next to `stem`.
///
/// Fails only when none of the formats could be produced.
pub(super) fn write_subtitles(
    result: &mut SyncOutput,
    stem: &Path,
    formats: &[String],
    options: &EmitOptions,
) -> Result<Vec<PathBuf>> {
    let rendered = result.render(formats, options);
    if rendered.is_empty() {
        return Err(anyhow::anyhow!(
            "None of the requested formats are supported: {}",
            formats.join(", ")
        ));
    }

    if let Some(parent) = stem.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut written = Vec::with_capacity(rendered.len());
    for (format, bytes) in rendered {
        let path = subtitle_path(stem, format);
        std::fs::write(&path, bytes)?;
        written.push(path);
    }
    Ok(written)
}

/// Input path without its extension, so `talk.words.json` becomes `talk`.
fn default_stem(input: &Path) -> PathBuf {
    let mut stem = input.with_extension("");
    if stem.extension().is_some_and(|e| e == "words") {
        stem = stem.with_extension("");
    }
    stem
}

pub(super) fn subtitle_path(stem: &Path, format: SubtitleFormat) -> PathBuf {
    with_suffix(stem, format.extension())
}

/// Append `.suffix` without replacing an existing extension.
pub(super) fn with_suffix(stem: &Path, suffix: &str) -> PathBuf {
    let mut name = stem.as_os_str().to_owned();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}
