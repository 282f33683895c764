//! Mux command - add subtitles to a video with ffmpeg.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::media::{attach_subtitles, burn_subtitles, probe_duration, MuxMode};
use crate::subtitle::load_cues;
use crate::transcription::format_ms;
use anyhow::Result;
use std::path::Path;

/// Run the mux command.
pub async fn run_mux(video: &Path, subtitles: &Path, output: &Path, mode: &str) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Mux) {
        Output::error(&format!("{}", e));
        Output::info("Run 'teksting doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let mode: MuxMode = mode.parse()?;
    let (format, cues) = load_cues(subtitles)?;

    if let (Some(last), Ok(duration)) = (cues.last(), probe_duration(video).await) {
        let video_ms = (duration * 1000.0) as u64;
        if last.end_ms > video_ms {
            Output::warning(&format!(
                "Subtitles run until {} but the video ends at {}",
                format_ms(last.end_ms),
                format_ms(video_ms)
            ));
        }
    }

    let spinner = Output::spinner("Running ffmpeg...");
    let result = match mode {
        MuxMode::Soft => attach_subtitles(video, subtitles, output).await,
        MuxMode::Burn => burn_subtitles(video, subtitles, format, output).await,
    };
    spinner.finish_and_clear();
    result?;

    Output::success(&format!("Wrote {} ({} cues)", output.display(), cues.len()));
    Ok(())
}
