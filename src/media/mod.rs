//! Audio extraction and subtitle muxing with ffmpeg.
//!
//! All work is delegated to the `ffmpeg` and `ffprobe` binaries, which must be
//! on the PATH.

use crate::error::{Result, TekstingError};
use crate::subtitle::SubtitleFormat;
use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tempfile::NamedTempFile;
use tokio::process::Command;
use tracing::{debug, info, instrument};

/// How subtitles are combined with a video.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MuxMode {
    /// Add a selectable subtitle stream.
    Soft,
    /// Render the subtitles into the picture.
    Burn,
}

impl std::str::FromStr for MuxMode {
    type Err = TekstingError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "soft" | "attach" => Ok(MuxMode::Soft),
            "burn" | "hard" => Ok(MuxMode::Burn),
            _ => Err(TekstingError::InvalidInput(format!(
                "Unknown mux mode: {}. Use 'soft' or 'burn'",
                s
            ))),
        }
    }
}

/// Arguments to extract mono 16 kHz PCM audio, the input ASR services prefer.
pub fn extract_audio_args(video: &Path, dest: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["-i".into(), video.into()];
    args.extend(
        ["-vn", "-acodec", "pcm_s16le", "-ar", "16000", "-ac", "1", "-y", "-loglevel", "error"]
            .map(OsString::from),
    );
    args.push(dest.into());
    args
}

/// Arguments to add a subtitle stream without re-encoding audio or video.
///
/// MP4 containers only accept `mov_text` subtitles; other containers keep the
/// subtitle codec as is.
pub fn attach_subtitles_args(video: &Path, subtitles: &Path, output: &Path) -> Vec<OsString> {
    let is_mp4 = output
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| matches!(e.to_lowercase().as_str(), "mp4" | "m4v" | "mov"));

    let mut args: Vec<OsString> = vec!["-i".into(), video.into(), "-i".into(), subtitles.into()];
    args.extend(["-map", "0", "-map", "1", "-c:v", "copy", "-c:a", "copy", "-c:s"].map(OsString::from));
    args.push(if is_mp4 { "mov_text" } else { "copy" }.into());
    args.extend(["-y", "-loglevel", "error"].map(OsString::from));
    args.push(output.into());
    args
}

/// Arguments to burn subtitles into the video stream.
pub fn burn_subtitles_args(video: &Path, subtitles: &Path, format: SubtitleFormat, output: &Path) -> Vec<OsString> {
    let path = escape_filter_path(subtitles);
    let filter = match format {
        SubtitleFormat::Ass => format!("ass='{}'", path),
        SubtitleFormat::Srt | SubtitleFormat::Vtt => format!("subtitles='{}'", path),
    };

    let mut args: Vec<OsString> = vec!["-i".into(), video.into(), "-vf".into(), filter.into()];
    args.extend(["-c:a", "copy", "-y", "-loglevel", "error"].map(OsString::from));
    args.push(output.into());
    args
}

/// Escape a path for use inside a quoted ffmpeg filter argument.
fn escape_filter_path(path: &Path) -> String {
    path.to_string_lossy()
        .replace('\\', "/")
        .replace(':', "\\:")
        .replace('\'', "'\\''")
}

async fn run_tool(tool: &str, args: &[OsString]) -> Result<std::process::Output> {
    debug!("Running {} {:?}", tool, args);

    let result = Command::new(tool)
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await;

    match result {
        Ok(out) if out.status.success() => Ok(out),
        Ok(out) => {
            let err = String::from_utf8_lossy(&out.stderr);
            Err(TekstingError::ToolFailed(format!("{} failed: {}", tool, err.trim())))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(TekstingError::ToolNotFound(tool.into())),
        Err(e) => Err(TekstingError::ToolFailed(format!("{} error: {}", tool, e))),
    }
}

/// Extract the audio track of a video as mono 16 kHz WAV.
#[instrument(skip_all, fields(video = %video.display()))]
pub async fn extract_audio(video: &Path, dest: &Path) -> Result<PathBuf> {
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)?;
    }

    info!("Extracting audio to {}", dest.display());
    run_tool("ffmpeg", &extract_audio_args(video, dest)).await?;
    Ok(dest.to_path_buf())
}

/// Add subtitles as a separate stream.
#[instrument(skip_all, fields(video = %video.display()))]
pub async fn attach_subtitles(video: &Path, subtitles: &Path, output: &Path) -> Result<()> {
    info!("Attaching subtitles to {}", output.display());
    run_tool("ffmpeg", &attach_subtitles_args(video, subtitles, output)).await?;
    Ok(())
}

/// Re-encode the video with subtitles drawn into the picture.
#[instrument(skip_all, fields(video = %video.display()))]
pub async fn burn_subtitles(video: &Path, subtitles: &Path, format: SubtitleFormat, output: &Path) -> Result<()> {
    info!("Burning {} subtitles into {}", format, output.display());
    run_tool("ffmpeg", &burn_subtitles_args(video, subtitles, format, output)).await?;
    Ok(())
}

/// Media duration in seconds, read with ffprobe.
pub async fn probe_duration(path: &Path) -> Result<f64> {
    let args: Vec<OsString> = vec![
        "-v".into(),
        "quiet".into(),
        "-print_format".into(),
        "json".into(),
        "-show_format".into(),
        path.into(),
    ];
    let output = run_tool("ffprobe", &args).await?;

    let json: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    json["format"]["duration"]
        .as_str()
        .and_then(|d| d.parse::<f64>().ok())
        .ok_or_else(|| TekstingError::ToolFailed("ffprobe reported no duration".into()))
}

/// Write rendered subtitles to a temporary file with the right extension.
///
/// The file is removed when the handle is dropped.
pub fn write_temp_subtitles(bytes: &[u8], format: SubtitleFormat) -> Result<NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .prefix("teksting-")
        .suffix(&format!(".{}", format.extension()))
        .tempfile()?;
    file.write_all(bytes)?;
    file.flush()?;
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: &[OsString]) -> Vec<String> {
        args.iter().map(|a| a.to_string_lossy().into_owned()).collect()
    }

    #[test]
    fn test_extract_audio_is_mono_16k() {
        let args = strings(&extract_audio_args(Path::new("in.mp4"), Path::new("out.wav")));
        assert_eq!(args.first().map(String::as_str), Some("-i"));
        assert!(args.windows(2).any(|w| w == ["-ar", "16000"]));
        assert!(args.windows(2).any(|w| w == ["-ac", "1"]));
        assert_eq!(args.last().map(String::as_str), Some("out.wav"));
    }

    #[test]
    fn test_attach_uses_mov_text_for_mp4() {
        let mp4 = strings(&attach_subtitles_args(Path::new("v.mp4"), Path::new("s.srt"), Path::new("o.mp4")));
        assert!(mp4.windows(2).any(|w| w == ["-c:s", "mov_text"]));

        let mkv = strings(&attach_subtitles_args(Path::new("v.mp4"), Path::new("s.ass"), Path::new("o.mkv")));
        assert!(mkv.windows(2).any(|w| w == ["-c:s", "copy"]));
    }

    #[test]
    fn test_burn_filter_by_format() {
        let ass = strings(&burn_subtitles_args(
            Path::new("v.mp4"),
            Path::new("/tmp/s.ass"),
            SubtitleFormat::Ass,
            Path::new("o.mp4"),
        ));
        assert!(ass.contains(&"ass='/tmp/s.ass'".to_string()));

        let srt = strings(&burn_subtitles_args(
            Path::new("v.mp4"),
            Path::new("C:\\subs\\it's.srt"),
            SubtitleFormat::Srt,
            Path::new("o.mp4"),
        ));
        assert!(srt.contains(&"subtitles='C\\:/subs/it'\\''s.srt'".to_string()));
    }

    #[test]
    fn test_mux_mode_parse() {
        assert_eq!("burn".parse::<MuxMode>().unwrap(), MuxMode::Burn);
        assert_eq!("SOFT".parse::<MuxMode>().unwrap(), MuxMode::Soft);
        assert!("sideways".parse::<MuxMode>().is_err());
    }

    #[test]
    fn test_temp_subtitles_keep_extension() {
        let file = write_temp_subtitles(b"WEBVTT\n\n", SubtitleFormat::Vtt).unwrap();
        assert_eq!(file.path().extension().and_then(|e| e.to_str()), Some("vtt"));
        assert_eq!(std::fs::read(file.path()).unwrap(), b"WEBVTT\n\n");
    }
}
