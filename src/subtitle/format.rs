//! Subtitle serialization (SRT, WebVTT, ASS).

use super::timestamp;
use crate::config::OutputSettings;
use crate::error::{Result, TekstingError};
use crate::report::SyncWarning;
use crate::retiming::Cue;
use std::collections::BTreeSet;

/// Supported subtitle formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SubtitleFormat {
    Srt,
    Vtt,
    Ass,
}

impl SubtitleFormat {
    pub const ALL: [SubtitleFormat; 3] = [SubtitleFormat::Srt, SubtitleFormat::Vtt, SubtitleFormat::Ass];

    /// File extension without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            SubtitleFormat::Srt => "srt",
            SubtitleFormat::Vtt => "vtt",
            SubtitleFormat::Ass => "ass",
        }
    }

    /// Guess the format from a file path's extension.
    pub fn from_path(path: &std::path::Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| TekstingError::Format(format!("no extension on {}", path.display())))?;
        ext.parse()
    }
}

impl std::str::FromStr for SubtitleFormat {
    type Err = TekstingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "srt" | "subrip" => Ok(SubtitleFormat::Srt),
            "vtt" | "webvtt" => Ok(SubtitleFormat::Vtt),
            "ass" | "ssa" => Ok(SubtitleFormat::Ass),
            _ => Err(TekstingError::Format(format!(
                "unsupported subtitle format: {}. Use srt, vtt, or ass.",
                s
            ))),
        }
    }
}

impl std::fmt::Display for SubtitleFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// Rendering options that do not affect timing.
#[derive(Debug, Clone)]
pub struct EmitOptions {
    /// Prefix WebVTT cues with `<v speaker>` voice tags.
    pub vtt_voice_tags: bool,
    /// One ASS style per speaker.
    pub ass_speaker_styles: bool,
    pub ass_font: String,
    pub ass_font_size: u32,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self::from(&OutputSettings::default())
    }
}

impl From<&OutputSettings> for EmitOptions {
    fn from(settings: &OutputSettings) -> Self {
        Self {
            vtt_voice_tags: settings.vtt_voice_tags,
            ass_speaker_styles: settings.ass_speaker_styles,
            ass_font: settings.ass_font.clone(),
            ass_font_size: settings.ass_font_size,
        }
    }
}

/// Serialize cues. Indexes are renumbered from 1 in the given order.
pub fn emit(cues: &[Cue], format: SubtitleFormat, options: &EmitOptions) -> Vec<u8> {
    let text = match format {
        SubtitleFormat::Srt => format_srt(cues),
        SubtitleFormat::Vtt => format_vtt(cues, options),
        SubtitleFormat::Ass => format_ass(cues, options),
    };
    text.into_bytes()
}

/// Emit every requested format.
///
/// Unknown format names do not stop the others; each becomes an
/// `UnsupportedFormat` warning. Duplicates are emitted once.
pub fn emit_all(
    cues: &[Cue],
    formats: &[String],
    options: &EmitOptions,
) -> (Vec<(SubtitleFormat, Vec<u8>)>, Vec<SyncWarning>) {
    let mut selected = BTreeSet::new();
    let mut warnings = Vec::new();

    for name in formats {
        match name.parse::<SubtitleFormat>() {
            Ok(format) => {
                selected.insert(format);
            }
            Err(e) => warnings.push(SyncWarning::UnsupportedFormat {
                format: name.clone(),
                reason: e.to_string(),
            }),
        }
    }

    let outputs = selected
        .into_iter()
        .map(|format| (format, emit(cues, format, options)))
        .collect();

    (outputs, warnings)
}

/// Format as SRT (SubRip).
fn format_srt(cues: &[Cue]) -> String {
    let mut output = String::new();

    for (i, cue) in cues.iter().enumerate() {
        output.push_str(&format!("{}\n", i + 1));
        output.push_str(&format!(
            "{} --> {}\n",
            timestamp::format_srt(cue.start_ms),
            timestamp::format_srt(cue.end_ms)
        ));
        for line in &cue.lines {
            output.push_str(line);
            output.push('\n');
        }
        output.push('\n');
    }

    output
}

/// Format as WebVTT.
fn format_vtt(cues: &[Cue], options: &EmitOptions) -> String {
    let mut output = String::from("WEBVTT\n\n");

    for (i, cue) in cues.iter().enumerate() {
        output.push_str(&format!("{}\n", i + 1));
        output.push_str(&format!(
            "{} --> {}\n",
            timestamp::format_vtt(cue.start_ms),
            timestamp::format_vtt(cue.end_ms)
        ));

        for (n, line) in cue.lines.iter().enumerate() {
            match (&cue.speaker_id, options.vtt_voice_tags && n == 0) {
                (Some(speaker), true) => {
                    output.push_str(&format!("<v {}>{}\n", vtt_voice_name(speaker), escape_vtt(line)))
                }
                _ => {
                    output.push_str(&escape_vtt(line));
                    output.push('\n');
                }
            }
        }
        output.push('\n');
    }

    output
}

/// WebVTT cue text treats `&`, `<` and `>` as markup.
/// Voice annotations end at `>` and cannot span lines.
fn vtt_voice_name(speaker: &str) -> String {
    escape_vtt(&speaker.split_whitespace().collect::<Vec<_>>().join(" "))
}

fn escape_vtt(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// ASS primary colours for speaker styles (&HBBGGRR).
const SPEAKER_COLOURS: [&str; 6] = [
    "&H00FFFFFF",
    "&H0000FFFF",
    "&H00FFFF00",
    "&H0000FF00",
    "&H00FF80FF",
    "&H000080FF",
];

/// Style name used for a speaker.
pub fn ass_style_name(speaker_id: Option<&str>, options: &EmitOptions) -> String {
    match speaker_id {
        Some(speaker) if options.ass_speaker_styles => {
            let sanitized: String = speaker
                .chars()
                .map(|c| if c.is_alphanumeric() { c } else { '_' })
                .collect();
            format!("Speaker_{}", sanitized)
        }
        _ => "Default".to_string(),
    }
}

fn ass_style_line(name: &str, colour: &str, options: &EmitOptions) -> String {
    format!(
        "Style: {},{},{},{},&H000000FF,&H00000000,&H80000000,0,0,0,0,100,100,0,0,1,2,1,2,10,10,20,1\n",
        name, options.ass_font, options.ass_font_size, colour
    )
}

/// Format as Advanced SubStation Alpha.
fn format_ass(cues: &[Cue], options: &EmitOptions) -> String {
    let mut output = String::from(
        "[Script Info]\n\
         Title: Translated Subtitles\n\
         ScriptType: v4.00+\n\
         WrapStyle: 0\n\
         ScaledBorderAndShadow: yes\n\n\
         [V4+ Styles]\n\
         Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, BackColour, \
         Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, BorderStyle, Outline, \
         Shadow, Alignment, MarginL, MarginR, MarginV, Encoding\n",
    );

    output.push_str(&ass_style_line("Default", SPEAKER_COLOURS[0], options));

    // Styles in first-appearance order so colours are stable for a file.
    let mut styles: Vec<String> = Vec::new();
    for cue in cues {
        let name = ass_style_name(cue.speaker_id.as_deref(), options);
        if name != "Default" && !styles.contains(&name) {
            styles.push(name);
        }
    }
    for (i, name) in styles.iter().enumerate() {
        let colour = SPEAKER_COLOURS[(i + 1) % SPEAKER_COLOURS.len()];
        output.push_str(&ass_style_line(name, colour, options));
    }

    output.push_str(
        "\n[Events]\nFormat: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text\n",
    );

    for cue in cues {
        let text = cue
            .lines
            .iter()
            .map(|l| escape_ass(l))
            .collect::<Vec<_>>()
            .join("\\N");
        output.push_str(&format!(
            "Dialogue: 0,{},{},{},{},0,0,0,,{}\n",
            timestamp::format_ass(cue.start_ms),
            timestamp::format_ass(ass_end_ms(cue)),
            ass_style_name(cue.speaker_id.as_deref(), options),
            cue.speaker_id.as_deref().unwrap_or(""),
            text
        ));
    }

    output
}

/// End time for an ASS event.
///
/// ASS has centisecond resolution; a cue shorter than that would truncate to
/// a zero-length event, so its end is rounded up to the next centisecond.
fn ass_end_ms(cue: &Cue) -> u64 {
    let start_cs = cue.start_ms / 10;
    if cue.end_ms / 10 <= start_cs {
        (start_cs + 1) * 10
    } else {
        cue.end_ms
    }
}

/// Braces start ASS override blocks.
fn escape_ass(text: &str) -> String {
    text.replace('{', "(").replace('}', ")")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cue(start_ms: u64, end_ms: u64, lines: &[&str], speaker: Option<&str>) -> Cue {
        Cue {
            index: 1,
            start_ms,
            end_ms,
            lines: lines.iter().map(|l| l.to_string()).collect(),
            speaker_id: speaker.map(str::to_string),
        }
    }

    fn sample() -> Vec<Cue> {
        vec![
            cue(0, 2500, &["Hallo Welt."], Some("A")),
            cue(2600, 5000, &["Das ist ein Test", "mit zwei Zeilen."], Some("B")),
        ]
    }

    fn emit_str(cues: &[Cue], format: SubtitleFormat) -> String {
        String::from_utf8(emit(cues, format, &EmitOptions::default())).unwrap()
    }

    #[test]
    fn test_format_srt() {
        let srt = emit_str(&sample(), SubtitleFormat::Srt);
        assert_eq!(
            srt,
            "1\n00:00:00,000 --> 00:00:02,500\nHallo Welt.\n\n\
             2\n00:00:02,600 --> 00:00:05,000\nDas ist ein Test\nmit zwei Zeilen.\n\n"
        );
    }

    #[test]
    fn test_format_vtt() {
        let vtt = emit_str(&sample(), SubtitleFormat::Vtt);
        assert!(vtt.starts_with("WEBVTT\n\n"));
        assert!(vtt.contains("00:00:02.600 --> 00:00:05.000\n<v B>Das ist ein Test\nmit zwei Zeilen.\n"));
    }

    #[test]
    fn test_vtt_without_voice_tags_escapes_markup() {
        let options = EmitOptions {
            vtt_voice_tags: false,
            ..Default::default()
        };
        let cues = vec![cue(0, 1000, &["Tom & <Jerry>"], Some("A"))];
        let vtt = String::from_utf8(emit(&cues, SubtitleFormat::Vtt, &options)).unwrap();
        assert!(vtt.contains("Tom &amp; &lt;Jerry&gt;\n"));
        assert!(!vtt.contains("<v"));
    }

    #[test]
    fn test_format_ass() {
        let ass = emit_str(&sample(), SubtitleFormat::Ass);
        assert!(ass.starts_with("[Script Info]"));
        assert!(ass.contains("Style: Default,Arial,20,"));
        assert!(ass.contains("Style: Speaker_A,"));
        assert!(ass.contains("Style: Speaker_B,"));
        assert!(ass.contains("Dialogue: 0,0:00:00.00,0:00:02.50,Speaker_A,A,0,0,0,,Hallo Welt.\n"));
        assert!(ass.contains("0:00:02.60,0:00:05.00,Speaker_B,B,0,0,0,,Das ist ein Test\\Nmit zwei Zeilen.\n"));
    }

    #[test]
    fn test_ass_sub_centisecond_cue_keeps_duration() {
        let cues = vec![cue(1224, 1225, &["kurz"], None), cue(1230, 1290, &["normal"], None)];
        let ass = emit_str(&cues, SubtitleFormat::Ass);
        assert!(ass.contains("Dialogue: 0,0:00:01.22,0:00:01.23,Default,"));
        assert!(ass.contains("Dialogue: 0,0:00:01.23,0:00:01.29,Default,"));
    }

    #[test]
    fn test_vtt_voice_name_is_escaped() {
        let cues = vec![cue(0, 1000, &["Hi"], Some("Dr. <X>\nJones"))];
        let vtt = emit_str(&cues, SubtitleFormat::Vtt);
        assert!(vtt.contains("<v Dr. &lt;X&gt; Jones>Hi\n"));
    }

    #[test]
    fn test_ass_speaker_styles_disabled() {
        let options = EmitOptions {
            ass_speaker_styles: false,
            ..Default::default()
        };
        let ass = String::from_utf8(emit(&sample(), SubtitleFormat::Ass, &options)).unwrap();
        assert!(!ass.contains("Speaker_A"));
        assert!(ass.contains(",Default,A,"));
    }

    #[test]
    fn test_empty_cue_emits_timing() {
        let srt = emit_str(&[cue(0, 1000, &[], None)], SubtitleFormat::Srt);
        assert_eq!(srt, "1\n00:00:00,000 --> 00:00:01,000\n\n");
    }

    #[test]
    fn test_parse_format() {
        assert_eq!("srt".parse::<SubtitleFormat>().unwrap(), SubtitleFormat::Srt);
        assert_eq!("WebVTT".parse::<SubtitleFormat>().unwrap(), SubtitleFormat::Vtt);
        assert_eq!("ssa".parse::<SubtitleFormat>().unwrap(), SubtitleFormat::Ass);
        assert!(matches!("sub".parse::<SubtitleFormat>(), Err(TekstingError::Format(_))));
        assert_eq!(
            SubtitleFormat::from_path(std::path::Path::new("out/movie.de.vtt")).unwrap(),
            SubtitleFormat::Vtt
        );
    }

    #[test]
    fn test_emit_all_reports_unsupported() {
        let formats = vec!["srt".to_string(), "sub".to_string(), "ass".to_string(), "SRT".to_string()];
        let (outputs, warnings) = emit_all(&sample(), &formats, &EmitOptions::default());

        let produced: Vec<SubtitleFormat> = outputs.iter().map(|(f, _)| *f).collect();
        assert_eq!(produced, vec![SubtitleFormat::Srt, SubtitleFormat::Ass]);
        assert_eq!(warnings.len(), 1);
        assert!(matches!(&warnings[0], SyncWarning::UnsupportedFormat { format, .. } if format == "sub"));
    }
}
