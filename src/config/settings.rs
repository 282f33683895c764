//! Configuration settings for Teksting.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub sync: SyncSettings,
    pub translation: TranslationSettings,
    pub transcription: TranscriptionSettings,
    pub output: OutputSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Directory for temporary files (extracted audio, subtitle files for ffmpeg).
    pub temp_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.teksting".to_string(),
            temp_dir: "/tmp/teksting".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Subtitle synchronization settings: segmentation, re-timing and retries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SyncSettings {
    /// Maximum characters on one subtitle line.
    pub max_chars_per_line: usize,
    /// Maximum characters in one cue (all lines).
    pub max_chars_per_cue: usize,
    /// Minimum time a cue stays on screen.
    pub min_display_ms: u64,
    /// Maximum time a cue stays on screen.
    pub max_display_ms: u64,
    /// Pause between words that forces a new segment.
    pub silence_split_ms: u64,
    /// Gap inserted between consecutive cues.
    pub inter_cue_gap_ms: u64,
    /// Retries per segment after a failed translation.
    pub retry_limit: u32,
    /// Base delay for exponential retry backoff.
    pub retry_base_delay_ms: u64,
    /// Timeout for a single translation call.
    pub translate_timeout_secs: u64,
    /// Maximum concurrent segment translations.
    pub max_concurrent: usize,
    /// Mean word confidence below which a segment is flagged.
    pub min_confidence: f32,
    /// Reading speed above which a cue is flagged by `check`.
    pub max_chars_per_second: f64,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            max_chars_per_line: 42,
            max_chars_per_cue: 84,
            min_display_ms: 800,
            max_display_ms: 7000,
            silence_split_ms: 2000,
            inter_cue_gap_ms: 100,
            retry_limit: 2,
            retry_base_delay_ms: 500,
            translate_timeout_secs: 30,
            max_concurrent: 4,
            min_confidence: 0.7,
            max_chars_per_second: 20.0,
        }
    }
}

impl SyncSettings {
    /// Check that the limits are internally consistent.
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::TekstingError;

        if self.max_chars_per_line == 0 {
            return Err(TekstingError::Config("max_chars_per_line must be positive".into()));
        }
        if self.max_chars_per_cue < self.max_chars_per_line {
            return Err(TekstingError::Config(format!(
                "max_chars_per_cue ({}) must be at least max_chars_per_line ({})",
                self.max_chars_per_cue, self.max_chars_per_line
            )));
        }
        if self.min_display_ms > self.max_display_ms {
            return Err(TekstingError::Config(format!(
                "min_display_ms ({}) exceeds max_display_ms ({})",
                self.min_display_ms, self.max_display_ms
            )));
        }
        if self.max_concurrent == 0 {
            return Err(TekstingError::Config("max_concurrent must be positive".into()));
        }
        Ok(())
    }
}

/// Machine translation provider.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TranslationProvider {
    /// DeepL REST API (default).
    #[default]
    Deepl,
    /// OpenAI chat completion model.
    Openai,
    /// No translation: re-time the source text.
    None,
}

impl std::str::FromStr for TranslationProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "deepl" => Ok(TranslationProvider::Deepl),
            "openai" | "gpt" => Ok(TranslationProvider::Openai),
            "none" | "identity" => Ok(TranslationProvider::None),
            _ => Err(format!("Unknown translation provider: {}", s)),
        }
    }
}

impl std::fmt::Display for TranslationProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TranslationProvider::Deepl => write!(f, "deepl"),
            TranslationProvider::Openai => write!(f, "openai"),
            TranslationProvider::None => write!(f, "none"),
        }
    }
}

/// Translation service settings. API keys are read from the environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationSettings {
    pub provider: TranslationProvider,
    /// Source language code. None lets the provider detect it.
    pub source_language: Option<String>,
    /// Default target language code (e.g. "DE", "PL").
    pub target_language: String,
    /// DeepL formality ("default", "more", "less").
    pub formality: String,
    /// DeepL API base URL (free-tier keys use api-free.deepl.com).
    pub deepl_api_url: String,
    /// Model for the OpenAI provider.
    pub openai_model: String,
}

impl Default for TranslationSettings {
    fn default() -> Self {
        Self {
            provider: TranslationProvider::Deepl,
            source_language: None,
            target_language: "EN".to_string(),
            formality: "default".to_string(),
            deepl_api_url: "https://api-free.deepl.com".to_string(),
            openai_model: "gpt-4o-mini".to_string(),
        }
    }
}

/// Optional analysis features offered by the ASR service.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum AsrFeature {
    LanguageDetection,
    Punctuate,
    FormatText,
    SpeakerLabels,
    AutoChapters,
    EntityDetection,
    SentimentAnalysis,
    AutoHighlights,
    ContentSafety,
    IabCategories,
}

impl AsrFeature {
    /// All recognised features.
    pub const ALL: [AsrFeature; 10] = [
        AsrFeature::LanguageDetection,
        AsrFeature::Punctuate,
        AsrFeature::FormatText,
        AsrFeature::SpeakerLabels,
        AsrFeature::AutoChapters,
        AsrFeature::EntityDetection,
        AsrFeature::SentimentAnalysis,
        AsrFeature::AutoHighlights,
        AsrFeature::ContentSafety,
        AsrFeature::IabCategories,
    ];

    /// Request field name used by the ASR API.
    pub fn api_field(&self) -> &'static str {
        match self {
            AsrFeature::LanguageDetection => "language_detection",
            AsrFeature::Punctuate => "punctuate",
            AsrFeature::FormatText => "format_text",
            AsrFeature::SpeakerLabels => "speaker_labels",
            AsrFeature::AutoChapters => "auto_chapters",
            AsrFeature::EntityDetection => "entity_detection",
            AsrFeature::SentimentAnalysis => "sentiment_analysis",
            AsrFeature::AutoHighlights => "auto_highlights",
            AsrFeature::ContentSafety => "content_safety",
            AsrFeature::IabCategories => "iab_categories",
        }
    }
}

impl std::str::FromStr for AsrFeature {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        AsrFeature::ALL
            .into_iter()
            .find(|f| f.api_field() == normalized)
            .ok_or_else(|| format!("Unknown ASR feature: {}", s))
    }
}

/// Speech recognition service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionSettings {
    /// AssemblyAI API base URL.
    pub api_url: String,
    /// Enabled ASR features.
    pub features: Vec<AsrFeature>,
    /// Language code, or "auto" for detection.
    pub language: String,
    /// Seconds between transcript status polls.
    pub poll_interval_secs: u64,
    /// Maximum time to wait for a transcript.
    pub timeout_secs: u64,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            api_url: "https://api.assemblyai.com".to_string(),
            features: vec![
                AsrFeature::LanguageDetection,
                AsrFeature::Punctuate,
                AsrFeature::FormatText,
                AsrFeature::SpeakerLabels,
            ],
            language: "auto".to_string(),
            poll_interval_secs: 3,
            timeout_secs: 1800,
        }
    }
}

impl TranscriptionSettings {
    /// Check if a feature is enabled.
    pub fn has_feature(&self, feature: AsrFeature) -> bool {
        self.features.contains(&feature)
    }
}

/// Subtitle output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Formats written by default (srt, vtt, ass).
    pub formats: Vec<String>,
    /// Font used in ASS styles.
    pub ass_font: String,
    /// Font size used in ASS styles.
    pub ass_font_size: u32,
    /// Colour-code speakers with separate ASS styles.
    pub ass_speaker_styles: bool,
    /// Render speakers as WebVTT voice tags.
    pub vtt_voice_tags: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            formats: vec!["srt".to_string()],
            ass_font: "Arial".to_string(),
            ass_font_size: 20,
            ass_speaker_styles: true,
            vtt_voice_tags: true,
        }
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        let settings = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str::<Settings>(&content)?
        } else {
            Settings::default()
        };

        settings.sync.validate()?;
        Ok(settings)
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::TekstingError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("teksting")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded temp directory path.
    pub fn temp_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.temp_dir)
    }
}
