//! AssemblyAI transcription client.
//!
//! Uploads local audio, submits a transcript request with the configured
//! feature flags and polls until the transcript is ready.

use super::{Transcriber, WordTimeline};
use crate::config::{AsrFeature, TranscriptionSettings};
use crate::error::{Result, TekstingError};
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument};

/// Environment variable holding the AssemblyAI API key.
pub const API_KEY_ENV: &str = "ASSEMBLYAI_API_KEY";

/// AssemblyAI-based transcriber producing word-level timelines.
pub struct AssemblyAiTranscriber {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    features: Vec<AsrFeature>,
    language: String,
    poll_interval: Duration,
    timeout: Duration,
}

impl AssemblyAiTranscriber {
    /// Create a transcriber from settings, reading the key from the environment.
    pub fn from_settings(settings: &TranscriptionSettings) -> Result<Self> {
        let api_key = std::env::var(API_KEY_ENV)
            .ok()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| TekstingError::Config(format!("{} not set", API_KEY_ENV)))?;

        Self::with_config(settings, api_key)
    }

    /// Create a transcriber with an explicit API key.
    pub fn with_config(settings: &TranscriptionSettings, api_key: String) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(300))
            .build()?;

        Ok(Self {
            http,
            api_key,
            base_url: settings.api_url.trim_end_matches('/').to_string(),
            features: settings.features.clone(),
            language: settings.language.clone(),
            poll_interval: Duration::from_secs(settings.poll_interval_secs.max(1)),
            timeout: Duration::from_secs(settings.timeout_secs),
        })
    }

    /// Build the transcript request body for an uploaded audio URL.
    pub fn request_body(&self, audio_url: &str) -> Value {
        let mut body = Map::new();
        body.insert("audio_url".into(), json!(audio_url));

        for feature in AsrFeature::ALL {
            body.insert(
                feature.api_field().into(),
                json!(self.features.contains(&feature)),
            );
        }

        // An explicit language overrides detection.
        if self.language != "auto" {
            body.insert("language_code".into(), json!(self.language));
            body.insert("language_detection".into(), json!(false));
        }

        Value::Object(body)
    }

    /// Upload a local file and return the service-side URL.
    #[instrument(skip(self), fields(audio_path = %audio_path.display()))]
    pub async fn upload(&self, audio_path: &Path) -> Result<String> {
        let bytes = tokio::fs::read(audio_path).await?;
        debug!("Uploading {} bytes", bytes.len());

        let response: Value = self
            .http
            .post(format!("{}/v2/upload", self.base_url))
            .header("authorization", &self.api_key)
            .body(bytes)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        response
            .get("upload_url")
            .and_then(|u| u.as_str())
            .map(str::to_string)
            .ok_or_else(|| TekstingError::Transcription("upload response missing upload_url".into()))
    }

    /// Submit a transcript request and return its id.
    pub async fn submit(&self, audio_url: &str) -> Result<String> {
        let response: Value = self
            .http
            .post(format!("{}/v2/transcript", self.base_url))
            .header("authorization", &self.api_key)
            .json(&self.request_body(audio_url))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        response
            .get("id")
            .and_then(|id| id.as_str())
            .map(str::to_string)
            .ok_or_else(|| TekstingError::Transcription("transcript response missing id".into()))
    }

    /// Fetch a transcript once, whatever its status.
    pub async fn fetch(&self, transcript_id: &str) -> Result<Value> {
        Ok(self
            .http
            .get(format!("{}/v2/transcript/{}", self.base_url, transcript_id))
            .header("authorization", &self.api_key)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?)
    }

    /// Poll a transcript until it completes, fails or times out.
    #[instrument(skip(self))]
    pub async fn wait(&self, transcript_id: &str) -> Result<Value> {
        let started = Instant::now();

        loop {
            let transcript = self.fetch(transcript_id).await?;
            let status = transcript.get("status").and_then(|s| s.as_str()).unwrap_or("");

            match status {
                "completed" => return Ok(transcript),
                "error" => {
                    let message = transcript
                        .get("error")
                        .and_then(|e| e.as_str())
                        .unwrap_or("unknown error");
                    return Err(TekstingError::Transcription(message.to_string()));
                }
                _ => debug!("Transcript {} status: {}", transcript_id, status),
            }

            if started.elapsed() > self.timeout {
                return Err(TekstingError::Transcription(format!(
                    "transcript {} not ready after {}s",
                    transcript_id,
                    self.timeout.as_secs()
                )));
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Fetch a finished transcript by id and parse it.
    pub async fn timeline_for(&self, transcript_id: &str) -> Result<WordTimeline> {
        let transcript = self.wait(transcript_id).await?;
        WordTimeline::from_value(transcript)
    }
}

#[async_trait]
impl Transcriber for AssemblyAiTranscriber {
    async fn transcribe(&self, audio_path: &Path) -> Result<WordTimeline> {
        let audio_url = self.upload(audio_path).await?;
        let transcript_id = self.submit(&audio_url).await?;
        info!("Submitted transcript {}", transcript_id);

        let timeline = self.timeline_for(&transcript_id).await?;
        info!(
            "Transcript {} ready: {} words, {}ms",
            transcript_id,
            timeline.len(),
            timeline.duration_ms()
        );
        Ok(timeline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transcriber(settings: &TranscriptionSettings) -> AssemblyAiTranscriber {
        AssemblyAiTranscriber::with_config(settings, "test-key".to_string()).unwrap()
    }

    #[test]
    fn test_request_body_features() {
        let settings = TranscriptionSettings {
            features: vec![AsrFeature::SpeakerLabels, AsrFeature::AutoHighlights],
            ..Default::default()
        };
        let body = transcriber(&settings).request_body("https://cdn/audio");

        assert_eq!(body["audio_url"], "https://cdn/audio");
        assert_eq!(body["speaker_labels"], true);
        assert_eq!(body["auto_highlights"], true);
        assert_eq!(body["content_safety"], false);
        assert!(body.get("language_code").is_none());
    }

    #[test]
    fn test_request_body_explicit_language() {
        let settings = TranscriptionSettings {
            language: "pl".to_string(),
            ..Default::default()
        };
        let body = transcriber(&settings).request_body("u");

        assert_eq!(body["language_code"], "pl");
        assert_eq!(body["language_detection"], false);
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let settings = TranscriptionSettings {
            api_url: "https://example.test/".to_string(),
            ..Default::default()
        };
        assert_eq!(transcriber(&settings).base_url, "https://example.test");
    }
}
