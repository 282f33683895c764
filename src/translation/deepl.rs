//! DeepL REST API translator.

use super::Translator;
use crate::config::TranslationSettings;
use crate::error::{Result, TekstingError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

/// Environment variable holding the DeepL API key.
pub const DEEPL_API_KEY_ENV: &str = "DEEPL_API_KEY";

/// Targets that DeepL only accepts with a regional variant.
const TARGET_VARIANTS: [(&str, &str); 3] = [("EN", "EN-US"), ("PT", "PT-PT"), ("ZH", "ZH-HANS")];

/// Targets that accept a formality setting.
const FORMALITY_LANGUAGES: [&str; 10] = ["DE", "FR", "IT", "ES", "NL", "PL", "PT", "PT-PT", "PT-BR", "RU"];

/// Map a target language code to the form DeepL expects.
pub fn deepl_target_code(code: &str) -> String {
    let upper = code.trim().to_uppercase();
    TARGET_VARIANTS
        .iter()
        .find(|(base, _)| *base == upper)
        .map(|(_, variant)| variant.to_string())
        .unwrap_or(upper)
}

/// Source languages are given without a regional variant.
pub fn deepl_source_code(code: &str) -> String {
    let upper = code.trim().to_uppercase().replace('_', "-");
    upper.split('-').next().unwrap_or(&upper).to_string()
}

fn supports_formality(target: &str) -> bool {
    FORMALITY_LANGUAGES.contains(&target.to_uppercase().as_str())
}

#[derive(Serialize)]
struct TranslateRequest<'a> {
    text: [&'a str; 1],
    target_lang: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    source_lang: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    formality: Option<&'a str>,
    preserve_formatting: bool,
}

#[derive(Deserialize)]
struct TranslateResponse {
    translations: Vec<Translation>,
}

#[derive(Deserialize)]
struct Translation {
    text: String,
    #[serde(default)]
    detected_source_language: Option<String>,
}

/// DeepL-based translator.
pub struct DeeplTranslator {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    formality: String,
}

impl DeeplTranslator {
    /// Create a translator from settings, reading the key from the environment.
    pub fn from_settings(settings: &TranslationSettings) -> Result<Self> {
        let api_key = std::env::var(DEEPL_API_KEY_ENV)
            .ok()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| TekstingError::Config(format!("{} not set", DEEPL_API_KEY_ENV)))?;

        Self::with_config(&settings.deepl_api_url, api_key, &settings.formality)
    }

    pub fn with_config(base_url: &str, api_key: String, formality: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;

        Ok(Self {
            http,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            formality: formality.to_string(),
        })
    }

    fn request<'a>(&'a self, text: &'a str, source_lang: Option<&str>, target_lang: &str) -> TranslateRequest<'a> {
        let target = deepl_target_code(target_lang);
        let formality = (self.formality != "default" && supports_formality(&target))
            .then_some(self.formality.as_str());

        TranslateRequest {
            text: [text],
            source_lang: source_lang.map(deepl_source_code),
            target_lang: target,
            formality,
            preserve_formatting: true,
        }
    }
}

#[async_trait]
impl Translator for DeeplTranslator {
    #[instrument(skip(self, text), fields(chars = text.len()))]
    async fn translate(&self, text: &str, source_lang: Option<&str>, target_lang: &str) -> Result<String> {
        let request = self.request(text, source_lang, target_lang);

        let response = self
            .http
            .post(format!("{}/v2/translate", self.base_url))
            .header("Authorization", format!("DeepL-Auth-Key {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| TekstingError::Adapter(format!("DeepL request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // 456 is DeepL's quota exceeded status.
            return Err(TekstingError::Adapter(format!("DeepL returned {}: {}", status, body)));
        }

        let parsed: TranslateResponse = response
            .json()
            .await
            .map_err(|e| TekstingError::Adapter(format!("invalid DeepL response: {}", e)))?;

        let translation = parsed
            .translations
            .into_iter()
            .next()
            .ok_or_else(|| TekstingError::Adapter("DeepL returned no translations".into()))?;

        if let Some(detected) = &translation.detected_source_language {
            debug!("DeepL detected source language {}", detected);
        }
        Ok(translation.text)
    }

    fn name(&self) -> &str {
        "deepl"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn translator(formality: &str) -> DeeplTranslator {
        DeeplTranslator::with_config("https://api-free.deepl.com/", "key".into(), formality).unwrap()
    }

    #[test]
    fn test_language_codes() {
        assert_eq!(deepl_target_code("en"), "EN-US");
        assert_eq!(deepl_target_code("PT"), "PT-PT");
        assert_eq!(deepl_target_code("zh"), "ZH-HANS");
        assert_eq!(deepl_target_code("pl"), "PL");
        assert_eq!(deepl_source_code("en_us"), "EN");
        assert_eq!(deepl_source_code("de"), "DE");
    }

    #[test]
    fn test_request_formality_only_where_supported() {
        let t = translator("more");
        let de = serde_json::to_value(t.request("Hi", None, "de")).unwrap();
        assert_eq!(de["formality"], "more");
        assert_eq!(de["target_lang"], "DE");
        assert!(de.get("source_lang").is_none());

        let ja = serde_json::to_value(t.request("Hi", Some("en"), "ja")).unwrap();
        assert!(ja.get("formality").is_none());
        assert_eq!(ja["source_lang"], "EN");
        assert_eq!(ja["text"][0], "Hi");
    }

    #[test]
    fn test_default_formality_omitted() {
        let req = serde_json::to_value(translator("default").request("Hi", None, "fr")).unwrap();
        assert!(req.get("formality").is_none());
        assert_eq!(translator("default").base_url, "https://api-free.deepl.com");
    }
}
