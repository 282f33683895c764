//! Machine translation adapters.
//!
//! Translation runs in external services; this module defines the boundary
//! the synchronizer talks to and thin clients for the supported providers.

mod deepl;
mod identity;
mod openai;
mod retry;

pub use deepl::{DeeplTranslator, DEEPL_API_KEY_ENV};
pub use identity::IdentityTranslator;
pub use openai::OpenAITranslator;
pub use retry::{RetryPolicy, RetryOutcome};

use crate::config::{Settings, TranslationProvider};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Trait for translation services.
///
/// Implementations return `TekstingError::Adapter` for network, quota or
/// service failures so the caller can retry.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `text` into `target_lang`. `source_lang` of None lets the
    /// service detect the language.
    async fn translate(&self, text: &str, source_lang: Option<&str>, target_lang: &str) -> Result<String>;

    /// Short provider name for logs and reports.
    fn name(&self) -> &str;
}

/// Create the translator selected in settings.
pub fn create_translator(settings: &Settings) -> Result<Arc<dyn Translator>> {
    let translator: Arc<dyn Translator> = match settings.translation.provider {
        TranslationProvider::Deepl => Arc::new(DeeplTranslator::from_settings(&settings.translation)?),
        TranslationProvider::Openai => Arc::new(OpenAITranslator::new(&settings.translation.openai_model)?),
        TranslationProvider::None => Arc::new(IdentityTranslator),
    };
    Ok(translator)
}
