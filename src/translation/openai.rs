//! Translation through an OpenAI chat model.

use super::Translator;
use crate::error::{Result, TekstingError};
use crate::openai::create_client;
use async_openai::types::{
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Chat-model translator.
pub struct OpenAITranslator {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
}

impl OpenAITranslator {
    pub fn new(model: &str) -> Result<Self> {
        Ok(Self {
            client: create_client()?,
            model: model.to_string(),
        })
    }

    fn system_prompt(source_lang: Option<&str>, target_lang: &str) -> String {
        let source = match source_lang {
            Some(lang) => format!("from {} ", lang),
            None => String::new(),
        };
        format!(
            "You translate subtitle text {}into {}. \
             Reply with the translation only, keeping the meaning and tone. \
             Do not add quotes, notes or line breaks.",
            source, target_lang
        )
    }
}

#[async_trait]
impl Translator for OpenAITranslator {
    #[instrument(skip(self, text), fields(model = %self.model, chars = text.len()))]
    async fn translate(&self, text: &str, source_lang: Option<&str>, target_lang: &str) -> Result<String> {
        let adapter = |e: async_openai::error::OpenAIError| TekstingError::Adapter(e.to_string());

        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(Self::system_prompt(source_lang, target_lang))
                .build()
                .map_err(adapter)?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(text)
                .build()
                .map_err(adapter)?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(0.0)
            .build()
            .map_err(adapter)?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| TekstingError::Adapter(format!("OpenAI translation failed: {}", e)))?;

        let translated = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .map(|c| c.trim().to_string())
            .ok_or_else(|| TekstingError::Adapter("Empty response from OpenAI".to_string()))?;

        debug!("Translated {} chars", translated.len());
        Ok(translated)
    }

    fn name(&self) -> &str {
        "openai"
    }
}
