//! Passthrough translator for re-timing source text without translating it.

use super::Translator;
use crate::error::Result;
use async_trait::async_trait;

/// Returns its input unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityTranslator;

#[async_trait]
impl Translator for IdentityTranslator {
    async fn translate(&self, text: &str, _source_lang: Option<&str>, _target_lang: &str) -> Result<String> {
        Ok(text.to_string())
    }

    fn name(&self) -> &str {
        "none"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_identity() {
        let out = IdentityTranslator.translate("Hello there.", Some("EN"), "DE").await.unwrap();
        assert_eq!(out, "Hello there.");
    }
}
