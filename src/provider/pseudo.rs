//! Offline pseudo-localization.
//!
//! Produces `[fr] Hello world` for every target so the shape of a translated
//! document can be inspected without network access or credentials.

use crate::provider::{ProviderError, ProviderRequest, TranslationProvider};
use async_trait::async_trait;

#[derive(Debug, Clone, Default)]
pub struct PseudoProvider {
    /// Language codes that always fail, to exercise fallback paths
    failing: Vec<String>,
}

impl PseudoProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make requests for `language` fail with [`ProviderError::Rejected`].
    pub fn failing_for(mut self, language: impl Into<String>) -> Self {
        self.failing.push(language.into());
        self
    }
}

#[async_trait]
impl TranslationProvider for PseudoProvider {
    fn name(&self) -> &str {
        "pseudo"
    }

    async fn translate(
        &self,
        request: &ProviderRequest<'_>,
        target: &str,
    ) -> Result<String, ProviderError> {
        if self.failing.iter().any(|code| code == target) {
            return Err(ProviderError::Rejected(format!(
                "pseudo provider configured to fail for '{}'",
                target
            )));
        }
        Ok(format!("[{}] {}", target, request.text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::BatchHints;

    fn request(text: &str) -> ProviderRequest<'_> {
        ProviderRequest {
            text,
            source: "en",
            fast: true,
            hints: BatchHints::default(),
        }
    }

    #[tokio::test]
    async fn test_pseudo_translation_prefixes_language() {
        let provider = PseudoProvider::new();
        let result = provider.translate(&request("Hello world"), "fr").await.unwrap();
        assert_eq!(result, "[fr] Hello world");
    }

    #[tokio::test]
    async fn test_failing_language_is_rejected() {
        let provider = PseudoProvider::new().failing_for("hi");
        assert!(provider.translate(&request("Hello"), "fr").await.is_ok());
        assert!(matches!(
            provider.translate(&request("Hello"), "hi").await,
            Err(ProviderError::Rejected(_))
        ));
    }

    #[tokio::test]
    async fn test_batch_uses_default_per_target_calls() {
        let provider = PseudoProvider::new();
        let targets = vec!["fr".to_string(), "de".to_string()];
        let result = provider.translate_batch(&request("Hi"), &targets).await.unwrap();
        assert_eq!(result["de"], "[de] Hi");
    }
}
