//! Translation of a single leaf string into every configured language.
//!
//! Provider failures never escape this module: an affected language falls back
//! to the source text and the failure is logged.

use crate::i18n::{LanguageSet, TranslationMetrics};
use crate::provider::{BatchHints, ProviderRequest, TranslationProvider};
use crate::value::MultilingualValue;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::warn;

/// How a leaf's target languages are requested from the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// One request per leaf covering every target language
    #[default]
    Batched,
    /// One request per target language; failures are isolated per language
    PerLanguage,
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "batched" | "batch" => Ok(Strategy::Batched),
            "per-language" | "per_language" => Ok(Strategy::PerLanguage),
            other => Err(format!(
                "unknown strategy '{}', expected 'batched' or 'per-language'",
                other
            )),
        }
    }
}

/// Result of translating one leaf.
#[derive(Debug, Clone, PartialEq)]
pub struct LeafTranslation {
    pub value: MultilingualValue,
    /// Number of target languages that fell back to the source text
    pub fallbacks: usize,
}

/// Produce a [`MultilingualValue`] holding exactly the languages of `languages`.
///
/// The source entry is always `text` verbatim.
pub async fn translate_leaf(
    provider: &dyn TranslationProvider,
    text: &str,
    languages: &LanguageSet,
    strategy: Strategy,
    fast: bool,
    hints: BatchHints,
) -> LeafTranslation {
    let metrics = TranslationMetrics::global();
    let mut value = MultilingualValue::new();
    value.insert(languages.source(), text);

    let targets = languages.targets();
    if targets.is_empty() {
        return LeafTranslation {
            value,
            fallbacks: 0,
        };
    }

    let request = ProviderRequest {
        text,
        source: languages.source(),
        fast,
        hints,
    };
    let mut fallbacks = 0;

    match strategy {
        Strategy::Batched => {
            // The provider records the requests a batch expands into.
            match provider.translate_batch(&request, &targets).await {
                Ok(mut translations) => {
                    for target in &targets {
                        match translations.remove(target) {
                            Some(translated) => value.insert(target.as_str(), translated),
                            None => {
                                warn!(
                                    "{} returned no '{}' translation, using source text",
                                    provider.name(),
                                    target
                                );
                                value.insert(target.as_str(), text);
                                fallbacks += 1;
                            }
                        }
                    }
                }
                Err(e) => {
                    warn!(
                        "{} failed to translate into {:?}, using source text: {}",
                        provider.name(),
                        targets,
                        e
                    );
                    for target in &targets {
                        value.insert(target.as_str(), text);
                    }
                    fallbacks = targets.len();
                }
            }
        }
        Strategy::PerLanguage => {
            for target in &targets {
                metrics.record_provider_call();
                match provider.translate(&request, target).await {
                    Ok(translated) => value.insert(target.as_str(), translated),
                    Err(e) => {
                        metrics.record_provider_failure();
                        warn!(
                            "{} failed to translate into '{}', using source text: {}",
                            provider.name(),
                            target,
                            e
                        );
                        value.insert(target.as_str(), text);
                        fallbacks += 1;
                    }
                }
            }
        }
    }

    metrics.record_fallbacks(fallbacks);
    LeafTranslation { value, fallbacks }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{PseudoProvider, ProviderError};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Batch-capable provider that can drop or fail languages.
    #[derive(Default)]
    struct ScriptedProvider {
        batch_calls: AtomicUsize,
        single_calls: AtomicUsize,
        fail_batch: bool,
        omit: Option<&'static str>,
    }

    #[async_trait]
    impl TranslationProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn translate(
            &self,
            request: &ProviderRequest<'_>,
            target: &str,
        ) -> Result<String, ProviderError> {
            self.single_calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("{}-{}", target, request.text))
        }

        async fn translate_batch(
            &self,
            request: &ProviderRequest<'_>,
            targets: &[String],
        ) -> Result<HashMap<String, String>, ProviderError> {
            self.batch_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_batch {
                return Err(ProviderError::Api {
                    status: 503,
                    body: "unavailable".into(),
                });
            }
            Ok(targets
                .iter()
                .filter(|t| Some(t.as_str()) != self.omit)
                .map(|t| (t.clone(), format!("{}-{}", t, request.text)))
                .collect())
        }
    }

    fn languages() -> LanguageSet {
        LanguageSet::new(["en", "fr", "hi", "de"], "en").unwrap()
    }

    fn assert_exact_keys(value: &MultilingualValue, languages: &LanguageSet) {
        let mut keys: Vec<_> = value.languages().map(str::to_string).collect();
        let mut expected = languages.languages().to_vec();
        keys.sort();
        expected.sort();
        assert_eq!(keys, expected);
    }

    #[test]
    fn test_strategy_from_str() {
        assert_eq!("batched".parse::<Strategy>().unwrap(), Strategy::Batched);
        assert_eq!("Per-Language".parse::<Strategy>().unwrap(), Strategy::PerLanguage);
        assert_eq!("per_language".parse::<Strategy>().unwrap(), Strategy::PerLanguage);
        assert!("parallel".parse::<Strategy>().is_err());
    }

    #[test]
    fn test_strategy_default_is_batched() {
        assert_eq!(Strategy::default(), Strategy::Batched);
    }

    #[tokio::test]
    async fn test_batched_uses_one_call_per_leaf() {
        let provider = ScriptedProvider::default();
        let langs = languages();

        let result = translate_leaf(&provider, "Hello", &langs, Strategy::Batched, false, BatchHints::default()).await;

        assert_eq!(provider.batch_calls.load(Ordering::SeqCst), 1);
        assert_eq!(provider.single_calls.load(Ordering::SeqCst), 0);
        assert_eq!(result.value.get("en"), Some("Hello"));
        assert_eq!(result.value.get("fr"), Some("fr-Hello"));
        assert_eq!(result.fallbacks, 0);
        assert_exact_keys(&result.value, &langs);
    }

    #[tokio::test]
    async fn test_batched_failure_falls_back_everywhere() {
        let provider = ScriptedProvider {
            fail_batch: true,
            ..Default::default()
        };
        let langs = languages();

        let result = translate_leaf(&provider, "Hello", &langs, Strategy::Batched, false, BatchHints::default()).await;

        for lang in langs.languages() {
            assert_eq!(result.value.get(lang), Some("Hello"));
        }
        assert_eq!(result.fallbacks, 3);
    }

    #[tokio::test]
    async fn test_batched_missing_language_falls_back_alone() {
        let provider = ScriptedProvider {
            omit: Some("hi"),
            ..Default::default()
        };
        let langs = languages();

        let result = translate_leaf(&provider, "Hello", &langs, Strategy::Batched, false, BatchHints::default()).await;

        assert_eq!(result.value.get("hi"), Some("Hello"));
        assert_eq!(result.value.get("de"), Some("de-Hello"));
        assert_eq!(result.fallbacks, 1);
        assert_exact_keys(&result.value, &langs);
    }

    #[tokio::test]
    async fn test_batched_default_batch_isolates_failures() {
        let provider = PseudoProvider::new().failing_for("hi");
        let langs = languages();

        let result = translate_leaf(&provider, "Hello", &langs, Strategy::Batched, false, BatchHints::default()).await;

        assert_eq!(result.value.get("fr"), Some("[fr] Hello"));
        assert_eq!(result.value.get("de"), Some("[de] Hello"));
        assert_eq!(result.value.get("hi"), Some("Hello"));
        assert_eq!(result.fallbacks, 1);
        assert_exact_keys(&result.value, &langs);
    }

    #[tokio::test]
    async fn test_per_language_isolates_failures() {
        let provider = PseudoProvider::new().failing_for("hi");
        let langs = languages();

        let result = translate_leaf(&provider, "Hello", &langs, Strategy::PerLanguage, false, BatchHints::default()).await;

        assert_eq!(result.value.get("fr"), Some("[fr] Hello"));
        assert_eq!(result.value.get("de"), Some("[de] Hello"));
        assert_eq!(result.value.get("hi"), Some("Hello"));
        assert_eq!(result.fallbacks, 1);
    }

    #[tokio::test]
    async fn test_source_only_makes_no_calls() {
        let provider = ScriptedProvider::default();
        let langs = LanguageSet::new(["en"], "en").unwrap();

        let result = translate_leaf(&provider, "Hello", &langs, Strategy::Batched, false, BatchHints::default()).await;

        assert_eq!(result.value.len(), 1);
        assert_eq!(result.value.get("en"), Some("Hello"));
        assert_eq!(provider.batch_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_source_entry_is_verbatim() {
        let provider = PseudoProvider::new();
        let langs = languages();
        let text = "  Hello, *world*!  ";

        let result = translate_leaf(&provider, text, &langs, Strategy::PerLanguage, true, BatchHints::default()).await;

        assert_eq!(result.value.get("en"), Some(text));
    }
}
