use crate::config::Config;
use crate::i18n::{LanguageError, LanguageSet};
use crate::path::{ExclusionSet, PatternError};
use crate::provider::{BatchHints, OpenAiProvider, TranslationProvider};
use crate::translation::Strategy;
use crate::traverse::{self, ProgressCallback, TranslationOutcome, TranslationRequest};
use crate::value::Value;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Configuration mistakes surfaced by [`Mango::translate`]. Provider failures
/// never appear here.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MangoError {
    #[error(transparent)]
    Pattern(#[from] PatternError),

    #[error(transparent)]
    Language(#[from] LanguageError),
}

/// Per-call options.
#[derive(Clone, Default)]
pub struct TranslateOptions {
    exclude: Vec<String>,
    fast: bool,
    on_progress: Option<ProgressCallback>,
    languages: Option<LanguageSet>,
}

impl TranslateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Paths that keep their original value, in addition to the client defaults.
    pub fn exclude<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude.extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Ask the provider to prefer speed over quality.
    pub fn fast(mut self, fast: bool) -> Self {
        self.fast = fast;
        self
    }

    pub fn on_progress(mut self, callback: impl Fn(u8) + Send + Sync + 'static) -> Self {
        self.on_progress = Some(Arc::new(callback));
        self
    }

    /// Translate into these languages instead of the client's.
    pub fn languages(mut self, languages: LanguageSet) -> Self {
        self.languages = Some(languages);
        self
    }
}

impl fmt::Debug for TranslateOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranslateOptions")
            .field("exclude", &self.exclude)
            .field("fast", &self.fast)
            .field("on_progress", &self.on_progress.is_some())
            .field("languages", &self.languages)
            .finish()
    }
}

/// Multilingual translation client.
///
/// ```rust,ignore
/// let mango = Mango::new(LanguageSet::new(["en", "hi", "fr"], "en")?, Arc::new(provider));
/// let translated = mango
///     .translate(&data, TranslateOptions::new().exclude(["id", "user.email"]))
///     .await?;
/// // { id: 1, name: { en: "Apple", hi: "सेब", fr: "Pomme" } }
/// ```
#[derive(Clone)]
pub struct Mango {
    languages: LanguageSet,
    provider: Arc<dyn TranslationProvider>,
    strategy: Strategy,
    hints: BatchHints,
    default_exclusions: Vec<String>,
}

impl Mango {
    pub fn new(languages: LanguageSet, provider: Arc<dyn TranslationProvider>) -> Self {
        Self {
            languages,
            provider,
            strategy: Strategy::default(),
            hints: BatchHints::default(),
            default_exclusions: Vec::new(),
        }
    }

    /// Build a client backed by the OpenAI provider.
    pub fn from_config(config: &Config) -> Result<Self, MangoError> {
        let provider = OpenAiProvider::from_config(config);
        Self::from_config_with_provider(config, Arc::new(provider))
    }

    /// Build a client from configuration with a caller-supplied provider.
    pub fn from_config_with_provider(
        config: &Config,
        provider: Arc<dyn TranslationProvider>,
    ) -> Result<Self, MangoError> {
        let languages = LanguageSet::new(config.languages.clone(), &config.source_language)?;
        // Fail at startup rather than on the first request.
        ExclusionSet::compile(&config.exclude_paths)?;

        Ok(Self::new(languages, provider)
            .with_strategy(config.strategy)
            .with_hints(config.batch_hints)
            .with_default_exclusions(config.exclude_paths.clone()))
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_hints(mut self, hints: BatchHints) -> Self {
        self.hints = hints;
        self
    }

    /// Patterns applied to every call.
    pub fn with_default_exclusions(mut self, patterns: Vec<String>) -> Self {
        self.default_exclusions = patterns;
        self
    }

    pub fn languages(&self) -> &LanguageSet {
        &self.languages
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Translate every eligible leaf of `value`.
    ///
    /// Fails only for malformed exclusion patterns.
    pub async fn translate(
        &self,
        value: &Value,
        options: TranslateOptions,
    ) -> Result<Value, MangoError> {
        Ok(self.translate_with_report(value, options).await?.value)
    }

    /// Like [`translate`](Self::translate), also returning traversal counts.
    pub async fn translate_with_report(
        &self,
        value: &Value,
        options: TranslateOptions,
    ) -> Result<TranslationOutcome, MangoError> {
        let exclusions = ExclusionSet::compile(
            self.default_exclusions.iter().chain(options.exclude.iter()),
        )?;

        let request = TranslationRequest {
            value: value.clone(),
            languages: options.languages.unwrap_or_else(|| self.languages.clone()),
            exclusions,
            strategy: self.strategy,
            fast: options.fast,
            hints: self.hints,
            on_progress: options.on_progress,
        };

        Ok(traverse::translate(self.provider.as_ref(), &request).await)
    }
}

impl fmt::Debug for Mango {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mango")
            .field("languages", &self.languages)
            .field("provider", &self.provider.name())
            .field("strategy", &self.strategy)
            .field("hints", &self.hints)
            .field("default_exclusions", &self.default_exclusions)
            .finish()
    }
}
