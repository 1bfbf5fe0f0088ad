//! Translation providers: the external capability the engine delegates to.
//!
//! The engine only needs [`TranslationProvider`]. Two implementations ship
//! with the crate: an OpenAI-compatible chat-completions client and an
//! offline pseudo-localizer.

pub mod openai;
pub mod pseudo;

use crate::i18n::TranslationMetrics;
use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;
use tracing::warn;

pub use openai::OpenAiProvider;
pub use pseudo::PseudoProvider;

/// Default number of target languages requested per batched call.
pub const DEFAULT_BATCH_SIZE: usize = 50;
pub const MAX_BATCH_SIZE: usize = 250;
/// Default target word count per request.
pub const DEFAULT_IDEAL_BATCH_ITEM_SIZE: usize = 500;
pub const MAX_IDEAL_BATCH_ITEM_SIZE: usize = 2500;

/// Tuning hints forwarded to providers. They never change traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchHints {
    /// Maximum number of target languages per batched request
    pub batch_size: usize,
    /// Target word count per request
    pub ideal_batch_item_size: usize,
}

impl BatchHints {
    /// Validate hint ranges (`1..=250` and `1..=2500`).
    pub fn new(batch_size: usize, ideal_batch_item_size: usize) -> Result<Self, String> {
        if !(1..=MAX_BATCH_SIZE).contains(&batch_size) {
            return Err(format!(
                "batch size must be between 1 and {}, got {}",
                MAX_BATCH_SIZE, batch_size
            ));
        }
        if !(1..=MAX_IDEAL_BATCH_ITEM_SIZE).contains(&ideal_batch_item_size) {
            return Err(format!(
                "ideal batch item size must be between 1 and {}, got {}",
                MAX_IDEAL_BATCH_ITEM_SIZE, ideal_batch_item_size
            ));
        }
        Ok(Self {
            batch_size,
            ideal_batch_item_size,
        })
    }
}

impl Default for BatchHints {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            ideal_batch_item_size: DEFAULT_IDEAL_BATCH_ITEM_SIZE,
        }
    }
}

/// One string to translate out of the source language.
#[derive(Debug, Clone, Copy)]
pub struct ProviderRequest<'a> {
    pub text: &'a str,
    pub source: &'a str,
    /// Prefer speed over quality
    pub fast: bool,
    pub hints: BatchHints,
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("provider API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("provider response contained no translation")]
    EmptyResponse,

    #[error("malformed provider response: {0}")]
    Malformed(String),

    #[error("translation rejected: {0}")]
    Rejected(String),
}

impl ProviderError {
    /// Rate limits, server errors and network failures are worth retrying.
    /// Other client errors and malformed payloads are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::Network(_) => true,
            ProviderError::Api { status, .. } => *status == 429 || *status >= 500,
            ProviderError::EmptyResponse
            | ProviderError::Malformed(_)
            | ProviderError::Rejected(_) => false,
        }
    }
}

/// Converts a string from the source language into target languages.
#[async_trait]
pub trait TranslationProvider: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Translate into a single target language.
    async fn translate(
        &self,
        request: &ProviderRequest<'_>,
        target: &str,
    ) -> Result<String, ProviderError>;

    /// Translate into every target at once.
    ///
    /// The default calls [`translate`](Self::translate) per target. A failed
    /// target is logged and left out of the result while the others proceed;
    /// the error is returned only when every target failed. The engine falls
    /// back to the source text for any target missing from the result.
    ///
    /// Implementations record each request they send in
    /// [`TranslationMetrics`].
    async fn translate_batch(
        &self,
        request: &ProviderRequest<'_>,
        targets: &[String],
    ) -> Result<HashMap<String, String>, ProviderError> {
        let metrics = TranslationMetrics::global();
        let mut translations = HashMap::with_capacity(targets.len());
        let mut last_error = None;

        for target in targets {
            metrics.record_provider_call();
            match self.translate(request, target).await {
                Ok(text) => {
                    translations.insert(target.clone(), text);
                }
                Err(e) => {
                    metrics.record_provider_failure();
                    warn!("{} failed to translate into '{}': {}", self.name(), target, e);
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if translations.is_empty() => Err(e),
            _ => Ok(translations),
        }
    }
}
