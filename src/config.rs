use crate::i18n::LanguageSet;
use crate::path::ExclusionSet;
use crate::provider::openai::{DEFAULT_API_URL, DEFAULT_MODEL};
use crate::provider::{BatchHints, DEFAULT_BATCH_SIZE, DEFAULT_IDEAL_BATCH_ITEM_SIZE};
use crate::translation::Strategy;
use anyhow::{anyhow, bail, Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    // OpenAI
    pub openai_api_key: String,
    pub openai_model: String,
    pub openai_fast_model: Option<String>,
    pub openai_api_url: String,
    pub openai_max_tokens: u32,

    // Languages
    pub languages: Vec<String>,
    pub source_language: String,

    // Translation
    pub exclude_paths: Vec<String>,
    pub strategy: Strategy,
    pub batch_hints: BatchHints,

    // Server
    pub api_key: Option<String>,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let languages = std::env::var("MANGO_LANGUAGES")
            .map(|v| split_list(&v))
            .unwrap_or_else(|_| vec!["en".to_string()]);

        let source_language = std::env::var("MANGO_SOURCE_LANGUAGE")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .or_else(|| languages.first().cloned())
            .context("MANGO_LANGUAGES must list at least one language")?;

        let strategy = match std::env::var("MANGO_STRATEGY") {
            Ok(v) => v
                .parse::<Strategy>()
                .map_err(|e| anyhow!(e))
                .context("invalid MANGO_STRATEGY")?,
            Err(_) => Strategy::default(),
        };

        let batch_size = parse_var("MANGO_BATCH_SIZE")?.unwrap_or(DEFAULT_BATCH_SIZE);
        let ideal_batch_item_size =
            parse_var("MANGO_IDEAL_BATCH_ITEM_SIZE")?.unwrap_or(DEFAULT_IDEAL_BATCH_ITEM_SIZE);
        let batch_hints = BatchHints::new(batch_size, ideal_batch_item_size)
            .map_err(|e| anyhow!(e))
            .context("invalid batch hints")?;

        Ok(Self {
            // Only required when the OpenAI provider is used
            openai_api_key: std::env::var("OPENAI_API_KEY").unwrap_or_default(),
            openai_model: std::env::var("OPENAI_MODEL")
                .unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            openai_fast_model: std::env::var("OPENAI_FAST_MODEL")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            openai_api_url: std::env::var("OPENAI_API_URL")
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            openai_max_tokens: std::env::var("OPENAI_MAX_TOKENS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1000),

            languages,
            source_language,

            exclude_paths: std::env::var("MANGO_EXCLUDE_PATHS")
                .map(|v| split_list(&v))
                .unwrap_or_default(),
            strategy,
            batch_hints,

            api_key: std::env::var("API_KEY")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),
        })
    }

    /// Reject language and exclusion settings the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        LanguageSet::new(self.languages.iter().cloned(), &self.source_language)
            .context("invalid MANGO_LANGUAGES / MANGO_SOURCE_LANGUAGE")?;
        ExclusionSet::compile(&self.exclude_paths).context("invalid MANGO_EXCLUDE_PATHS")?;
        if self.openai_max_tokens == 0 {
            bail!("OPENAI_MAX_TOKENS must be greater than zero");
        }
        Ok(())
    }

    /// The OpenAI key, failing when it was not provided.
    pub fn require_openai_key(&self) -> Result<&str> {
        if self.openai_api_key.trim().is_empty() {
            bail!("OPENAI_API_KEY not set");
        }
        Ok(&self.openai_api_key)
    }
}

/// Comma-separated list with blanks removed.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_var<T>(name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(v) => v
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| anyhow!("invalid {}: {}", name, e)),
        Err(_) => Ok(None),
    }
}
