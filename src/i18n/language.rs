//! The set of languages a translation targets.

use crate::i18n::LanguageRegistry;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LanguageError {
    #[error("at least one language must be configured")]
    NoLanguages,

    #[error("language code must not be blank")]
    BlankCode,

    #[error("language code '{0}' must not contain whitespace")]
    InvalidCode(String),

    #[error("source language '{source_language}' is not one of the configured languages {languages:?}")]
    SourceNotConfigured {
        source_language: String,
        languages: Vec<String>,
    },

    #[error("language '{language}' is not one of the configured languages {languages:?}")]
    Unsupported {
        language: String,
        languages: Vec<String>,
    },
}

/// Ordered, de-duplicated language codes and the source language among them.
///
/// Every translated leaf gets exactly one entry per language in this set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageSet {
    languages: Vec<String>,
    source: String,
}

impl LanguageSet {
    /// Validate a language list.
    ///
    /// Duplicate codes are dropped, keeping the first occurrence.
    pub fn new<I, S>(languages: I, source: &str) -> Result<Self, LanguageError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for code in languages {
            let code = code.into();
            let code = code.trim();
            if code.is_empty() {
                return Err(LanguageError::BlankCode);
            }
            if code.chars().any(char::is_whitespace) {
                return Err(LanguageError::InvalidCode(code.to_string()));
            }
            if unique.iter().any(|existing| existing == code) {
                debug!("Dropping duplicate language code '{}'", code);
                continue;
            }
            unique.push(code.to_string());
        }

        if unique.is_empty() {
            return Err(LanguageError::NoLanguages);
        }

        let source = source.trim();
        if !unique.iter().any(|code| code == source) {
            return Err(LanguageError::SourceNotConfigured {
                source_language: source.to_string(),
                languages: unique,
            });
        }

        Ok(Self {
            languages: unique,
            source: source.to_string(),
        })
    }

    /// All languages in configuration order, source included.
    pub fn languages(&self) -> &[String] {
        &self.languages
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Languages other than the source, in configuration order.
    pub fn targets(&self) -> Vec<String> {
        self.languages
            .iter()
            .filter(|code| **code != self.source)
            .cloned()
            .collect()
    }

    pub fn contains(&self, code: &str) -> bool {
        self.languages.iter().any(|c| c == code)
    }

    /// Fail with [`LanguageError::Unsupported`] when `code` is not configured.
    pub fn require(&self, code: &str) -> Result<(), LanguageError> {
        if self.contains(code) {
            Ok(())
        } else {
            Err(LanguageError::Unsupported {
                language: code.to_string(),
                languages: self.languages.clone(),
            })
        }
    }

    pub fn len(&self) -> usize {
        self.languages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.languages.is_empty()
    }

    /// Describe each language with its registry names, for display.
    pub fn describe(&self) -> Vec<LanguageInfo> {
        let registry = LanguageRegistry::get();
        self.languages
            .iter()
            .map(|code| LanguageInfo {
                code: code.clone(),
                name: registry.display_name(code).to_string(),
                native_name: registry
                    .get_by_code(code)
                    .map(|config| config.native_name.to_string()),
                is_source: *code == self.source,
            })
            .collect()
    }
}

/// Display information for one configured language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LanguageInfo {
    pub code: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub native_name: Option<String>,
    pub is_source: bool,
}
