//! Translation preservation checks.
//!
//! Compares a provider's output with the original and reports elements that
//! should survive translation verbatim but did not: URLs, `{placeholder}`
//! interpolations, printf-style markers and markdown links. Findings are
//! observational; callers log them and keep the translation.

use regex::Regex;
use std::sync::OnceLock;

/// Validation report containing warnings about a translation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn is_clean(&self) -> bool {
        !self.has_warnings()
    }
}

pub struct TranslationValidator;

static URL_REGEX: OnceLock<Regex> = OnceLock::new();
static PLACEHOLDER_REGEX: OnceLock<Regex> = OnceLock::new();
static PRINTF_REGEX: OnceLock<Regex> = OnceLock::new();
static MARKDOWN_LINK_REGEX: OnceLock<Regex> = OnceLock::new();

impl TranslationValidator {
    /// Check that `translated` preserves the untranslatable parts of `original`.
    pub fn validate(original: &str, translated: &str) -> ValidationReport {
        let mut report = ValidationReport::new();

        let orig_urls = Self::sorted(Self::extract_urls(original));
        let trans_urls = Self::sorted(Self::extract_urls(translated));
        if orig_urls != trans_urls {
            report.warnings.push(format!(
                "URL mismatch: original has {:?}, translation has {:?}",
                orig_urls, trans_urls
            ));
        }

        let orig_placeholders = Self::sorted(Self::extract_placeholders(original));
        let trans_placeholders = Self::sorted(Self::extract_placeholders(translated));
        if orig_placeholders != trans_placeholders {
            report.warnings.push(format!(
                "Placeholder mismatch: original has {:?}, translation has {:?}",
                orig_placeholders, trans_placeholders
            ));
        }

        let orig_printf = Self::sorted(Self::extract_printf_markers(original));
        let trans_printf = Self::sorted(Self::extract_printf_markers(translated));
        if orig_printf != trans_printf {
            report.warnings.push(format!(
                "Format marker mismatch: original has {:?}, translation has {:?}",
                orig_printf, trans_printf
            ));
        }

        // Link text is translated, so only the count is comparable.
        let orig_links = Self::extract_markdown_links(original).len();
        let trans_links = Self::extract_markdown_links(translated).len();
        if orig_links != trans_links {
            report.warnings.push(format!(
                "Markdown link count mismatch: original has {}, translation has {}",
                orig_links, trans_links
            ));
        }

        report
    }

    fn sorted(mut items: Vec<String>) -> Vec<String> {
        items.sort();
        items
    }

    fn extract_urls(text: &str) -> Vec<String> {
        let regex = URL_REGEX.get_or_init(|| Regex::new(r"https?://[^\s)\]]+").unwrap());
        regex
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect()
    }

    /// `{name}`, `{{count}}`
    fn extract_placeholders(text: &str) -> Vec<String> {
        let regex = PLACEHOLDER_REGEX
            .get_or_init(|| Regex::new(r"\{\{?\s*[A-Za-z_][A-Za-z0-9_.]*\s*\}\}?").unwrap());
        regex
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect()
    }

    /// `%s`, `%d`, `%1$s`
    fn extract_printf_markers(text: &str) -> Vec<String> {
        let regex =
            PRINTF_REGEX.get_or_init(|| Regex::new(r"%(?:\d+\$)?[sdif@]").unwrap());
        regex
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect()
    }

    fn extract_markdown_links(text: &str) -> Vec<String> {
        let regex =
            MARKDOWN_LINK_REGEX.get_or_init(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").unwrap());
        regex
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect()
    }
}
