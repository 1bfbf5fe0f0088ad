//! Content-based classification of strings that are not prose.
//!
//! URLs, emails, numbers, colors, dates and identifiers pass through a
//! translation untouched. Classification looks at the trimmed text only and
//! never at where the string sits in the tree.

use regex::Regex;
use std::sync::OnceLock;

/// The rule that marked a string as non-prose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Empty or whitespace only
    Blank,
    Url,
    FtpUrl,
    Email,
    Number,
    HexColor,
    IsoDate,
    /// Lowercase identifier such as `hello-world` or `user_id`
    Slug,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::Blank => "blank",
            SkipReason::Url => "url",
            SkipReason::FtpUrl => "ftp-url",
            SkipReason::Email => "email",
            SkipReason::Number => "number",
            SkipReason::HexColor => "hex-color",
            SkipReason::IsoDate => "iso-date",
            SkipReason::Slug => "slug",
        }
    }
}

static SKIP_RULES: OnceLock<Vec<(SkipReason, Regex)>> = OnceLock::new();

fn skip_rules() -> &'static [(SkipReason, Regex)] {
    SKIP_RULES.get_or_init(|| {
        [
            (SkipReason::Url, r"(?i)^https?://"),
            (SkipReason::FtpUrl, r"(?i)^ftp://"),
            (
                SkipReason::Email,
                r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$",
            ),
            (SkipReason::Number, r"^[0-9]+(\.[0-9]+)?$"),
            (SkipReason::HexColor, r"^#[0-9a-fA-F]{3,8}$"),
            (SkipReason::IsoDate, r"^[0-9]{4}-[0-9]{2}-[0-9]{2}"),
            (SkipReason::Slug, r"^[a-z0-9_-]+$"),
        ]
        .into_iter()
        .map(|(reason, pattern)| {
            // Patterns are literals above; a failure here is a typo in this file.
            (reason, Regex::new(pattern).expect("skip rule should compile"))
        })
        .collect()
    })
}

/// Name the first rule that classifies `text` as non-prose, if any.
pub fn classify(text: &str) -> Option<SkipReason> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Some(SkipReason::Blank);
    }
    skip_rules()
        .iter()
        .find(|(_, regex)| regex.is_match(trimmed))
        .map(|(reason, _)| *reason)
}

/// Whether `text` should be passed through without translation.
pub fn should_skip(text: &str) -> bool {
    classify(text).is_some()
}
