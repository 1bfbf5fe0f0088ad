//! Exclusion path patterns and traversal path building.
//!
//! A traversal path is the location of a node: field names joined by `.`,
//! array positions written as `[<index>]` (`posts[3].title`). The root path is
//! the empty string.
//!
//! Exclusion patterns use the same syntax, plus `[]` meaning "any index":
//!
//! - `user.email` matches exactly that path
//! - `tags[]` matches `tags[0]`, `tags[1]`, ... (and anything below them)
//! - `users[].name` matches `users[0].name`, `users[12].name`, ...
//!
//! Field names may not contain `.`, `[` or `]`; there is no escaping syntax.

use regex::Regex;
use thiserror::Error;

/// Reasons an exclusion pattern is rejected at configuration time.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PatternError {
    #[error("exclusion pattern is empty")]
    Empty,

    #[error("exclusion pattern '{pattern}' has an empty segment")]
    EmptySegment { pattern: String },

    #[error("exclusion pattern '{pattern}' has a malformed bracket at byte {position}")]
    MalformedBracket { pattern: String, position: usize },

    #[error("exclusion pattern '{pattern}' could not be compiled: {message}")]
    Regex { pattern: String, message: String },
}

/// Path of a field below `parent`.
pub fn child_key(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", parent, key)
    }
}

/// Path of an array element below `parent`.
pub fn child_index(parent: &str, index: usize) -> String {
    format!("{}[{}]", parent, index)
}

/// A single validated exclusion pattern.
#[derive(Debug, Clone)]
pub struct PathPattern {
    raw: String,
    /// `tags[]` -> `tags`
    trailing_base: Option<String>,
    /// `users[].name` -> `^users\[\d+\]\.name$`
    embedded: Option<Regex>,
}

impl PathPattern {
    /// Validate and compile a pattern.
    pub fn parse(raw: &str) -> Result<Self, PatternError> {
        validate(raw)?;

        let trailing_base = raw.strip_suffix("[]").map(str::to_string);

        let embedded = if raw.contains("[].") {
            let body = raw
                .split("[]")
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(r"\[\d+\]");
            let regex = Regex::new(&format!("^{}$", body)).map_err(|e| PatternError::Regex {
                pattern: raw.to_string(),
                message: e.to_string(),
            })?;
            Some(regex)
        } else {
            None
        };

        Ok(Self {
            raw: raw.to_string(),
            trailing_base,
            embedded,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether `path` falls under this pattern. Case-sensitive.
    pub fn matches(&self, path: &str) -> bool {
        if self.raw == path {
            return true;
        }
        if let Some(base) = &self.trailing_base {
            if path.len() > base.len() && path.starts_with(base.as_str()) && path[base.len()..].starts_with('[') {
                return true;
            }
        }
        if let Some(regex) = &self.embedded {
            if regex.is_match(path) {
                return true;
            }
        }
        false
    }
}

fn validate(raw: &str) -> Result<(), PatternError> {
    if raw.is_empty() {
        return Err(PatternError::Empty);
    }

    let mut offset = 0;
    for (index, segment) in raw.split('.').enumerate() {
        let bracket_start = segment.find('[').unwrap_or(segment.len());
        let name = &segment[..bracket_start];

        // Only the root segment may be a bare index (`[]`, `[0].title`).
        if name.is_empty() && (index > 0 || bracket_start == segment.len()) {
            return Err(PatternError::EmptySegment {
                pattern: raw.to_string(),
            });
        }
        if let Some(pos) = name.find(']') {
            return Err(PatternError::MalformedBracket {
                pattern: raw.to_string(),
                position: offset + pos,
            });
        }

        let mut rest = &segment[bracket_start..];
        let mut pos = offset + bracket_start;
        while !rest.is_empty() {
            let malformed = || PatternError::MalformedBracket {
                pattern: raw.to_string(),
                position: pos,
            };
            let inner = rest.strip_prefix('[').ok_or_else(malformed)?;
            let close = inner.find(']').ok_or_else(malformed)?;
            let body = &inner[..close];
            if !body.chars().all(|c| c.is_ascii_digit()) {
                return Err(malformed());
            }
            rest = &inner[close + 1..];
            pos += close + 2;
        }

        offset += segment.len() + 1;
    }

    Ok(())
}

/// The compiled exclusion patterns of one request.
#[derive(Debug, Clone, Default)]
pub struct ExclusionSet {
    patterns: Vec<PathPattern>,
}

impl ExclusionSet {
    /// Compile every pattern, failing on the first malformed one.
    pub fn compile<I, S>(patterns: I) -> Result<Self, PatternError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| PathPattern::parse(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// A path is excluded if any pattern matches it.
    pub fn is_excluded(&self, path: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(path))
    }

    pub fn patterns(&self) -> &[PathPattern] {
        &self.patterns
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Match `path` against raw, uncompiled patterns.
///
/// Patterns that fail validation never match.
pub fn is_excluded<S: AsRef<str>>(path: &str, patterns: &[S]) -> bool {
    patterns.iter().any(|raw| {
        PathPattern::parse(raw.as_ref())
            .map(|p| p.matches(path))
            .unwrap_or(false)
    })
}
