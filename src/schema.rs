//! Check exclusion patterns against a sample document before deploying them.
//!
//! The traversal engine never consults this module; a pattern that matches
//! nothing is silently inert at runtime, so typos are best caught here.

use crate::path::{child_index, child_key, PathPattern, PatternError};
use crate::value::Value;
use std::collections::{BTreeSet, HashSet};

/// Levels of nesting below the root that are enumerated.
pub const MAX_DEPTH: usize = 5;

/// Every path `sample` exposes, concrete (`posts[0].id`) and generalized
/// (`posts[].id`).
pub fn collect_paths(sample: &Value) -> BTreeSet<String> {
    let mut paths = BTreeSet::new();
    let mut stack = HashSet::new();
    walk(sample, String::new(), 0, &mut stack, &mut paths);
    paths
}

/// Patterns from `patterns` that match none of the paths of `sample`.
pub fn unmatched_patterns<S: AsRef<str>>(
    sample: &Value,
    patterns: &[S],
) -> Result<Vec<String>, PatternError> {
    let paths = collect_paths(sample);
    let mut unmatched = Vec::new();
    for raw in patterns {
        let pattern = PathPattern::parse(raw.as_ref())?;
        if !paths.iter().any(|path| pattern.matches(path)) {
            unmatched.push(pattern.as_str().to_string());
        }
    }
    Ok(unmatched)
}

fn walk(
    value: &Value,
    path: String,
    depth: usize,
    stack: &mut HashSet<usize>,
    paths: &mut BTreeSet<String>,
) {
    if !path.is_empty() {
        paths.insert(generalize(&path));
        paths.insert(path.clone());
    }
    if depth >= MAX_DEPTH {
        return;
    }

    match value {
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                walk(item, child_index(&path, index), depth + 1, stack, paths);
            }
        }
        Value::Object(obj) => {
            if !stack.insert(obj.id()) {
                return;
            }
            for (key, child) in obj.entries() {
                walk(&child, child_key(&path, &key), depth + 1, stack, paths);
            }
            stack.remove(&obj.id());
        }
        _ => {}
    }
}

/// Replace every `[N]` index with `[]`.
fn generalize(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut chars = path.chars().peekable();
    while let Some(c) = chars.next() {
        out.push(c);
        if c == '[' {
            while chars.peek().is_some_and(|c| c.is_ascii_digit()) {
                chars.next();
            }
        }
    }
    out
}
