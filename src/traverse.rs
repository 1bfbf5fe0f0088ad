//! Recursive traversal of a value tree.
//!
//! Every node is dispatched on its kind. Leaf strings that are neither
//! excluded by path nor classified as non-prose become multilingual values;
//! everything else keeps its original shape. Traversal is depth-first and
//! sequential: each sibling, provider round-trip included, finishes before the
//! next one starts.

use crate::i18n::{LanguageSet, TranslationMetrics};
use crate::path::{child_index, child_key, ExclusionSet};
use crate::provider::{BatchHints, TranslationProvider};
use crate::skip;
use crate::translation::{translate_leaf, Strategy};
use crate::value::{Object, ObjectRef, Value};
use futures::future::BoxFuture;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Receives a percentage (0-100) each time a sibling in an array or object
/// finishes.
///
/// Percentages are local to the array or object being iterated, so nested
/// groups report their own 0-100 runs. Treat it as best-effort progress, not
/// an estimate of time remaining.
pub type ProgressCallback = Arc<dyn Fn(u8) + Send + Sync>;

/// Everything one translation run needs.
#[derive(Clone)]
pub struct TranslationRequest {
    pub value: Value,
    pub languages: LanguageSet,
    pub exclusions: ExclusionSet,
    pub strategy: Strategy,
    pub fast: bool,
    pub hints: BatchHints,
    pub on_progress: Option<ProgressCallback>,
}

impl TranslationRequest {
    pub fn new(value: Value, languages: LanguageSet) -> Self {
        Self {
            value,
            languages,
            exclusions: ExclusionSet::default(),
            strategy: Strategy::default(),
            fast: false,
            hints: BatchHints::default(),
            on_progress: None,
        }
    }
}

impl fmt::Debug for TranslationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranslationRequest")
            .field("value", &self.value.kind())
            .field("languages", &self.languages)
            .field("exclusions", &self.exclusions.len())
            .field("strategy", &self.strategy)
            .field("fast", &self.fast)
            .field("hints", &self.hints)
            .field("on_progress", &self.on_progress.is_some())
            .finish()
    }
}

/// Counts of the decisions made during one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TraversalStats {
    pub leaves_translated: usize,
    pub strings_skipped: usize,
    pub nodes_excluded: usize,
    pub cycles_broken: usize,
    /// Language entries that fell back to the source text
    pub fallbacks: usize,
}

#[derive(Debug, Clone)]
pub struct TranslationOutcome {
    pub value: Value,
    pub stats: TraversalStats,
}

/// Translate `request.value` into every language of `request.languages`.
///
/// Never fails: provider errors degrade to source-text fallbacks.
pub async fn translate(
    provider: &dyn TranslationProvider,
    request: &TranslationRequest,
) -> TranslationOutcome {
    let mut traversal = Traversal {
        provider,
        request,
        visited: HashSet::new(),
        stats: TraversalStats::default(),
    };

    let value = traversal.visit(&request.value, String::new()).await;
    let stats = traversal.stats;

    info!(
        "Translated {} leaves into {} languages with {} ({} skipped, {} excluded, {} cycles, {} fallbacks)",
        stats.leaves_translated,
        request.languages.len(),
        provider.name(),
        stats.strings_skipped,
        stats.nodes_excluded,
        stats.cycles_broken,
        stats.fallbacks
    );

    TranslationOutcome { value, stats }
}

struct Traversal<'a> {
    provider: &'a dyn TranslationProvider,
    request: &'a TranslationRequest,
    /// Identities of the objects on the current recursion stack
    visited: HashSet<usize>,
    stats: TraversalStats,
}

impl<'a> Traversal<'a> {
    fn visit<'b>(&'b mut self, value: &'b Value, path: String) -> BoxFuture<'b, Value>
    where
        'a: 'b,
    {
        Box::pin(async move {
            match value {
                Value::Null | Value::Bool(_) | Value::Number(_) => value.clone(),
                Value::String(text) => self.visit_string(text, &path).await,
                Value::Array(items) => {
                    if self.excluded(&path) {
                        return value.clone();
                    }
                    let mut result = Vec::with_capacity(items.len());
                    for (index, item) in items.iter().enumerate() {
                        result.push(self.visit(item, child_index(&path, index)).await);
                        self.report_progress(index + 1, items.len());
                    }
                    Value::Array(result)
                }
                Value::Object(obj) => self.visit_object(value, obj, path).await,
                Value::Multilingual(_) => value.clone(),
            }
        })
    }

    async fn visit_string(&mut self, text: &str, path: &str) -> Value {
        if self.excluded(path) {
            return Value::String(text.to_string());
        }
        if let Some(reason) = skip::classify(text) {
            debug!("Skipping {} at '{}'", reason.as_str(), path);
            self.stats.strings_skipped += 1;
            TranslationMetrics::global().record_string_skipped();
            return Value::String(text.to_string());
        }

        let leaf = translate_leaf(
            self.provider,
            text,
            &self.request.languages,
            self.request.strategy,
            self.request.fast,
            self.request.hints,
        )
        .await;

        self.stats.leaves_translated += 1;
        self.stats.fallbacks += leaf.fallbacks;
        TranslationMetrics::global().record_leaf_translated();
        Value::Multilingual(leaf.value)
    }

    async fn visit_object(&mut self, original: &Value, obj: &ObjectRef, path: String) -> Value {
        let id = obj.id();
        if !self.visited.insert(id) {
            debug!("Cycle detected at '{}', returning original object", path);
            self.stats.cycles_broken += 1;
            TranslationMetrics::global().record_cycle_broken();
            return original.clone();
        }

        if self.excluded(&path) {
            self.visited.remove(&id);
            return original.clone();
        }

        // Snapshot so no lock is held across provider calls.
        let entries = obj.entries();
        let total = entries.len();
        let mut result = Object::new();
        for (done, (key, child)) in entries.iter().enumerate() {
            let translated = self.visit(child, child_key(&path, key)).await;
            result.insert(key.clone(), translated);
            self.report_progress(done + 1, total);
        }

        self.visited.remove(&id);
        Value::Object(ObjectRef::new(result))
    }

    fn excluded(&mut self, path: &str) -> bool {
        let excluded = self.request.exclusions.is_excluded(path);
        if excluded {
            debug!("Excluded '{}'", path);
            self.stats.nodes_excluded += 1;
            TranslationMetrics::global().record_node_excluded();
        }
        excluded
    }

    fn report_progress(&self, done: usize, total: usize) {
        if let Some(on_progress) = &self.request.on_progress {
            on_progress((done * 100 / total.max(1)) as u8);
        }
    }
}
