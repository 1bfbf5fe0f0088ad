//! Display-side helpers: pick one language out of translated values.
//!
//! A [`LanguageSelector`] holds the current display language. [`provide`]
//! makes one available to code running inside a scope on the current thread,
//! where [`use_language`] retrieves it.

use crate::i18n::{LanguageError, LanguageSet};
use crate::value::Value;
use std::cell::RefCell;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ContextError {
    #[error("no language selector is provided; wrap the caller in context::provide(selector, ..)")]
    Missing,
}

/// Current display language plus the languages it may switch between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageSelector {
    languages: LanguageSet,
    current: String,
}

impl LanguageSelector {
    /// `default` must be one of `languages`.
    pub fn new(languages: LanguageSet, default: &str) -> Result<Self, LanguageError> {
        languages.require(default)?;
        Ok(Self {
            current: default.to_string(),
            languages,
        })
    }

    pub fn current(&self) -> &str {
        &self.current
    }

    /// Switch the display language. Unknown languages leave it unchanged.
    pub fn set(&mut self, language: &str) -> Result<(), LanguageError> {
        self.languages.require(language)?;
        self.current = language.to_string();
        Ok(())
    }

    pub fn languages(&self) -> &LanguageSet {
        &self.languages
    }

    /// Display text for a value in the current language.
    ///
    /// Multilingual values fall back to the source language, then to `""`.
    pub fn resolve(&self, value: &Value) -> String {
        match value {
            Value::Multilingual(m) => m
                .get(&self.current)
                .or_else(|| m.get(self.languages.source()))
                .unwrap_or_default()
                .to_string(),
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Null | Value::Array(_) | Value::Object(_) => String::new(),
        }
    }
}

thread_local! {
    static CURRENT: RefCell<Option<LanguageSelector>> = const { RefCell::new(None) };
}

/// Restores the enclosing selector when a scope ends, including on panic.
struct ScopeGuard {
    previous: Option<LanguageSelector>,
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        CURRENT.with(|slot| *slot.borrow_mut() = previous);
    }
}

/// Run `f` with `selector` available through [`use_language`].
pub fn provide<R>(selector: LanguageSelector, f: impl FnOnce() -> R) -> R {
    let previous = CURRENT.with(|slot| slot.borrow_mut().replace(selector));
    let _guard = ScopeGuard { previous };
    f()
}

/// Snapshot of the selector provided to the enclosing scope.
pub fn try_use_language() -> Result<LanguageSelector, ContextError> {
    CURRENT.with(|slot| slot.borrow().clone().ok_or(ContextError::Missing))
}

/// Like [`try_use_language`], for callers that are always inside a scope.
///
/// # Panics
///
/// Panics when called outside [`provide`].
pub fn use_language() -> LanguageSelector {
    match try_use_language() {
        Ok(selector) => selector,
        Err(e) => panic!("{}", e),
    }
}

/// Mutate the provided selector in place, e.g. to switch the language.
///
/// `f` must not call back into this module.
pub fn try_with_language<R>(
    f: impl FnOnce(&mut LanguageSelector) -> R,
) -> Result<R, ContextError> {
    CURRENT.with(|slot| {
        let mut slot = slot.borrow_mut();
        let selector = slot.as_mut().ok_or(ContextError::Missing)?;
        Ok(f(selector))
    })
}
