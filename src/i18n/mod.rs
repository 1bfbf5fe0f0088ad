//! Internationalization (i18n) support shared by the engine and providers.
//!
//! # Architecture
//!
//! - `language`: validated, ordered language sets with a source language
//! - `registry`: display names for well-known language codes
//! - `validator`: checks that translations keep URLs and placeholders intact
//! - `metrics`: process-wide translation counters
//!
//! # Example
//!
//! ```rust,ignore
//! use mango::i18n::{LanguageRegistry, LanguageSet};
//!
//! let languages = LanguageSet::new(["en", "hi", "fr"], "en")?;
//! assert_eq!(languages.targets(), ["hi", "fr"]);
//! assert_eq!(LanguageRegistry::get().display_name("hi"), "Hindi");
//! ```

mod language;
mod metrics;
mod registry;
mod validator;

pub use language::{LanguageError, LanguageInfo, LanguageSet};
pub use metrics::{MetricsReport, TranslationMetrics};
pub use registry::{LanguageConfig, LanguageRegistry};
pub use validator::{TranslationValidator, ValidationReport};
