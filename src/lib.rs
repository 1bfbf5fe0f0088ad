//! Translate every human-readable string in a nested data structure into a
//! set of languages, leaving the structure, identifiers and excluded paths
//! untouched.

pub mod config;
pub mod context;
pub mod i18n;
pub mod mango;
pub mod path;
pub mod provider;
pub mod retry;
pub mod schema;
pub mod security;
pub mod server;
pub mod skip;
pub mod translation;
pub mod traverse;
pub mod value;

pub use config::Config;
pub use context::{ContextError, LanguageSelector};
pub use i18n::{LanguageError, LanguageSet};
pub use mango::{Mango, MangoError, TranslateOptions};
pub use path::{is_excluded, ExclusionSet, PathPattern, PatternError};
pub use provider::{BatchHints, ProviderError, ProviderRequest, TranslationProvider};
pub use skip::{should_skip, SkipReason};
pub use translation::Strategy;
pub use traverse::{TranslationOutcome, TranslationRequest, TraversalStats};
pub use value::{MultilingualValue, ObjectRef, Value, ValueError};
