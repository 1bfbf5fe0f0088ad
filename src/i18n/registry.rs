//! Language registry: names for well-known language codes.
//!
//! Translation requests accept any code. The registry only supplies
//! human-readable names used to phrase provider prompts and to describe the
//! configured languages over HTTP. It is initialized once through `OnceLock`.

use std::sync::OnceLock;

/// Metadata for a well-known language.
#[derive(Debug, Clone)]
pub struct LanguageConfig {
    /// Language code (e.g., "en", "pt-BR")
    pub code: &'static str,

    /// English name of the language (e.g., "French")
    pub name: &'static str,

    /// Native name of the language (e.g., "Français")
    pub native_name: &'static str,
}

pub struct LanguageRegistry {
    languages: Vec<LanguageConfig>,
}

static REGISTRY: OnceLock<LanguageRegistry> = OnceLock::new();

impl LanguageRegistry {
    /// Get the global language registry instance.
    pub fn get() -> &'static LanguageRegistry {
        REGISTRY.get_or_init(|| LanguageRegistry {
            languages: known_languages(),
        })
    }

    /// Look up a language by code. Matching ignores ASCII case.
    pub fn get_by_code(&self, code: &str) -> Option<&LanguageConfig> {
        self.languages
            .iter()
            .find(|lang| lang.code.eq_ignore_ascii_case(code))
    }

    pub fn list_all(&self) -> Vec<&LanguageConfig> {
        self.languages.iter().collect()
    }

    /// English name for `code`, or the code itself when it is not registered.
    ///
    /// Regional codes fall back to their base language (`fr-CA` -> "French").
    pub fn display_name<'a>(&'a self, code: &'a str) -> &'a str {
        if let Some(config) = self.get_by_code(code) {
            return config.name;
        }
        code.split(['-', '_'])
            .next()
            .and_then(|base| self.get_by_code(base))
            .map(|config| config.name)
            .unwrap_or(code)
    }
}

fn known_languages() -> Vec<LanguageConfig> {
    [
        ("ar", "Arabic", "العربية"),
        ("bn", "Bengali", "বাংলা"),
        ("de", "German", "Deutsch"),
        ("en", "English", "English"),
        ("es", "Spanish", "Español"),
        ("fr", "French", "Français"),
        ("hi", "Hindi", "हिन्दी"),
        ("id", "Indonesian", "Bahasa Indonesia"),
        ("it", "Italian", "Italiano"),
        ("ja", "Japanese", "日本語"),
        ("ko", "Korean", "한국어"),
        ("nl", "Dutch", "Nederlands"),
        ("pl", "Polish", "Polski"),
        ("pt", "Portuguese", "Português"),
        ("pt-BR", "Brazilian Portuguese", "Português do Brasil"),
        ("ru", "Russian", "Русский"),
        ("sv", "Swedish", "Svenska"),
        ("ta", "Tamil", "தமிழ்"),
        ("tr", "Turkish", "Türkçe"),
        ("uk", "Ukrainian", "Українська"),
        ("vi", "Vietnamese", "Tiếng Việt"),
        ("zh", "Chinese", "中文"),
    ]
    .into_iter()
    .map(|(code, name, native_name)| LanguageConfig {
        code,
        name,
        native_name,
    })
    .collect()
}
