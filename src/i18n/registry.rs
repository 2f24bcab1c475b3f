//! Language registry: Single source of truth for all supported site languages.
//!
//! The registry is built once on first access (`OnceLock`) and is immutable
//! afterwards. Every CMS document exists once per enabled language.

use std::sync::OnceLock;

/// Configuration for a supported language.
#[derive(Debug, Clone)]
pub struct LanguageConfig {
    /// ISO 639-1 language code as stored by the CMS (e.g., "en", "vi")
    pub code: &'static str,

    /// English name of the language (e.g., "English", "Vietnamese")
    pub name: &'static str,

    /// Native name, shown in the language switcher (e.g., "Tiếng Việt")
    pub native_name: &'static str,

    /// Fallback language when no preference has been stored (only one should be true)
    pub is_default: bool,

    /// Whether this language is offered to visitors
    pub enabled: bool,

    /// Notice rendered in place of a page whose content failed to load
    pub unavailable_notice: &'static str,
}

/// Global language registry singleton.
pub struct LanguageRegistry {
    languages: Vec<LanguageConfig>,
}

static REGISTRY: OnceLock<LanguageRegistry> = OnceLock::new();

impl LanguageRegistry {
    /// Get the global language registry instance.
    pub fn get() -> &'static LanguageRegistry {
        REGISTRY.get_or_init(|| LanguageRegistry {
            languages: default_languages(),
        })
    }

    /// Get a language configuration by its code.
    ///
    /// # Returns
    /// * `Some(&LanguageConfig)` if the language exists
    /// * `None` if the language is not found
    pub fn get_by_code(&self, code: &str) -> Option<&LanguageConfig> {
        self.languages.iter().find(|lang| lang.code == code)
    }

    /// Get all enabled languages, in switcher order.
    pub fn list_enabled(&self) -> Vec<&LanguageConfig> {
        self.languages.iter().filter(|lang| lang.enabled).collect()
    }

    /// Get the default language configuration.
    ///
    /// # Panics
    /// Panics if the registry does not define exactly one default language.
    /// This indicates a programming error in `default_languages`.
    pub fn default_language(&self) -> &LanguageConfig {
        let defaults: Vec<_> = self
            .languages
            .iter()
            .filter(|lang| lang.is_default)
            .collect();

        match defaults.len() {
            0 => panic!("No default language found in registry"),
            1 => defaults[0],
            _ => panic!("Multiple default languages found in registry"),
        }
    }

    /// Check if a language code is supported and enabled.
    pub fn is_enabled(&self, code: &str) -> bool {
        self.get_by_code(code)
            .map(|lang| lang.enabled)
            .unwrap_or(false)
    }
}

/// The site is published in English (default) and Vietnamese.
fn default_languages() -> Vec<LanguageConfig> {
    vec![
        LanguageConfig {
            code: "en",
            name: "English",
            native_name: "English",
            is_default: true,
            enabled: true,
            unavailable_notice: "This content is unavailable right now.",
        },
        LanguageConfig {
            code: "vi",
            name: "Vietnamese",
            native_name: "Tiếng Việt",
            is_default: false,
            enabled: true,
            unavailable_notice: "Nội dung hiện không khả dụng.",
        },
    ]
}
