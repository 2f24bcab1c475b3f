//! Language type: validated language representation.
//!
//! A `Language` can only be obtained from a registered, enabled code, so the
//! rest of the crate never has to re-validate it.

use crate::error::InvalidLanguageError;
use crate::i18n::{LanguageConfig, LanguageRegistry};
use serde::{Serialize, Serializer};
use std::fmt;

/// A validated language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Language {
    /// ISO 639-1 language code (e.g., "en", "vi")
    code: &'static str,
}

impl Language {
    pub const ENGLISH: Language = Language { code: "en" };

    pub const VIETNAMESE: Language = Language { code: "vi" };

    /// Create a Language from a language code string.
    ///
    /// # Returns
    /// * `Ok(Language)` if the code is registered and enabled
    /// * `Err(InvalidLanguageError)` otherwise
    pub fn from_code(code: &str) -> Result<Language, InvalidLanguageError> {
        match LanguageRegistry::get().get_by_code(code) {
            Some(config) if config.enabled => Ok(Language { code: config.code }),
            _ => Err(InvalidLanguageError {
                code: code.to_string(),
            }),
        }
    }

    /// The language used when nothing has been stored yet.
    pub fn default_language() -> Language {
        Language {
            code: LanguageRegistry::get().default_language().code,
        }
    }

    /// Get the ISO 639-1 language code.
    pub fn code(&self) -> &'static str {
        self.code
    }

    /// Get the full language configuration from the registry.
    ///
    /// # Panics
    /// Never in practice: a `Language` is only built from registry entries.
    pub fn config(&self) -> &'static LanguageConfig {
        LanguageRegistry::get()
            .get_by_code(self.code)
            .expect("Language code should always be valid")
    }

    pub fn name(&self) -> &'static str {
        self.config().name
    }

    pub fn native_name(&self) -> &'static str {
        self.config().native_name
    }

    pub fn unavailable_notice(&self) -> &'static str {
        self.config().unavailable_notice
    }
}

impl Default for Language {
    fn default() -> Self {
        Language::default_language()
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code)
    }
}

impl std::str::FromStr for Language {
    type Err = InvalidLanguageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::from_code(s)
    }
}

impl Serialize for Language {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code)
    }
}
