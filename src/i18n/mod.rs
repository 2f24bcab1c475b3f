//! Internationalization (i18n) module for the site's supported languages.
//!
//! # Architecture
//!
//! - `registry`: Single source of truth for all supported languages and their metadata
//! - `language`: Validated `Language` handle; the only way to name a language elsewhere
//!
//! # Example
//!
//! ```rust,ignore
//! use site_content::i18n::{Language, LanguageRegistry};
//!
//! let vietnamese = Language::from_code("vi")?;
//! let languages = LanguageRegistry::get().list_enabled();
//! ```

mod language;
mod registry;

pub use language::Language;
pub use registry::{LanguageConfig, LanguageRegistry};
