//! Error taxonomy shared by the content pipeline.

use thiserror::Error;

/// Attempted to select a language the site is not published in.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unsupported language code: '{code}'")]
pub struct InvalidLanguageError {
    pub code: String,
}

/// A CMS request failed or returned no document.
#[derive(Debug, Error)]
pub enum ContentFetchError {
    #[error("No {document_type} document published for language '{language}'")]
    NotFound {
        document_type: &'static str,
        language: &'static str,
    },

    #[error("CMS returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("CMS request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Failed to decode CMS response: {0}")]
    Decode(String),
}

impl ContentFetchError {
    /// Whether the CMS answered but has nothing for this page/language.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ContentFetchError::NotFound { .. })
    }
}

/// Event fields that cannot be turned into a calendar link.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalendarError {
    #[error("Invalid event date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Invalid event time '{0}', expected HH:MM")]
    InvalidTime(String),

    #[error("Could not build calendar link: {0}")]
    InvalidLink(String),
}

/// Client-side preference storage failure. Never escapes the preference store.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Preference storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Preference storage is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("Preference storage is unavailable")]
    Unavailable,
}
