//! Visitor language preference: one persisted value, broadcast on change.
//!
//! The store is an explicit object handed to every content-bound component
//! (usually behind an `Arc`). Reads never fail. Storage problems degrade the
//! store to in-memory state for the rest of the session.

use crate::error::{InvalidLanguageError, StorageError};
use crate::i18n::Language;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Where the single `language` value lives between sessions.
pub trait PreferenceBackend: Send + Sync {
    /// Read the stored language code, `None` if nothing was stored yet.
    fn load(&self) -> Result<Option<String>, StorageError>;

    fn save(&self, code: &str) -> Result<(), StorageError>;
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredPreference {
    language: String,
}

/// Stores `{"language": "<code>"}` in a small JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PreferenceBackend for JsonFileBackend {
    fn load(&self) -> Result<Option<String>, StorageError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let stored: StoredPreference = serde_json::from_str(&raw)?;
        Ok(Some(stored.language))
    }

    fn save(&self, code: &str) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let body = serde_json::to_string(&StoredPreference {
            language: code.to_string(),
        })?;
        std::fs::write(&self.path, body)?;
        Ok(())
    }
}

/// Process-local storage. `unavailable()` simulates disabled client storage.
#[derive(Debug)]
pub struct MemoryBackend {
    value: Mutex<Option<String>>,
    available: bool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            value: Mutex::new(None),
            available: true,
        }
    }

    pub fn with_value(code: &str) -> Self {
        Self {
            value: Mutex::new(Some(code.to_string())),
            available: true,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            value: Mutex::new(None),
            available: false,
        }
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl PreferenceBackend for MemoryBackend {
    fn load(&self) -> Result<Option<String>, StorageError> {
        if !self.available {
            return Err(StorageError::Unavailable);
        }
        let value = self.value.lock().map_err(|_| StorageError::Unavailable)?;
        Ok(value.clone())
    }

    fn save(&self, code: &str) -> Result<(), StorageError> {
        if !self.available {
            return Err(StorageError::Unavailable);
        }
        let mut value = self.value.lock().map_err(|_| StorageError::Unavailable)?;
        *value = Some(code.to_string());
        Ok(())
    }
}

/// Holds the current language and notifies subscribers when it changes.
pub struct PreferenceStore {
    backend: Box<dyn PreferenceBackend>,
    persistent: AtomicBool,
    sender: watch::Sender<Language>,
    // serialises the persist-then-broadcast sequence of `set_language`
    write_lock: Mutex<()>,
}

impl PreferenceStore {
    /// Open the store, resolving the initial language from storage.
    ///
    /// Falls back to `default` when nothing is stored, the stored code is no
    /// longer supported, or storage cannot be read.
    pub fn open(backend: impl PreferenceBackend + 'static, default: Language) -> Self {
        let mut persistent = true;

        let initial = match backend.load() {
            Ok(Some(code)) => match Language::from_code(&code) {
                Ok(language) => {
                    debug!("Restored language preference '{}'", language);
                    language
                }
                Err(e) => {
                    warn!("Ignoring stored preference: {}", e);
                    default
                }
            },
            Ok(None) => default,
            Err(e) => {
                warn!("{}; keeping language preference in memory only", e);
                persistent = false;
                default
            }
        };

        let (sender, _) = watch::channel(initial);

        Self {
            backend: Box::new(backend),
            persistent: AtomicBool::new(persistent),
            sender,
            write_lock: Mutex::new(()),
        }
    }

    /// Store with no persistence at all.
    pub fn in_memory(default: Language) -> Self {
        Self::open(MemoryBackend::new(), default)
    }

    /// Current language.
    pub fn language(&self) -> Language {
        *self.sender.borrow()
    }

    /// Select a new language.
    ///
    /// The code is validated before anything else happens: an unsupported
    /// code leaves the stored value and all subscribers untouched.
    pub fn set_language(&self, code: &str) -> Result<Language, InvalidLanguageError> {
        let language = Language::from_code(code)?;

        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if self.persistent.load(Ordering::Acquire) {
            if let Err(e) = self.backend.save(language.code()) {
                warn!("{}; keeping language preference in memory only", e);
                self.persistent.store(false, Ordering::Release);
            }
        }

        self.sender.send_replace(language);
        info!("Language preference set to '{}'", language);

        Ok(language)
    }

    /// Receive every subsequent language change.
    pub fn subscribe(&self) -> watch::Receiver<Language> {
        self.sender.subscribe()
    }

    /// Whether changes are still being written to storage.
    pub fn is_persistent(&self) -> bool {
        self.persistent.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for PreferenceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreferenceStore")
            .field("language", &self.language())
            .field("persistent", &self.is_persistent())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_first_load_uses_default() {
        let store = PreferenceStore::in_memory(Language::ENGLISH);
        assert_eq!(store.language(), Language::ENGLISH);
        assert!(store.is_persistent());
    }

    #[test]
    fn test_set_then_get_for_every_supported_language() {
        let store = PreferenceStore::in_memory(Language::ENGLISH);

        for config in crate::i18n::LanguageRegistry::get().list_enabled() {
            let set = store.set_language(config.code).expect("supported code");
            assert_eq!(set.code(), config.code);
            assert_eq!(store.language().code(), config.code);
        }
    }

    #[test]
    fn test_invalid_code_leaves_preference_unchanged() {
        let store = PreferenceStore::in_memory(Language::VIETNAMESE);
        let rx = store.subscribe();

        let err = store.set_language("de").unwrap_err();

        assert_eq!(err.code, "de");
        assert_eq!(store.language(), Language::VIETNAMESE);
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn test_invalid_code_is_not_persisted() {
        let store = PreferenceStore::open(MemoryBackend::with_value("vi"), Language::ENGLISH);
        assert!(store.set_language("xx").is_err());

        assert_eq!(store.backend.load().unwrap(), Some("vi".to_string()));
    }

    #[test]
    fn test_subscribers_notified_synchronously() {
        let store = PreferenceStore::in_memory(Language::ENGLISH);
        let mut first = store.subscribe();
        let mut second = store.subscribe();

        store.set_language("vi").unwrap();

        assert!(first.has_changed().unwrap());
        assert!(second.has_changed().unwrap());
        assert_eq!(*first.borrow_and_update(), Language::VIETNAMESE);
        assert_eq!(*second.borrow_and_update(), Language::VIETNAMESE);
    }

    #[test]
    fn test_round_trip_through_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prefs").join("preference.json");

        let store = PreferenceStore::open(JsonFileBackend::new(&path), Language::ENGLISH);
        store.set_language("vi").unwrap();
        drop(store);

        let reopened = PreferenceStore::open(JsonFileBackend::new(&path), Language::ENGLISH);
        assert_eq!(reopened.language(), Language::VIETNAMESE);
    }

    #[test]
    fn test_file_contains_single_language_key() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("preference.json");
        let backend = JsonFileBackend::new(&path);

        backend.save("vi").unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value, serde_json::json!({ "language": "vi" }));
    }

    #[test]
    fn test_unsupported_stored_code_falls_back() {
        let store = PreferenceStore::open(MemoryBackend::with_value("ja"), Language::ENGLISH);
        assert_eq!(store.language(), Language::ENGLISH);
        assert!(store.is_persistent());
    }

    #[test]
    fn test_corrupt_file_falls_back_to_memory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("preference.json");
        std::fs::write(&path, "not json").unwrap();

        let store = PreferenceStore::open(JsonFileBackend::new(&path), Language::VIETNAMESE);

        assert_eq!(store.language(), Language::VIETNAMESE);
        assert!(!store.is_persistent());
    }

    #[test]
    fn test_unavailable_storage_never_errors() {
        let store = PreferenceStore::open(MemoryBackend::unavailable(), Language::ENGLISH);
        assert!(!store.is_persistent());

        let set = store.set_language("vi").expect("storage failure must not surface");
        assert_eq!(set, Language::VIETNAMESE);
        assert_eq!(store.language(), Language::VIETNAMESE);
    }

    /// Readable but read-only storage (e.g. quota exceeded).
    struct ReadOnlyBackend;

    impl PreferenceBackend for ReadOnlyBackend {
        fn load(&self) -> Result<Option<String>, StorageError> {
            Ok(None)
        }

        fn save(&self, _code: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable)
        }
    }

    #[test]
    fn test_save_failure_degrades_to_memory() {
        let store = PreferenceStore::open(ReadOnlyBackend, Language::ENGLISH);
        assert!(store.is_persistent());

        store.set_language("vi").unwrap();

        assert!(!store.is_persistent());
        assert_eq!(store.language(), Language::VIETNAMESE);
    }
}
