use crate::cms::{ContentFetcher, PageContentDocument};
use crate::error::ContentFetchError;
use crate::i18n::Language;
use crate::routes::PageKey;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::OnceCell;
use tracing::{debug, info};

type CacheKey = (PageKey, Language);
type Slot = Arc<OnceCell<Arc<PageContentDocument>>>;

/// Keyed cache and request de-duplication in front of a [`ContentFetcher`].
///
/// Concurrent callers for the same (page, language) share one upstream
/// request. Successful documents are kept until [`invalidate_all`] is called;
/// failures are not kept, so the next caller issues a fresh request.
///
/// [`invalidate_all`]: CachedFetcher::invalidate_all
pub struct CachedFetcher<F> {
    inner: F,
    slots: Mutex<HashMap<CacheKey, Slot>>,
}

impl<F: ContentFetcher> CachedFetcher<F> {
    pub fn new(inner: F) -> Self {
        Self {
            inner,
            slots: Mutex::new(HashMap::new()),
        }
    }

    fn slot(&self, page: &PageKey, language: Language) -> Slot {
        let mut slots = self
            .slots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        slots
            .entry((page.clone(), language))
            .or_default()
            .clone()
    }

    /// Shared handle to the document, fetching it at most once per key.
    pub async fn get(
        &self,
        page: &PageKey,
        language: Language,
    ) -> Result<Arc<PageContentDocument>, ContentFetchError> {
        let slot = self.slot(page, language);

        if let Some(doc) = slot.get() {
            debug!("Cache hit for {} ({})", page, language);
            return Ok(Arc::clone(doc));
        }

        let result = slot
            .get_or_try_init(|| async { self.inner.fetch(page, language).await.map(Arc::new) })
            .await
            .map(Arc::clone);

        if result.is_err() {
            self.evict(page, language, &slot);
        }
        result
    }

    /// Forget a failed slot so unknown keys do not accumulate. A newer slot
    /// installed by `invalidate_all` is left alone.
    fn evict(&self, page: &PageKey, language: Language, failed: &Slot) {
        let mut slots = self
            .slots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let key = (page.clone(), language);
        let same = slots
            .get(&key)
            .is_some_and(|current| Arc::ptr_eq(current, failed) && current.get().is_none());
        if same {
            slots.remove(&key);
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    /// Drop every cached document (e.g. after the CMS published changes).
    pub fn invalidate_all(&self) {
        let mut slots = self
            .slots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let count = slots.len();
        slots.clear();
        info!("Content cache cleared ({} entries)", count);
    }

    pub fn inner(&self) -> &F {
        &self.inner
    }
}

#[async_trait]
impl<F: ContentFetcher> ContentFetcher for CachedFetcher<F> {
    async fn fetch(
        &self,
        page: &PageKey,
        language: Language,
    ) -> Result<PageContentDocument, ContentFetchError> {
        self.get(page, language).await.map(|doc| (*doc).clone())
    }
}
