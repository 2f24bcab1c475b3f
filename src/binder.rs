//! Per-page fetch-and-bind lifecycle.
//!
//! A [`PageDataBinder`] owns the content of exactly one page. Every request
//! it issues takes a generation number; a result is bound only if its
//! generation is still the newest one and its language still equals the
//! visitor's preference when it resolves. Anything else is discarded.

use crate::cms::{ContentFetcher, PageContentDocument};
use crate::i18n::Language;
use crate::preference::PreferenceStore;
use crate::routes::PageKey;
use crate::transition::{TransitionController, TransitionState};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, warn};

/// What the rendering host should display for the page.
#[derive(Debug, Clone, PartialEq)]
pub enum PageView {
    /// First load still pending.
    Skeleton,
    /// Full-screen loading indicator while a language swap is in progress.
    Loading,
    Ready(Arc<PageContentDocument>),
    /// Load failed; show a minimal notice instead of the page.
    Failed { notice: &'static str },
}

/// How a single request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Bound,
    /// Superseded by a newer request or a newer language; result ignored.
    Discarded,
    Failed,
}

#[derive(Debug)]
enum Content {
    Pending,
    Ready(Arc<PageContentDocument>),
    Failed(Language),
}

#[derive(Debug)]
struct BindState {
    generation: u64,
    content: Content,
}

pub struct PageDataBinder {
    page: PageKey,
    fetcher: Arc<dyn ContentFetcher>,
    store: Arc<PreferenceStore>,
    transition: TransitionController,
    state: Mutex<BindState>,
    view: watch::Sender<PageView>,
}

impl PageDataBinder {
    pub fn new(
        page: PageKey,
        fetcher: Arc<dyn ContentFetcher>,
        store: Arc<PreferenceStore>,
        transition: TransitionController,
    ) -> Self {
        let (view, _) = watch::channel(PageView::Skeleton);
        Self {
            page,
            fetcher,
            store,
            transition,
            state: Mutex::new(BindState {
                generation: 0,
                content: Content::Pending,
            }),
            view,
        }
    }

    pub fn page(&self) -> &PageKey {
        &self.page
    }

    pub fn transition(&self) -> &TransitionController {
        &self.transition
    }

    pub fn view(&self) -> PageView {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PageView> {
        self.view.subscribe()
    }

    /// The currently bound document, if any.
    pub fn current(&self) -> Option<Arc<PageContentDocument>> {
        match &self.lock().content {
            Content::Ready(doc) => Some(Arc::clone(doc)),
            _ => None,
        }
    }

    /// Initial load for the current language. No overlay: the view stays
    /// `Skeleton` until the document arrives.
    pub async fn mount(&self) -> LoadOutcome {
        let language = self.store.language();
        self.load(language, false).await
    }

    /// Swap to `language`: overlay, minimum hold, fetch, bind, settle.
    pub async fn change_language(&self, language: Language) -> LoadOutcome {
        self.load(language, true).await
    }

    /// Mount, then follow the preference store until the handle is aborted.
    ///
    /// Each change runs as its own task so overlapping loads may resolve in
    /// any order. Aborting the handle unmounts the page and cancels every
    /// load still in flight.
    pub fn spawn(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut changes = self.store.subscribe();
            changes.borrow_and_update();

            let mut loads = JoinSet::new();
            let binder = Arc::clone(&self);
            loads.spawn(async move { binder.mount().await });

            while changes.changed().await.is_ok() {
                let language = *changes.borrow_and_update();
                let binder = Arc::clone(&self);
                loads.spawn(async move { binder.change_language(language).await });

                reap_finished(&self.page, &mut loads);
            }
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BindState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn load(&self, language: Language, with_transition: bool) -> LoadOutcome {
        let generation = {
            let mut state = self.lock();
            state.generation += 1;
            if with_transition {
                self.transition.begin();
                self.publish(&state);
            }
            state.generation
        };

        if with_transition {
            self.transition.hold().await;
            if self.lock().generation != generation {
                debug!("{}: skipping superseded request for '{}'", self.page, language);
                return LoadOutcome::Discarded;
            }
        }

        let result = self.fetcher.fetch(&self.page, language).await;

        let outcome = {
            let mut state = self.lock();
            let current_language = self.store.language();
            if state.generation != generation || current_language != language {
                debug!(
                    "{}: discarding stale '{}' response (current '{}')",
                    self.page, language, current_language
                );
                // No newer request owns the overlay, so nothing else would lift it.
                if state.generation == generation && self.transition.is_transitioning() {
                    self.transition.abort();
                    self.publish(&state);
                }
                return LoadOutcome::Discarded;
            }

            let outcome = match result {
                Ok(doc) => {
                    state.content = Content::Ready(Arc::new(doc));
                    self.transition.content_bound();
                    LoadOutcome::Bound
                }
                Err(e) => {
                    warn!("{}: content unavailable in '{}': {}", self.page, language, e);
                    state.content = Content::Failed(language);
                    self.transition.abort();
                    LoadOutcome::Failed
                }
            };
            self.publish(&state);
            outcome
        };

        if outcome == LoadOutcome::Bound {
            // TransitioningIn lasts one scheduler turn: the new view is already
            // published, so hosts run any fade-out from the Ready view itself.
            tokio::task::yield_now().await;
            self.transition.settle();
        }

        outcome
    }

    fn publish(&self, state: &BindState) {
        let view = if self.transition.state() == TransitionState::TransitioningOut {
            PageView::Loading
        } else {
            match &state.content {
                Content::Pending => PageView::Skeleton,
                Content::Ready(doc) => PageView::Ready(Arc::clone(doc)),
                Content::Failed(language) => PageView::Failed {
                    notice: language.unavailable_notice(),
                },
            }
        };
        self.view.send_replace(view);
    }
}

/// Collect finished loads, logging any that panicked. Returns how many did.
fn reap_finished(page: &PageKey, loads: &mut JoinSet<LoadOutcome>) -> usize {
    let mut panicked = 0;
    while let Some(joined) = loads.try_join_next() {
        if let Err(e) = joined {
            warn!("{}: load task ended abnormally: {}", page, e);
            panicked += 1;
        }
    }
    panicked
}

impl std::fmt::Debug for PageDataBinder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageDataBinder")
            .field("page", &self.page)
            .field("transition", &self.transition.state())
            .finish()
    }
}
