//! Loading overlay state for language swaps.
//!
//! ```text
//! Idle --begin--> TransitioningOut --content_bound--> TransitioningIn --settle--> Idle
//!                        |                                                     ^
//!                        +--------------------------abort------------------------+
//! ```
//!
//! `Idle` is never reached from `TransitioningOut` except through `abort`,
//! which the binder only uses when the awaited fetch failed.

use serde::Serialize;
use std::time::Duration;
use tokio::sync::watch;
use tracing::debug;

/// Default minimum time the loading overlay stays visible.
pub const DEFAULT_MIN_VISIBLE: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionState {
    Idle,
    /// Previous content unmounted, overlay shown, new content pending.
    TransitioningOut,
    /// New content bound, overlay on its way out.
    TransitioningIn,
}

impl TransitionState {
    pub fn is_transitioning(self) -> bool {
        self != TransitionState::Idle
    }
}

/// Owns the transition state of one page. Only the fetch lifecycle moves it.
#[derive(Debug)]
pub struct TransitionController {
    state: watch::Sender<TransitionState>,
    min_visible: Duration,
}

impl TransitionController {
    pub fn new(min_visible: Duration) -> Self {
        let (state, _) = watch::channel(TransitionState::Idle);
        Self { state, min_visible }
    }

    pub fn state(&self) -> TransitionState {
        *self.state.borrow()
    }

    pub fn is_transitioning(&self) -> bool {
        self.state().is_transitioning()
    }

    pub fn min_visible(&self) -> Duration {
        self.min_visible
    }

    pub fn subscribe(&self) -> watch::Receiver<TransitionState> {
        self.state.subscribe()
    }

    /// Start (or restart) a swap: hide current content behind the overlay.
    pub fn begin(&self) {
        self.state.send_replace(TransitionState::TransitioningOut);
        debug!("Transition started");
    }

    /// New content is bound. Returns false if no swap was in progress.
    pub fn content_bound(&self) -> bool {
        self.state.send_if_modified(|state| {
            if *state == TransitionState::TransitioningOut {
                *state = TransitionState::TransitioningIn;
                true
            } else {
                false
            }
        })
    }

    /// Finish the swap. Ignored unless content has been bound.
    pub fn settle(&self) -> bool {
        let settled = self.state.send_if_modified(|state| {
            if *state == TransitionState::TransitioningIn {
                *state = TransitionState::Idle;
                true
            } else {
                false
            }
        });
        if settled {
            debug!("Transition finished");
        }
        settled
    }

    /// Leave the overlay after a failed load.
    pub fn abort(&self) {
        self.state.send_if_modified(|state| {
            let changed = *state != TransitionState::Idle;
            *state = TransitionState::Idle;
            changed
        });
    }

    /// Keep the overlay up for the configured minimum duration.
    pub async fn hold(&self) {
        if !self.min_visible.is_zero() {
            tokio::time::sleep(self.min_visible).await;
        }
    }
}

impl Default for TransitionController {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_VISIBLE)
    }
}
