//! Language-aware CMS content loading for the company website.
//!
//! Visitors pick a language in the [`preference::PreferenceStore`]; every
//! [`binder::PageDataBinder`] follows it, hiding stale copy behind the
//! [`transition::TransitionController`] while the [`cms::ContentFetcher`]
//! loads the new document. The [`geo`] guard gates the investor pages at
//! the edge before any of that runs.

pub mod binder;
pub mod calendar;
pub mod cms;
pub mod config;
pub mod error;
pub mod geo;
pub mod i18n;
pub mod preference;
pub mod routes;
pub mod security;
pub mod server;
pub mod transition;
