//! Headless CMS access: document model, the one-shot fetcher, and an
//! optional keyed cache in front of it.

mod cache;
mod document;
mod fetcher;

pub use cache::CachedFetcher;
pub use document::{FileAsset, MediaRef, PageContentDocument, PageHeader, Section};
pub use fetcher::{CmsClient, ContentFetcher};
