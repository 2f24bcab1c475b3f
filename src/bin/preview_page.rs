//! Preview binary - loads a page the way the site does and prints each render
//!
//! Usage:
//!   cargo run --bin preview -- /about          # Current preference only
//!   cargo run --bin preview -- /about vi en    # Then switch languages in order
//!
//! Required environment variables:
//! - CMS_API_URL
//!
//! Optional:
//! - CMS_DATASET, CMS_TOKEN, PREFERENCE_FILE, TRANSITION_DELAY_MS (see config.rs)

use anyhow::{bail, Context, Result};
use site_content::binder::{PageDataBinder, PageView};
use site_content::cms::{CmsClient, ContentFetcher};
use site_content::config::Config;
use site_content::i18n::Language;
use site_content::preference::{JsonFileBackend, PreferenceStore};
use site_content::routes::PageKey;
use site_content::transition::TransitionController;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::info;

/// Wait until the binder shows content (or its failure notice) in `language`.
async fn settled(mut views: watch::Receiver<PageView>, language: Language) -> Result<PageView> {
    let wait = async {
        loop {
            {
                let view = views.borrow_and_update();
                let done = match &*view {
                    PageView::Ready(doc) => doc.language == language,
                    PageView::Failed { notice } => *notice == language.unavailable_notice(),
                    PageView::Skeleton | PageView::Loading => false,
                };
                if done {
                    return Ok(view.clone());
                }
            }
            views.changed().await.context("binder stopped")?;
        }
    };
    tokio::time::timeout(Duration::from_secs(30), wait)
        .await
        .context("Timed out waiting for content")?
}

fn print_view(label: &str, view: &PageView) {
    match view {
        PageView::Ready(doc) => {
            println!("[{}] {} ({})", label, doc.title().unwrap_or("<untitled>"), doc.language);
            for section in &doc.sections {
                println!(
                    "    - {} {}",
                    section.kind,
                    section.heading.as_deref().unwrap_or("")
                );
            }
        }
        PageView::Failed { notice } => println!("[{}] {}", label, notice),
        PageView::Skeleton | PageView::Loading => println!("[{}] ...", label),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("site_content=info".parse()?),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let Some(path) = args.next() else {
        bail!("Usage: preview <page path> [language ...]");
    };
    let languages: Vec<String> = args.collect();

    let page = PageKey::from_path(&path).with_context(|| format!("Unknown page '{}'", path))?;
    let config = Config::from_env()?;

    let store = Arc::new(PreferenceStore::open(
        JsonFileBackend::new(&config.preference_file),
        config.default_language,
    ));
    let fetcher: Arc<dyn ContentFetcher> = Arc::new(CmsClient::from_config(&config)?);

    let binders: Vec<(String, Arc<PageDataBinder>)> = [page, PageKey::Navigation]
        .into_iter()
        .map(|key| {
            let label = key.to_string();
            let binder = Arc::new(PageDataBinder::new(
                key,
                Arc::clone(&fetcher),
                Arc::clone(&store),
                TransitionController::new(config.transition_delay()),
            ));
            (label, binder)
        })
        .collect();

    let handles: Vec<_> = binders
        .iter()
        .map(|(_, binder)| Arc::clone(binder).spawn())
        .collect();

    let initial = store.language();
    info!("Previewing {} in '{}'", path, initial);
    let views =
        futures::future::join_all(binders.iter().map(|(_, b)| settled(b.subscribe(), initial)))
            .await;
    for ((label, _), view) in binders.iter().zip(views) {
        print_view(label, &view?);
    }

    for code in languages {
        let language = store.set_language(&code)?;
        info!("Switched to '{}'", language);

        let views = futures::future::join_all(
            binders.iter().map(|(_, b)| settled(b.subscribe(), language)),
        )
        .await;
        for ((label, _), view) in binders.iter().zip(views) {
            print_view(label, &view?);
        }
    }

    for handle in handles {
        handle.abort();
    }
    Ok(())
}
