// src/lib.rs
// Public library surface for integration tests (and the bin entrypoint).

pub mod bluesky;
pub mod config;
pub mod thread;
pub mod trending;

// ---- Re-exports for stable public API ----
pub use crate::bluesky::{BlueskyClient, PostRef, PostingClient, ReplyRef};
pub use crate::config::BotConfig;
pub use crate::thread::{ThreadComposer, ThreadOutcome, ThreadPublisher};
pub use crate::trending::{RepoRecord, TimePeriod, TrendingFetcher};

use anyhow::{Context, Result};
use tracing::{info, warn};

pub(crate) const USER_AGENT: &str = concat!("trending-thread-bot/", env!("CARGO_PKG_VERSION"));

/// First-N-chars preview so log lines stay diagnosable without dumping
/// whole payloads.
pub(crate) fn preview(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

/// One full bot run: log in, fetch, compose, publish.
///
/// Login failures are fatal and propagate. Fetch failures collapse to an
/// empty list inside the fetcher; an empty fetch skips posting entirely.
/// Publish failures abort the thread but never surface as an error here.
pub async fn run_once(cfg: &BotConfig) -> Result<()> {
    let client = BlueskyClient::login(&cfg.service, &cfg.bluesky_username, &cfg.bluesky_password)
        .await
        .context("bluesky login")?;

    let fetcher = TrendingFetcher::new(cfg.language.clone(), cfg.github_token.clone())?;
    let repos = fetcher.fetch(TimePeriod::Daily).await;
    if repos.is_empty() {
        warn!("no trending repositories found, skipping this run");
        return Ok(());
    }

    let blocks =
        ThreadComposer::new(&cfg.language, &cfg.bluesky_username).compose(&repos, cfg.post_count);
    let outcome = ThreadPublisher::new(client).publish_thread(&blocks).await;

    if outcome.complete() {
        info!(posts = outcome.posted, "posted trending repositories thread");
    } else {
        warn!(
            posted = outcome.posted,
            total = outcome.total,
            "thread aborted before completion"
        );
    }
    Ok(())
}
