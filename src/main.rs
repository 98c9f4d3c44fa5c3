//! Trending Thread Bot — Binary Entrypoint
//! Loads `.env`, wires tracing to the console and `bot.log`, then performs a
//! single fetch-and-post run. Scheduling across runs (POST_INTERVAL) is left
//! to cron or a systemd timer.

use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use trending_thread_bot::{run_once, BotConfig};

fn init_tracing() -> tracing_appender::non_blocking::WorkerGuard {
    let file_appender = tracing_appender::rolling::never(".", "bot.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .with(fmt::layer().with_writer(file_writer).with_ansi(false))
        .init();

    guard
}

#[tokio::main]
async fn main() {
    // Load .env in local/dev; no-op when variables come from the environment.
    let _ = dotenvy::dotenv();

    let _guard = init_tracing();

    info!("starting trending thread bot");

    let cfg = match BotConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(error = ?e, "configuration incomplete, set BLUESKY_USERNAME and BLUESKY_PASSWORD");
            return;
        }
    };

    info!(
        language = %cfg.language,
        post_count = cfg.post_count,
        interval_secs = cfg.post_interval_secs,
        "configuration loaded"
    );

    // Nothing past config loading may take the process down.
    if let Err(e) = run_once(&cfg).await {
        error!(error = ?e, "bot run failed");
    }
}
