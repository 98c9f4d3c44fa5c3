// src/config.rs
//! Process configuration, read once from the environment at startup and
//! passed around as an immutable struct.

use anyhow::{bail, Result};

pub const DEFAULT_SERVICE: &str = "https://bsky.social";
const DEFAULT_LANGUAGE: &str = "rust";
const DEFAULT_POST_INTERVAL_SECS: u64 = 3600;
const DEFAULT_POST_COUNT: usize = 5;

#[derive(Debug, Clone)]
pub struct BotConfig {
    pub bluesky_username: String,
    pub bluesky_password: String,
    /// Base URL of the Bluesky PDS.
    pub service: String,
    /// Optional GitHub token; anonymous search works but is rate-limited harder.
    pub github_token: Option<String>,
    pub language: String,
    /// Governs external scheduling (cron/systemd timer); a single run ignores it.
    pub post_interval_secs: u64,
    /// How many repositories go into one thread.
    pub post_count: usize,
}

impl BotConfig {
    pub fn from_env() -> Result<Self> {
        let bluesky_username = required("BLUESKY_USERNAME")?;
        let bluesky_password = required("BLUESKY_PASSWORD")?;
        Ok(Self {
            bluesky_username,
            bluesky_password,
            service: optional("BLUESKY_SERVICE").unwrap_or_else(|| DEFAULT_SERVICE.to_string()),
            github_token: optional("GITHUB_TOKEN"),
            language: optional("TRENDING_LANGUAGE")
                .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
            post_interval_secs: parsed("POST_INTERVAL", DEFAULT_POST_INTERVAL_SECS),
            post_count: parsed("POST_COUNT", DEFAULT_POST_COUNT),
        })
    }
}

fn required(name: &str) -> Result<String> {
    match optional(name) {
        Some(v) => Ok(v),
        None => bail!("missing required environment variable {name}"),
    }
}

fn optional(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// Malformed values fall back to the default rather than aborting the run.
fn parsed<T: std::str::FromStr + Copy>(name: &str, default: T) -> T {
    optional(name).and_then(|v| v.parse().ok()).unwrap_or(default)
}
