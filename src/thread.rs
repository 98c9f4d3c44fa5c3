// src/thread.rs
//! Thread composition and publishing: formats repository records into
//! ≤300-char blocks and chains them on the platform via root/parent
//! reply references.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{error, info};

use crate::bluesky::{PostRef, PostingClient, ReplyRef};
use crate::preview;
use crate::trending::RepoRecord;

pub const MAX_POST_CHARS: usize = 300;
pub const MAX_DESCRIPTION_CHARS: usize = 100;
const ELLIPSIS: &str = "...";
const DEFAULT_PACE: Duration = Duration::from_secs(2);

/// Truncate to `max_chars` Unicode scalar values, ellipsis included when cut.
pub fn truncate_with_ellipsis(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let keep = max_chars.saturating_sub(ELLIPSIS.len());
    let mut out: String = s.chars().take(keep).collect();
    out.push_str(ELLIPSIS);
    out
}

/// Formats a record list into thread blocks: intro, one block per item,
/// closing hashtags. Templates carry the language label and bot handle.
pub struct ThreadComposer {
    language: String,
    handle: String,
}

impl ThreadComposer {
    pub fn new(language: &str, handle: &str) -> Self {
        Self {
            language: capitalize(language),
            handle: handle.trim_start_matches('@').to_string(),
        }
    }

    pub fn compose(&self, records: &[RepoRecord], max_items: usize) -> Vec<String> {
        self.compose_at(records, max_items, Utc::now())
    }

    /// `now` is explicit so age computation stays deterministic under test.
    pub fn compose_at(
        &self,
        records: &[RepoRecord],
        max_items: usize,
        now: DateTime<Utc>,
    ) -> Vec<String> {
        if records.is_empty() {
            return vec![format!(
                "No trending {} repositories found today.",
                self.language
            )];
        }

        let mut blocks = Vec::with_capacity(records.len().min(max_items) + 2);

        blocks.push(format!(
            "⭐ {0} Trending Daily 🚀\n\nToday's most popular {0} repositories:",
            self.language
        ));

        for (i, repo) in records.iter().take(max_items).enumerate() {
            blocks.push(format_repo_block(i + 1, repo, now));
        }

        blocks.push(format!(
            "#{0}Dev #GitHub #Trending #{0} #Coding\n\n@{1}",
            self.language, self.handle
        ));

        blocks
            .into_iter()
            .map(|b| truncate_with_ellipsis(&b, MAX_POST_CHARS))
            .collect()
    }
}

fn format_repo_block(rank: usize, repo: &RepoRecord, now: DateTime<Utc>) -> String {
    let mut text = format!("{}. {}\n", rank, repo.name);
    text.push_str(&format!(
        "⭐ Stars: {} | 🍴 Forks: {}\n",
        repo.stars, repo.forks
    ));

    // Age is surfaced only on fast-growing entries, alongside the indicator.
    if repo.fast_growing {
        text.push_str("🚀 FAST GROWING! ");
        if let Some(days) = age_in_days(repo.created_at.as_deref(), now) {
            text.push_str(&format!("📅 Age: {days} days | "));
        }
        text.push('\n');
    }

    if let Some(desc) = repo.description.as_deref().filter(|d| !d.is_empty()) {
        text.push_str(&format!(
            "📝 {}\n",
            truncate_with_ellipsis(desc, MAX_DESCRIPTION_CHARS)
        ));
    }

    text.push_str(&format!("🔗 {}", repo.url));
    text
}

fn age_in_days(created_at: Option<&str>, now: DateTime<Utc>) -> Option<i64> {
    let created = DateTime::parse_from_rfc3339(created_at?).ok()?;
    Some((now - created.with_timezone(&Utc)).num_days())
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// How far a publish run got.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadOutcome {
    pub posted: usize,
    pub total: usize,
}

impl ThreadOutcome {
    pub fn complete(&self) -> bool {
        self.posted == self.total
    }
}

/// Publishes blocks sequentially as one thread: the first post stands alone,
/// every later one replies to its predecessor with the first as root.
pub struct ThreadPublisher<C: PostingClient> {
    client: C,
    pace: Duration,
}

impl<C: PostingClient> ThreadPublisher<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            pace: DEFAULT_PACE,
        }
    }

    /// Delay between consecutive sends; zero in tests.
    pub fn with_pace(mut self, pace: Duration) -> Self {
        self.pace = pace;
        self
    }

    /// Send failure aborts the remaining blocks: a first-post failure means
    /// the thread has no root, a later one leaves a partial thread standing.
    /// Either way the outcome reports how far the run got; no error surfaces.
    pub async fn publish_thread(&self, blocks: &[String]) -> ThreadOutcome {
        let total = blocks.len();
        let mut root: Option<PostRef> = None;
        let mut parent: Option<PostRef> = None;
        let mut posted = 0;

        for (i, block) in blocks.iter().enumerate() {
            // Safety net independent of whatever composed the block.
            let text = truncate_with_ellipsis(block, MAX_POST_CHARS);

            let reply = root
                .clone()
                .zip(parent.clone())
                .map(|(root, parent)| ReplyRef { root, parent });

            if i > 0 {
                tokio::time::sleep(self.pace).await;
            }

            info!(index = i + 1, total, text = %preview(&text, 30), "sending thread post");
            match self.client.post(&text, reply.as_ref()).await {
                Ok(post_ref) => {
                    if root.is_none() {
                        root = Some(post_ref.clone());
                    }
                    parent = Some(post_ref);
                    posted += 1;
                }
                Err(e) => {
                    if i == 0 {
                        error!(error = ?e, "initial post failed, aborting thread");
                    } else {
                        error!(error = ?e, index = i + 1, "reply post failed, aborting remaining posts");
                    }
                    break;
                }
            }
        }

        ThreadOutcome { posted, total }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_is_char_based_not_byte_based() {
        let s = "🚀".repeat(400);
        let out = truncate_with_ellipsis(&s, 300);
        assert_eq!(out.chars().count(), 300);
        assert!(out.ends_with("..."));
    }

    #[test]
    fn short_strings_pass_through_untouched() {
        assert_eq!(truncate_with_ellipsis("hello", 300), "hello");
        let exact = "x".repeat(300);
        assert_eq!(truncate_with_ellipsis(&exact, 300), exact);
    }

    #[test]
    fn age_ignores_missing_or_unparseable_timestamps() {
        let now = Utc::now();
        assert_eq!(age_in_days(None, now), None);
        assert_eq!(age_in_days(Some("not a date"), now), None);
    }

    #[test]
    fn age_counts_whole_days() {
        let now = DateTime::parse_from_rfc3339("2024-03-05T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(age_in_days(Some("2024-03-01T00:00:00Z"), now), Some(4));
    }

    #[test]
    fn capitalize_handles_lowercase_labels() {
        assert_eq!(capitalize("rust"), "Rust");
        assert_eq!(capitalize("Python"), "Python");
        assert_eq!(capitalize(""), "");
    }
}
