// src/trending.rs
//! GitHub repository-search client: trending queries per time period plus
//! the fast-growing cross-reference against a recent-creations query.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::preview;

const GITHUB_API: &str = "https://api.github.com";
const ACCEPT_HEADER: &str = "application/vnd.github.v3+json";
const PRIMARY_PAGE_SIZE: u32 = 10;
const SECONDARY_PAGE_SIZE: u32 = 15;
const FAST_GROWING_TOP_N: usize = 10;
const FAST_GROWING_WINDOW_DAYS: i64 = 30;

/// One trending repository as handed to the thread composer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRecord {
    /// Qualified `owner/repo` name.
    pub name: String,
    pub description: Option<String>,
    pub url: String,
    pub stars: u64,
    pub forks: u64,
    pub language: Option<String>,
    /// ISO 8601 creation timestamp as delivered by the API.
    pub created_at: Option<String>,
    pub fast_growing: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimePeriod {
    Daily,
    Weekly,
    Monthly,
}

impl TimePeriod {
    fn pushed_since(self, now: DateTime<Utc>) -> chrono::NaiveDate {
        match self {
            TimePeriod::Daily => now.date_naive(),
            TimePeriod::Weekly => (now - Duration::days(7)).date_naive(),
            TimePeriod::Monthly => (now - Duration::days(30)).date_naive(),
        }
    }
}

/// Popularity-sorted search bounded by a recency-of-push predicate.
pub fn primary_query(language: &str, period: TimePeriod, now: DateTime<Utc>) -> String {
    format!(
        "language:{} sort:stars-desc pushed:>={}",
        language,
        period.pushed_since(now).format("%Y-%m-%d")
    )
}

/// Popularity-sorted search over repositories created in the trailing window;
/// its top ids approximate "fast growing".
pub fn secondary_query(language: &str, now: DateTime<Utc>) -> String {
    let since = (now - Duration::days(FAST_GROWING_WINDOW_DAYS)).date_naive();
    format!(
        "language:{} sort:stars created:>{}",
        language,
        since.format("%Y-%m-%d")
    )
}

#[derive(Debug, Deserialize)]
struct SearchPayload {
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: u64,
    full_name: String,
    description: Option<String>,
    html_url: String,
    stargazers_count: u64,
    forks_count: u64,
    language: Option<String>,
    created_at: Option<String>,
}

/// Map a raw search payload to records, flagging those whose id appears in
/// `fast_ids`. Order from the payload is preserved.
pub fn records_from_payload(payload: &str, fast_ids: &[u64]) -> Result<Vec<RepoRecord>> {
    let parsed: SearchPayload =
        serde_json::from_str(payload).context("parsing repository search payload")?;
    Ok(parsed
        .items
        .into_iter()
        .map(|item| RepoRecord {
            fast_growing: fast_ids.contains(&item.id),
            name: item.full_name,
            description: item.description,
            url: item.html_url,
            stars: item.stargazers_count,
            forks: item.forks_count,
            language: item.language,
            created_at: item.created_at,
        })
        .collect())
}

/// The first `top_n` ids of a search payload, in result order.
pub fn top_fast_ids(payload: &str, top_n: usize) -> Result<Vec<u64>> {
    let parsed: SearchPayload =
        serde_json::from_str(payload).context("parsing fast-growing search payload")?;
    Ok(parsed.items.iter().take(top_n).map(|item| item.id).collect())
}

pub struct TrendingFetcher {
    client: Client,
    language: String,
    token: Option<String>,
}

impl TrendingFetcher {
    pub fn new(language: String, token: Option<String>) -> Result<Self> {
        // GitHub rejects requests without a User-Agent.
        let client = Client::builder()
            .user_agent(crate::USER_AGENT)
            .build()
            .context("building github http client")?;
        Ok(Self {
            client,
            language,
            token,
        })
    }

    /// Fetch trending repositories for the period. Infallible at the call
    /// site: transport and parse failures are logged and collapse to empty.
    pub async fn fetch(&self, period: TimePeriod) -> Vec<RepoRecord> {
        info!(language = %self.language, ?period, "fetching trending repositories");
        match self.fetch_trending(period).await {
            Ok(records) => {
                info!(count = records.len(), "found trending repositories");
                records
            }
            Err(e) => {
                error!(error = ?e, "failed to fetch trending repositories");
                Vec::new()
            }
        }
    }

    async fn fetch_trending(&self, period: TimePeriod) -> Result<Vec<RepoRecord>> {
        let now = Utc::now();
        let body = self
            .search(&primary_query(&self.language, period, now), PRIMARY_PAGE_SIZE)
            .await?;
        let fast_ids = self.fast_growing_ids(now).await;
        records_from_payload(&body, &fast_ids)
    }

    // Secondary query errors degrade to an empty id set so only the
    // fast-growing flag is lost, never the primary results.
    async fn fast_growing_ids(&self, now: DateTime<Utc>) -> Vec<u64> {
        let query = secondary_query(&self.language, now);
        let result = self
            .search(&query, SECONDARY_PAGE_SIZE)
            .await
            .and_then(|body| top_fast_ids(&body, FAST_GROWING_TOP_N));
        match result {
            Ok(ids) => ids,
            Err(e) => {
                warn!(error = ?e, "could not fetch fast-growing repositories");
                Vec::new()
            }
        }
    }

    async fn search(&self, query: &str, per_page: u32) -> Result<String> {
        let per_page = per_page.to_string();
        let mut request = self
            .client
            .get(format!("{GITHUB_API}/search/repositories"))
            .header(reqwest::header::ACCEPT, ACCEPT_HEADER)
            .query(&[("q", query), ("per_page", per_page.as_str())]);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.context("github search request")?;
        let status = response.status();
        let body = response.text().await.context("github search body")?;
        if !status.is_success() {
            bail!("github search returned {status}: {}", preview(&body, 200));
        }
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn daily_query_bounds_by_start_of_day() {
        let now = Utc.with_ymd_and_hms(2024, 3, 5, 15, 30, 0).unwrap();
        assert_eq!(
            primary_query("rust", TimePeriod::Daily, now),
            "language:rust sort:stars-desc pushed:>=2024-03-05"
        );
    }

    #[test]
    fn weekly_and_monthly_widen_the_window() {
        let now = Utc.with_ymd_and_hms(2024, 3, 5, 15, 30, 0).unwrap();
        assert_eq!(
            primary_query("rust", TimePeriod::Weekly, now),
            "language:rust sort:stars-desc pushed:>=2024-02-27"
        );
        assert_eq!(
            primary_query("rust", TimePeriod::Monthly, now),
            "language:rust sort:stars-desc pushed:>=2024-02-04"
        );
    }

    #[test]
    fn secondary_query_uses_trailing_creation_window() {
        let now = Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap();
        assert_eq!(
            secondary_query("python", now),
            "language:python sort:stars created:>2024-02-04"
        );
    }
}
