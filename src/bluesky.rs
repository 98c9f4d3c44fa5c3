// src/bluesky.rs
//! Bluesky posting client over raw XRPC: session login plus post creation
//! with optional thread reply linkage.

use anyhow::{bail, Context, Result};
use chrono::{SecondsFormat, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::preview;
use crate::thread::{truncate_with_ellipsis, MAX_POST_CHARS};

/// A post's reference pair as the platform identifies it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostRef {
    pub uri: String,
    pub cid: String,
}

/// Reply linkage: root is the first post of the thread, parent the post
/// being directly replied to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplyRef {
    pub root: PostRef,
    pub parent: PostRef,
}

/// Minimal capability the publisher needs; lets tests substitute a fake.
#[async_trait::async_trait]
pub trait PostingClient {
    async fn post(&self, text: &str, reply: Option<&ReplyRef>) -> Result<PostRef>;
}

#[derive(Debug, Serialize)]
struct CreateSessionRequest<'a> {
    identifier: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateSessionResponse {
    did: String,
    handle: String,
    access_jwt: String,
}

#[derive(Serialize)]
struct CreateRecordRequest<'a> {
    repo: &'a str,
    collection: &'a str,
    record: PostRecord<'a>,
}

#[derive(Serialize)]
struct PostRecord<'a> {
    #[serde(rename = "$type")]
    record_type: &'a str,
    text: &'a str,
    #[serde(rename = "createdAt")]
    created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply: Option<&'a ReplyRef>,
}

pub struct BlueskyClient {
    http: Client,
    service: String,
    did: String,
    access_jwt: String,
}

impl BlueskyClient {
    /// Create a session against the PDS. Auth failure here is fatal for the
    /// whole run and propagates to the caller.
    pub async fn login(service: &str, identifier: &str, password: &str) -> Result<Self> {
        let http = Client::builder()
            .user_agent(crate::USER_AGENT)
            .build()
            .context("building bluesky http client")?;

        let service = service.trim_end_matches('/').to_string();
        let response = http
            .post(format!("{service}/xrpc/com.atproto.server.createSession"))
            .json(&CreateSessionRequest {
                identifier,
                password,
            })
            .send()
            .await
            .context("bluesky createSession request")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("bluesky login failed with {status}: {}", preview(&body, 200));
        }
        let session: CreateSessionResponse = response
            .json()
            .await
            .context("parsing createSession response")?;
        info!(handle = %session.handle, "logged in to bluesky");

        Ok(Self {
            http,
            service,
            did: session.did,
            access_jwt: session.access_jwt,
        })
    }
}

#[async_trait::async_trait]
impl PostingClient for BlueskyClient {
    async fn post(&self, text: &str, reply: Option<&ReplyRef>) -> Result<PostRef> {
        // Platform hard limit, enforced here independently of the publisher.
        let chars = text.chars().count();
        let text = if chars > MAX_POST_CHARS {
            warn!(chars, "post text over limit, truncating");
            truncate_with_ellipsis(text, MAX_POST_CHARS)
        } else {
            text.to_string()
        };

        match reply {
            Some(reply) => {
                info!(root = %reply.root.uri, parent = %reply.parent.uri, "sending post as reply")
            }
            None => info!("sending post without reply linkage"),
        }

        let request = CreateRecordRequest {
            repo: &self.did,
            collection: "app.bsky.feed.post",
            record: PostRecord {
                record_type: "app.bsky.feed.post",
                text: &text,
                created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
                reply,
            },
        };

        let response = self
            .http
            .post(format!("{}/xrpc/com.atproto.repo.createRecord", self.service))
            .bearer_auth(&self.access_jwt)
            .json(&request)
            .send()
            .await
            .context("bluesky createRecord request")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!(
                "bluesky post failed with {status} for {:?}: {}",
                preview(&text, 30),
                preview(&body, 200)
            );
        }
        let post_ref: PostRef = response
            .json()
            .await
            .context("parsing createRecord response")?;
        info!(uri = %post_ref.uri, text = %preview(&text, 30), "post sent");
        Ok(post_ref)
    }
}
