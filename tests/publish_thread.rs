use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Result};
use trending_thread_bot::bluesky::{PostRef, PostingClient, ReplyRef};
use trending_thread_bot::thread::{ThreadPublisher, MAX_POST_CHARS};

/// Records every attempted send; optionally fails at one zero-based index.
#[derive(Clone, Default)]
struct FakeClient {
    calls: Arc<Mutex<Vec<(String, Option<ReplyRef>)>>>,
    fail_at: Option<usize>,
}

impl FakeClient {
    fn failing_at(index: usize) -> Self {
        Self {
            fail_at: Some(index),
            ..Self::default()
        }
    }

    fn calls(&self) -> Vec<(String, Option<ReplyRef>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl PostingClient for FakeClient {
    async fn post(&self, text: &str, reply: Option<&ReplyRef>) -> Result<PostRef> {
        let mut calls = self.calls.lock().unwrap();
        let index = calls.len();
        calls.push((text.to_string(), reply.cloned()));
        if self.fail_at == Some(index) {
            return Err(anyhow!("send rejected"));
        }
        Ok(PostRef {
            uri: format!("at://did:plc:bot/app.bsky.feed.post/{index}"),
            cid: format!("cid-{index}"),
        })
    }
}

fn blocks(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("block {i}")).collect()
}

fn publisher(client: FakeClient) -> ThreadPublisher<FakeClient> {
    ThreadPublisher::new(client).with_pace(Duration::ZERO)
}

#[tokio::test]
async fn chain_links_root_to_first_and_parent_to_previous() {
    let fake = FakeClient::default();
    let outcome = publisher(fake.clone()).publish_thread(&blocks(4)).await;

    assert_eq!(outcome.posted, 4);
    assert_eq!(outcome.total, 4);
    assert!(outcome.complete());

    let calls = fake.calls();
    assert!(calls[0].1.is_none(), "first post must not carry linkage");
    for (k, (_, reply)) in calls.iter().enumerate().skip(1) {
        let reply = reply.as_ref().expect("replies carry linkage");
        assert_eq!(reply.root.uri, "at://did:plc:bot/app.bsky.feed.post/0");
        assert_eq!(reply.root.cid, "cid-0");
        assert_eq!(
            reply.parent.uri,
            format!("at://did:plc:bot/app.bsky.feed.post/{}", k - 1)
        );
        assert_eq!(reply.parent.cid, format!("cid-{}", k - 1));
    }
}

#[tokio::test]
async fn first_post_failure_attempts_nothing_further() {
    let fake = FakeClient::failing_at(0);
    let outcome = publisher(fake.clone()).publish_thread(&blocks(4)).await;

    assert_eq!(outcome.posted, 0);
    assert!(!outcome.complete());
    assert_eq!(fake.calls().len(), 1, "no send after the root failed");
}

#[tokio::test]
async fn mid_thread_failure_keeps_earlier_posts_and_stops() {
    let fake = FakeClient::failing_at(2);
    let outcome = publisher(fake.clone()).publish_thread(&blocks(5)).await;

    assert_eq!(outcome.posted, 2);
    assert_eq!(outcome.total, 5);
    // The failed attempt itself is the last recorded call.
    assert_eq!(fake.calls().len(), 3);
}

#[tokio::test]
async fn oversize_block_truncated_to_exactly_300_before_send() {
    let fake = FakeClient::default();
    let oversized = vec!["x".repeat(400)];
    publisher(fake.clone()).publish_thread(&oversized).await;

    let calls = fake.calls();
    let sent = &calls[0].0;
    assert_eq!(sent.chars().count(), MAX_POST_CHARS);
    assert_eq!(*sent, format!("{}...", "x".repeat(297)));
}

#[tokio::test]
async fn empty_block_list_is_a_complete_noop() {
    let fake = FakeClient::default();
    let outcome = publisher(fake.clone()).publish_thread(&[]).await;

    assert_eq!(outcome.posted, 0);
    assert_eq!(outcome.total, 0);
    assert!(outcome.complete());
    assert!(fake.calls().is_empty());
}
