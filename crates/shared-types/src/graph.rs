//! # Remote Graph Port
//!
//! Outbound port to the remote social graph.
//!
//! The production client (HTTP transport, cursor pagination, retry with
//! exponential backoff on rate limits, session resolution) is an external
//! collaborator. The core only relies on its contract: every call either
//! returns a complete page or fails after the client exhausted its retries.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::entities::{Did, FollowedUser};
use crate::errors::GraphError;

/// One page of the "follows of identity X" listing.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FollowsPage {
    /// Accounts on this page.
    #[serde(default, deserialize_with = "lenient_list")]
    pub follows: Vec<FollowedUser>,
    /// Cursor for the next page; `None` when the listing is exhausted.
    #[serde(default)]
    pub cursor: Option<String>,
}

/// A public block record written by some identity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockRecord {
    /// Record URI.
    pub uri: String,
    /// The blocked identity.
    pub subject: Did,
    /// Creation time as reported by the record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// One page of the "block records written by identity Y" listing.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockRecordsPage {
    /// Records on this page. A missing or non-list payload decodes as empty.
    #[serde(default, deserialize_with = "lenient_list")]
    pub records: Vec<BlockRecord>,
    /// Cursor for the next page; `None` when the listing is exhausted.
    #[serde(default)]
    pub cursor: Option<String>,
}

/// Decode a list field, normalizing anything that is not a list to empty.
///
/// Individual malformed items are skipped.
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    match value {
        Some(serde_json::Value::Array(items)) => Ok(items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect()),
        Some(other) => {
            tracing::debug!(kind = %json_kind(&other), "Non-list payload normalized to empty list");
            Ok(Vec::new())
        }
        None => Ok(Vec::new()),
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// Remote graph API (Driven Port).
#[async_trait]
pub trait GraphApi: Send + Sync {
    /// List accounts followed by `actor`, starting at `cursor`.
    async fn list_follows(
        &self,
        actor: &str,
        cursor: Option<&str>,
    ) -> Result<FollowsPage, GraphError>;

    /// Resolve the service endpoint hosting `did`'s records.
    async fn resolve_service_endpoint(&self, did: &str) -> Result<String, GraphError>;

    /// List block records written by `did` on `service_endpoint`, starting at `cursor`.
    async fn list_block_records(
        &self,
        service_endpoint: &str,
        did: &str,
        cursor: Option<&str>,
    ) -> Result<BlockRecordsPage, GraphError>;
}

/// Fetch the complete block list of `did`.
///
/// Resolves the identity's endpoint and follows cursors until none remains.
/// An empty page with a cursor is walked past; a cursor the listing already
/// returned ends the walk.
pub async fn fetch_block_list<G>(graph: &G, did: &str) -> Result<Vec<Did>, GraphError>
where
    G: GraphApi + ?Sized,
{
    let endpoint = graph.resolve_service_endpoint(did).await?;
    let mut seen_cursors = HashSet::new();
    let mut cursor: Option<String> = None;
    let mut subjects = Vec::new();

    loop {
        let page = graph
            .list_block_records(&endpoint, did, cursor.as_deref())
            .await?;
        subjects.extend(page.records.into_iter().map(|record| record.subject));

        match page.cursor {
            Some(next) if seen_cursors.insert(next.clone()) => cursor = Some(next),
            _ => break,
        }
    }

    Ok(subjects)
}

// =============================================================================
// In-memory graph for testing
// =============================================================================

/// In-memory social graph.
///
/// Pages its listings with offset cursors and can be told to fail
/// block-list fetches for chosen identities.
pub struct InMemoryGraph {
    follows: RwLock<HashMap<Did, Vec<FollowedUser>>>,
    blocks: RwLock<HashMap<Did, Vec<Did>>>,
    failing: RwLock<HashSet<Did>>,
    fail_follows: AtomicBool,
    page_size: usize,
    block_list_calls: AtomicUsize,
    follow_page_calls: AtomicUsize,
}

impl Default for InMemoryGraph {
    fn default() -> Self {
        Self::with_page_size(50)
    }
}

impl InMemoryGraph {
    /// Create an empty graph with 50-item pages.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty graph with the given page size.
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            follows: RwLock::new(HashMap::new()),
            blocks: RwLock::new(HashMap::new()),
            failing: RwLock::new(HashSet::new()),
            fail_follows: AtomicBool::new(false),
            page_size: page_size.max(1),
            block_list_calls: AtomicUsize::new(0),
            follow_page_calls: AtomicUsize::new(0),
        }
    }

    /// Replace the follow list of `owner`.
    pub fn set_follows(&self, owner: &str, users: Vec<FollowedUser>) {
        self.follows.write().insert(owner.to_string(), users);
    }

    /// Replace the block list written by `did`.
    pub fn set_blocks<I, T>(&self, did: &str, blocked: I)
    where
        I: IntoIterator<Item = T>,
        T: Into<Did>,
    {
        let blocked = blocked.into_iter().map(Into::into).collect();
        self.blocks.write().insert(did.to_string(), blocked);
    }

    /// Make block-list fetches for `did` fail.
    pub fn fail_blocks_for(&self, did: &str) {
        self.failing.write().insert(did.to_string());
    }

    /// Clear all injected block-list failures.
    pub fn clear_failures(&self) {
        self.failing.write().clear();
    }

    /// Make follow enumeration fail.
    pub fn set_fail_follows(&self, fail: bool) {
        self.fail_follows.store(fail, Ordering::SeqCst);
    }

    /// Number of block-record pages served so far.
    pub fn block_list_calls(&self) -> usize {
        self.block_list_calls.load(Ordering::SeqCst)
    }

    /// Number of follow pages served so far.
    pub fn follow_page_calls(&self) -> usize {
        self.follow_page_calls.load(Ordering::SeqCst)
    }

    fn paginate<T: Clone>(
        &self,
        items: &[T],
        cursor: Option<&str>,
    ) -> Result<(Vec<T>, Option<String>), GraphError> {
        let start = match cursor {
            Some(c) => c
                .parse::<usize>()
                .map_err(|_| GraphError::Malformed(format!("bad cursor {c}")))?,
            None => 0,
        };
        let start = start.min(items.len());
        let end = (start + self.page_size).min(items.len());
        let next = (end < items.len()).then(|| end.to_string());
        Ok((items[start..end].to_vec(), next))
    }
}

#[async_trait]
impl GraphApi for InMemoryGraph {
    async fn list_follows(
        &self,
        actor: &str,
        cursor: Option<&str>,
    ) -> Result<FollowsPage, GraphError> {
        self.follow_page_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_follows.load(Ordering::SeqCst) {
            return Err(GraphError::Network("follows listing unavailable".to_string()));
        }
        let guard = self.follows.read();
        let all = guard.get(actor).map(Vec::as_slice).unwrap_or(&[]);
        let (follows, cursor) = self.paginate(all, cursor)?;
        Ok(FollowsPage { follows, cursor })
    }

    async fn resolve_service_endpoint(&self, did: &str) -> Result<String, GraphError> {
        Ok(format!("mem://{did}"))
    }

    async fn list_block_records(
        &self,
        _service_endpoint: &str,
        did: &str,
        cursor: Option<&str>,
    ) -> Result<BlockRecordsPage, GraphError> {
        self.block_list_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.read().contains(did) {
            return Err(GraphError::Remote {
                status: 500,
                message: format!("block records unavailable for {did}"),
            });
        }
        let guard = self.blocks.read();
        let all = guard.get(did).map(Vec::as_slice).unwrap_or(&[]);
        let (subjects, cursor) = self.paginate(all, cursor)?;
        let records = subjects
            .into_iter()
            .enumerate()
            .map(|(i, subject)| BlockRecord {
                uri: format!("at://{did}/app.bsky.graph.block/{i}"),
                subject,
                created_at: None,
            })
            .collect();
        Ok(BlockRecordsPage { records, cursor })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_list_records_normalized_to_empty() {
        let page: BlockRecordsPage =
            serde_json::from_str(r#"{"records": {"error": "oops"}, "cursor": null}"#).unwrap();
        assert!(page.records.is_empty());

        let page: BlockRecordsPage = serde_json::from_str(r#"{}"#).unwrap();
        assert!(page.records.is_empty());
    }

    #[test]
    fn test_malformed_items_are_skipped() {
        let page: BlockRecordsPage = serde_json::from_str(
            r#"{"records": [{"uri": "at://a/1", "subject": "did:plc:x"}, 42]}"#,
        )
        .unwrap();
        assert_eq!(page.records.len(), 1);
        assert_eq!(page.records[0].subject, "did:plc:x");
    }

    #[tokio::test]
    async fn test_fetch_block_list_follows_all_pages() {
        let graph = InMemoryGraph::with_page_size(2);
        graph.set_blocks("did:plc:a", ["p1", "p2", "p3", "p4", "p5"]);

        let blocks = fetch_block_list(&graph, "did:plc:a").await.unwrap();

        assert_eq!(blocks, vec!["p1", "p2", "p3", "p4", "p5"]);
        assert_eq!(graph.block_list_calls(), 3);
    }

    #[tokio::test]
    async fn test_fetch_block_list_unknown_user_is_empty() {
        let graph = InMemoryGraph::new();
        let blocks = fetch_block_list(&graph, "did:plc:nobody").await.unwrap();
        assert!(blocks.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_block_list_propagates_failure() {
        let graph = InMemoryGraph::new();
        graph.set_blocks("did:plc:a", ["p1"]);
        graph.fail_blocks_for("did:plc:a");

        let result = fetch_block_list(&graph, "did:plc:a").await;
        assert!(matches!(result, Err(GraphError::Remote { status: 500, .. })));
    }

    /// Graph whose cursor never advances.
    struct StuckGraph;

    #[async_trait]
    impl GraphApi for StuckGraph {
        async fn list_follows(
            &self,
            _actor: &str,
            _cursor: Option<&str>,
        ) -> Result<FollowsPage, GraphError> {
            Ok(FollowsPage::default())
        }

        async fn resolve_service_endpoint(&self, _did: &str) -> Result<String, GraphError> {
            Ok("mem://stuck".to_string())
        }

        async fn list_block_records(
            &self,
            _service_endpoint: &str,
            _did: &str,
            _cursor: Option<&str>,
        ) -> Result<BlockRecordsPage, GraphError> {
            Ok(BlockRecordsPage {
                records: vec![BlockRecord {
                    uri: "at://stuck/1".to_string(),
                    subject: "p1".to_string(),
                    created_at: None,
                }],
                cursor: Some("same".to_string()),
            })
        }
    }

    #[tokio::test]
    async fn test_fetch_block_list_stops_on_repeated_cursor() {
        let blocks = fetch_block_list(&StuckGraph, "did:plc:stuck").await.unwrap();
        // First page (no cursor) plus one page at "same", then the cursor repeats.
        assert_eq!(blocks.len(), 2);
    }

    /// Cursor the page is served at, its subjects, and the next cursor.
    type ScriptedPage = (Option<&'static str>, Vec<&'static str>, Option<&'static str>);

    /// Block listing served from a fixed cursor map.
    struct ScriptedBlocks {
        pages: Vec<ScriptedPage>,
        calls: AtomicUsize,
    }

    impl ScriptedBlocks {
        fn new(pages: &[ScriptedPage]) -> Self {
            Self {
                pages: pages.to_vec(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl GraphApi for ScriptedBlocks {
        async fn list_follows(
            &self,
            _actor: &str,
            _cursor: Option<&str>,
        ) -> Result<FollowsPage, GraphError> {
            Ok(FollowsPage::default())
        }

        async fn resolve_service_endpoint(&self, _did: &str) -> Result<String, GraphError> {
            Ok("mem://scripted".to_string())
        }

        async fn list_block_records(
            &self,
            _service_endpoint: &str,
            _did: &str,
            cursor: Option<&str>,
        ) -> Result<BlockRecordsPage, GraphError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let (subjects, next) = self
                .pages
                .iter()
                .find(|(at, _, _)| *at == cursor)
                .map(|(_, subjects, next)| (subjects.clone(), *next))
                .unwrap_or_default();
            Ok(BlockRecordsPage {
                records: subjects
                    .into_iter()
                    .map(|subject| BlockRecord {
                        uri: format!("at://scripted/{subject}"),
                        subject: subject.to_string(),
                        created_at: None,
                    })
                    .collect(),
                cursor: next.map(str::to_string),
            })
        }
    }

    #[tokio::test]
    async fn test_fetch_block_list_walks_past_empty_page() {
        let graph = ScriptedBlocks::new(&[
            (None, vec![], Some("c1")),
            (Some("c1"), vec!["p1"], Some("c2")),
            (Some("c2"), vec![], Some("c3")),
            (Some("c3"), vec!["p2"], None),
        ]);

        let blocks = fetch_block_list(&graph, "did:plc:a").await.unwrap();

        assert_eq!(blocks, vec!["p1", "p2"]);
        assert_eq!(graph.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_fetch_block_list_stops_on_cursor_cycle() {
        let graph = ScriptedBlocks::new(&[
            (None, vec!["p1"], Some("a")),
            (Some("a"), vec!["p2"], Some("b")),
            (Some("b"), vec!["p3"], Some("a")),
        ]);

        let blocks = fetch_block_list(&graph, "did:plc:a").await.unwrap();

        assert_eq!(blocks, vec!["p1", "p2", "p3"]);
        assert_eq!(graph.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_in_memory_follows_pagination() {
        let graph = InMemoryGraph::with_page_size(2);
        let users = (0..5)
            .map(|i| FollowedUser::new(format!("did:plc:{i}"), format!("u{i}.test")))
            .collect();
        graph.set_follows("did:plc:me", users);

        let first = graph.list_follows("did:plc:me", None).await.unwrap();
        assert_eq!(first.follows.len(), 2);
        assert_eq!(first.cursor.as_deref(), Some("2"));

        let last = graph.list_follows("did:plc:me", Some("4")).await.unwrap();
        assert_eq!(last.follows.len(), 1);
        assert!(last.cursor.is_none());
    }
}
