use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{ClientError, ClientResult};
use crate::search::SearchSession;

/// Separator placed in front of every document appended to the blob
pub const DOCUMENT_SEPARATOR: &str = "\n\n";

/// Source of full document text, one independently failable call per id
#[async_trait]
pub trait DocumentSource: Send + Sync {
    async fn fetch(&self, doc_id: i64) -> ClientResult<String>;
}

/// Immutable copy of the knowledge blob, cheap to clone and share
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnowledgeSnapshot(Arc<str>);

impl KnowledgeSnapshot {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl From<&str> for KnowledgeSnapshot {
    fn from(text: &str) -> Self {
        Self(Arc::from(text))
    }
}

impl std::fmt::Display for KnowledgeSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of one aggregation run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregationReport {
    /// Documents appended, in completion order
    pub appended: Vec<i64>,
    /// Documents whose fetch succeeded with empty content
    pub empty: Vec<i64>,
    /// Documents whose fetch failed
    pub failed: Vec<(i64, ClientError)>,
}

impl AggregationReport {
    pub fn requested(&self) -> usize {
        self.appended.len() + self.empty.len() + self.failed.len()
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Builds the context blob fed to the chat pipeline from fetched documents.
///
/// `aggregate` takes `&mut self` and settles only after every fetch has
/// settled, so a snapshot can never observe a half-built blob.
pub struct KnowledgeAggregator {
    source: Arc<dyn DocumentSource>,
    blob: String,
    max_concurrent: usize,
}

impl KnowledgeAggregator {
    pub fn new(source: Arc<dyn DocumentSource>, max_concurrent: usize) -> Self {
        Self {
            source,
            blob: String::new(),
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Fetch every distinct id concurrently and rebuild the blob.
    ///
    /// Contents are appended in fetch completion order. Failures are logged
    /// and reported but never abort sibling fetches.
    pub async fn aggregate<I>(&mut self, doc_ids: I) -> AggregationReport
    where
        I: IntoIterator<Item = i64>,
    {
        self.blob.clear();

        let mut seen = HashSet::new();
        let ids: Vec<i64> = doc_ids.into_iter().filter(|id| seen.insert(*id)).collect();

        let mut report = AggregationReport::default();
        if ids.is_empty() {
            debug!("No documents to aggregate");
            return report;
        }

        let source = Arc::clone(&self.source);
        let mut fetches = stream::iter(ids)
            .map(|doc_id| {
                let source = Arc::clone(&source);
                async move { (doc_id, source.fetch(doc_id).await) }
            })
            .buffer_unordered(self.max_concurrent);

        while let Some((doc_id, result)) = fetches.next().await {
            match result {
                Ok(content) if content.is_empty() => {
                    debug!(doc_id = doc_id, "Document has no content, skipping");
                    report.empty.push(doc_id);
                }
                Ok(content) => {
                    self.blob.push_str(DOCUMENT_SEPARATOR);
                    self.blob.push_str(&content);
                    report.appended.push(doc_id);
                }
                Err(e) => {
                    warn!(doc_id = doc_id, error = %e, "Failed to fetch document content");
                    report.failed.push((doc_id, e));
                }
            }
        }

        info!(
            appended = report.appended.len(),
            empty = report.empty.len(),
            failed = report.failed.len(),
            bytes = self.blob.len(),
            "Knowledge aggregated"
        );
        report
    }

    /// Aggregate the documents of the session's current result set.
    /// `limit` keeps only the top-ranked results; 0 means all.
    pub async fn aggregate_session(
        &mut self,
        session: &SearchSession,
        limit: usize,
    ) -> AggregationReport {
        let take = if limit == 0 { usize::MAX } else { limit };
        self.aggregate(session.doc_ids().into_iter().take(take)).await
    }

    /// Copy the current blob for a chat request
    pub fn snapshot(&self) -> KnowledgeSnapshot {
        KnowledgeSnapshot::from(self.blob.as_str())
    }

    pub fn clear(&mut self) {
        self.blob.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.blob.is_empty()
    }
}
