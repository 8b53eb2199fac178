// Copyright 2026 Muvon Un Limited
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::backend::client::{BackendClient, Deadline};
use crate::backend::types::{
    parse_content_response, parse_search_response, parse_snapshot_response, SearchResult,
    Snapshot,
};
use crate::error::ClientResult;
use crate::knowledge::DocumentSource;
use crate::search::SearchBackend;

impl BackendClient {
    /// Run a ranked search
    pub async fn search(&self, query: &str) -> ClientResult<Vec<SearchResult>> {
        let body: Value = self
            .get_json(
                "/search/search_engine",
                &[("query", query.to_string())],
                Deadline::Regular,
            )
            .await?;
        let results = parse_search_response(body)?;
        debug!(query = query, results = results.len(), "Search completed");
        Ok(results)
    }

    /// Fetch the full text of one document. No retries.
    pub async fn get_content(&self, doc_id: i64) -> ClientResult<String> {
        let body: Value = self
            .get_json(
                "/search/get_content",
                &[("doc_id", doc_id.to_string())],
                Deadline::Regular,
            )
            .await?;
        parse_content_response(doc_id, body)
    }

    /// Fetch the raw HTML page captured for a document
    pub async fn get_snapshot(&self, doc_id: i64) -> ClientResult<Snapshot> {
        let body: Value = self
            .get_json(
                "/search/get_snapshot",
                &[("doc_id", doc_id.to_string())],
                Deadline::Regular,
            )
            .await?;
        parse_snapshot_response(doc_id, body)
    }
}

#[async_trait]
impl DocumentSource for BackendClient {
    async fn fetch(&self, doc_id: i64) -> ClientResult<String> {
        self.get_content(doc_id).await
    }
}

#[async_trait]
impl SearchBackend for BackendClient {
    async fn search(&self, query: &str) -> ClientResult<Vec<SearchResult>> {
        BackendClient::search(self, query).await
    }
}
