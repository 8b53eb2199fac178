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
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::backend::SearchResult;
use crate::error::{ClientError, ClientResult};

/// Anything that can answer a ranked search
#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn search(&self, query: &str) -> ClientResult<Vec<SearchResult>>;
}

/// State of the single active search session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchSession {
    pub query: String,
    pub results: Vec<SearchResult>,
    pub is_loading: bool,
    pub error: Option<ClientError>,
}

impl SearchSession {
    pub fn doc_ids(&self) -> Vec<i64> {
        self.results.iter().map(|r| r.doc_id).collect()
    }
}

/// Owner of the search session.
///
/// Every `search` call takes a generation number; only the settlement of the
/// most recently issued call is written to the session, so a slow earlier
/// response can never overwrite a later one.
pub struct SearchStore {
    backend: Arc<dyn SearchBackend>,
    state: watch::Sender<SearchSession>,
    generation: AtomicU64,
}

impl SearchStore {
    pub fn new(backend: Arc<dyn SearchBackend>) -> Self {
        let (state, _) = watch::channel(SearchSession::default());
        Self {
            backend,
            state,
            generation: AtomicU64::new(0),
        }
    }

    /// Current session state
    pub fn session(&self) -> SearchSession {
        self.state.borrow().clone()
    }

    /// Observe session changes
    pub fn subscribe(&self) -> watch::Receiver<SearchSession> {
        self.state.subscribe()
    }

    pub async fn search(&self, query: &str) -> ClientResult<Vec<SearchResult>> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        self.state.send_modify(|session| {
            session.is_loading = true;
            session.error = None;
        });
        let mut guard = LoadingGuard {
            store: self,
            generation,
            armed: true,
        };

        let outcome = self.backend.search(query).await;

        // Checked under the state lock so a newer call or a clear() always wins
        let applied = self.state.send_if_modified(|session| {
            if !self.is_latest(generation) {
                return false;
            }
            match &outcome {
                Ok(results) => {
                    session.query = query.to_string();
                    session.results = results.clone();
                }
                Err(e) => session.error = Some(e.clone()),
            }
            session.is_loading = false;
            true
        });
        if !applied {
            debug!(
                query = query,
                generation = generation,
                "Search superseded by a newer query, dropping its outcome"
            );
        }
        guard.armed = false;

        if let Err(e) = &outcome {
            warn!(query = query, error = %e, "Search failed");
        }
        outcome
    }

    fn is_latest(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Reset the session; any in-flight search is superseded
    pub fn clear(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.state.send_replace(SearchSession::default());
    }
}

/// Clears the loading flag when a search future is dropped before settling
struct LoadingGuard<'a> {
    store: &'a SearchStore,
    generation: u64,
    armed: bool,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let generation = self.generation;
        let store = self.store;
        store.state.send_if_modified(|session| {
            if !store.is_latest(generation) {
                return false;
            }
            session.is_loading = false;
            true
        });
    }
}
