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

#[cfg(test)]
mod tests {
    use super::super::store::{SearchBackend, SearchSession, SearchStore};
    use crate::backend::SearchResult;
    use crate::error::{ClientError, ClientResult, ErrorKind};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex, OnceLock};
    use std::time::Duration;
    use tokio::sync::watch;

    /// Backend answering each query after a fixed delay, recording what
    /// the session looked like while the request was in flight
    #[derive(Default)]
    struct ScriptedBackend {
        responses: HashMap<String, (u64, ClientResult<Vec<SearchResult>>)>,
        observer: OnceLock<watch::Receiver<SearchSession>>,
        loading_during_call: Mutex<Vec<bool>>,
    }

    impl ScriptedBackend {
        fn respond(mut self, query: &str, delay_ms: u64, result: ClientResult<Vec<SearchResult>>) -> Self {
            self.responses.insert(query.to_string(), (delay_ms, result));
            self
        }
    }

    #[async_trait]
    impl SearchBackend for ScriptedBackend {
        async fn search(&self, query: &str) -> ClientResult<Vec<SearchResult>> {
            if let Some(observer) = self.observer.get() {
                self.loading_during_call
                    .lock()
                    .unwrap()
                    .push(observer.borrow().is_loading);
            }
            let (delay_ms, result) = self
                .responses
                .get(query)
                .cloned()
                .unwrap_or((0, Ok(Vec::new())));
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            result
        }
    }

    fn results(ids: &[i64]) -> Vec<SearchResult> {
        ids.iter()
            .map(|id| SearchResult::new(*id, format!("Document {}", id)))
            .collect()
    }

    fn store_with(backend: ScriptedBackend) -> (Arc<ScriptedBackend>, SearchStore) {
        let backend = Arc::new(backend);
        let store = SearchStore::new(backend.clone());
        assert!(backend.observer.set(store.subscribe()).is_ok());
        (backend, store)
    }

    #[tokio::test(start_paused = true)]
    async fn test_successful_search_replaces_session() {
        let (backend, store) =
            store_with(ScriptedBackend::default().respond("rust", 20, Ok(results(&[1, 2]))));

        let returned = store.search("rust").await.unwrap();

        let session = store.session();
        assert_eq!(returned.len(), 2);
        assert_eq!(session.query, "rust");
        assert_eq!(session.doc_ids(), vec![1, 2]);
        assert!(!session.is_loading);
        assert!(session.error.is_none());
        assert_eq!(*backend.loading_during_call.lock().unwrap(), vec![true]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_search_records_error_and_keeps_results() {
        let (_, store) = store_with(
            ScriptedBackend::default()
                .respond("rust", 5, Ok(results(&[7])))
                .respond("broken", 5, Err(ClientError::Network("connection refused".into()))),
        );

        store.search("rust").await.unwrap();
        let err = store.search("broken").await.unwrap_err();

        let session = store.session();
        assert_eq!(err.kind(), ErrorKind::Network);
        assert_eq!(session.error.as_ref().map(|e| e.kind()), Some(ErrorKind::Network));
        assert_eq!(session.query, "rust");
        assert_eq!(session.doc_ids(), vec![7]);
        assert!(!session.is_loading);
    }

    #[tokio::test(start_paused = true)]
    async fn test_loading_flag_goes_true_then_false_once() {
        for query in ["ok", "fail"] {
            let (_, store) = store_with(
                ScriptedBackend::default()
                    .respond("ok", 30, Ok(results(&[1])))
                    .respond("fail", 30, Err(ClientError::Timeout("10s".into()))),
            );
            let mut receiver = store.subscribe();
            let watcher = tokio::spawn(async move {
                let mut seen = Vec::new();
                while receiver.changed().await.is_ok() {
                    let loading = receiver.borrow_and_update().is_loading;
                    if seen.last() != Some(&loading) {
                        seen.push(loading);
                    }
                }
                seen
            });

            let _ = store.search(query).await;
            drop(store);

            assert_eq!(watcher.await.unwrap(), vec![true, false], "query {}", query);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_later_search_wins_when_earlier_settles_last() {
        let (_, store) = store_with(
            ScriptedBackend::default()
                .respond("first", 100, Ok(results(&[1])))
                .respond("second", 10, Ok(results(&[2]))),
        );

        let (first, second) = tokio::join!(store.search("first"), async {
            tokio::time::sleep(Duration::from_millis(1)).await;
            store.search("second").await
        });

        // Each caller still gets its own outcome
        assert_eq!(first.unwrap()[0].doc_id, 1);
        assert_eq!(second.unwrap()[0].doc_id, 2);

        let session = store.session();
        assert_eq!(session.query, "second");
        assert_eq!(session.doc_ids(), vec![2]);
        assert!(!session.is_loading);
    }

    #[tokio::test(start_paused = true)]
    async fn test_loading_stays_true_until_latest_settles() {
        let (_, store) = store_with(
            ScriptedBackend::default()
                .respond("first", 10, Ok(results(&[1])))
                .respond("second", 100, Ok(results(&[2]))),
        );

        let (_, session_after_first, _) = tokio::join!(
            store.search("first"),
            async {
                tokio::time::sleep(Duration::from_millis(50)).await;
                store.session()
            },
            async {
                tokio::time::sleep(Duration::from_millis(1)).await;
                store.search("second").await
            }
        );

        assert!(session_after_first.is_loading);
        assert!(session_after_first.results.is_empty());
        assert_eq!(store.session().doc_ids(), vec![2]);
        assert!(!store.session().is_loading);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_failure_does_not_poison_session() {
        let (_, store) = store_with(
            ScriptedBackend::default()
                .respond("first", 100, Err(ClientError::Protocol("bad index".into())))
                .respond("second", 10, Ok(results(&[3]))),
        );

        let (first, _) = tokio::join!(store.search("first"), async {
            tokio::time::sleep(Duration::from_millis(1)).await;
            store.search("second").await
        });

        assert!(first.is_err());
        assert!(store.session().error.is_none());
        assert_eq!(store.session().doc_ids(), vec![3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_supersedes_in_flight_search() {
        let (_, store) =
            store_with(ScriptedBackend::default().respond("slow", 100, Ok(results(&[9]))));

        let (returned, _) = tokio::join!(store.search("slow"), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            store.clear();
        });

        assert_eq!(returned.unwrap().len(), 1);
        assert_eq!(store.session(), SearchSession::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_search_clears_loading() {
        let (_, store) =
            store_with(ScriptedBackend::default().respond("slow", 100, Ok(results(&[9]))));

        let timed_out =
            tokio::time::timeout(Duration::from_millis(10), store.search("slow")).await;

        assert!(timed_out.is_err());
        assert!(!store.session().is_loading);
        assert!(store.session().results.is_empty());
    }
}
