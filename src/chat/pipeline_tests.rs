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
    use super::super::pipeline::{ChatPipeline, ChatRequest, ChatSink, StreamEvent};
    use super::super::provider::{ChatProvider, DeltaStream};
    use crate::error::{ClientError, ClientResult, ErrorKind};
    use crate::knowledge::{DocumentSource, KnowledgeAggregator, KnowledgeSnapshot};
    use async_trait::async_trait;
    use futures::stream::{self, StreamExt};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use tokio::sync::mpsc;

    /// Provider replaying a fixed sequence of stream items
    struct ScriptedProvider {
        open_error: Option<ClientError>,
        items: Vec<ClientResult<Option<String>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedProvider {
        fn deltas(items: Vec<ClientResult<Option<&str>>>) -> Self {
            Self {
                open_error: None,
                items: items
                    .into_iter()
                    .map(|item| item.map(|d| d.map(str::to_string)))
                    .collect(),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn failing_open(error: ClientError) -> Self {
            Self {
                open_error: Some(error),
                items: Vec::new(),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChatProvider for ScriptedProvider {
        async fn open_stream(&self, prompt: &str) -> ClientResult<DeltaStream> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            if let Some(err) = &self.open_error {
                return Err(err.clone());
            }
            Ok(stream::iter(self.items.clone()).boxed())
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        events: Vec<StreamEvent>,
    }

    #[async_trait]
    impl ChatSink for RecordingSink {
        async fn on_chunk(&mut self, chunk: String) {
            self.events.push(StreamEvent::Chunk(chunk));
        }

        async fn on_complete(&mut self, full_text: String) {
            self.events.push(StreamEvent::Complete(full_text));
        }

        async fn on_error(&mut self, error: ClientError) {
            self.events.push(StreamEvent::Failed(error));
        }
    }

    impl RecordingSink {
        fn chunks(&self) -> Vec<String> {
            self.events
                .iter()
                .filter_map(|e| match e {
                    StreamEvent::Chunk(text) => Some(text.clone()),
                    _ => None,
                })
                .collect()
        }

        fn terminals(&self) -> Vec<&StreamEvent> {
            self.events.iter().filter(|e| e.is_terminal()).collect()
        }
    }

    fn request(question: &str) -> ChatRequest {
        ChatRequest::new(question, KnowledgeSnapshot::from("\n\nX is Y."))
    }

    #[tokio::test]
    async fn test_chunks_then_complete_in_order() {
        let provider = ScriptedProvider::deltas(vec![
            Ok(Some("The ")),
            Ok(Some("answer ")),
            Ok(Some("is Y.")),
        ]);
        let pipeline = ChatPipeline::new(Arc::new(provider));
        let mut sink = RecordingSink::default();

        let answer = pipeline
            .stream_chat(&request("What is X?"), &mut sink)
            .await
            .unwrap();

        assert_eq!(
            sink.events,
            vec![
                StreamEvent::Chunk("The ".to_string()),
                StreamEvent::Chunk("answer ".to_string()),
                StreamEvent::Chunk("is Y.".to_string()),
                StreamEvent::Complete("The answer is Y.".to_string()),
            ]
        );
        assert_eq!(answer, "The answer is Y.");
    }

    #[tokio::test]
    async fn test_fragments_without_text_are_skipped() {
        let provider = ScriptedProvider::deltas(vec![
            Ok(None),
            Ok(Some("a")),
            Ok(Some("")),
            Ok(None),
            Ok(Some("b")),
            Ok(None),
        ]);
        let pipeline = ChatPipeline::new(Arc::new(provider));
        let mut sink = RecordingSink::default();

        pipeline.stream_chat(&request("q"), &mut sink).await.unwrap();

        assert_eq!(sink.chunks(), vec!["a", "b"]);
        assert_eq!(sink.terminals(), vec![&StreamEvent::Complete("ab".to_string())]);
    }

    #[tokio::test]
    async fn test_concatenated_chunks_equal_completion() {
        let pieces = ["Rust ", "futures ", "are ", "lazy", ", ", "知识", "库", "."];
        let provider =
            ScriptedProvider::deltas(pieces.iter().map(|p| Ok(Some(*p))).collect());
        let pipeline = ChatPipeline::new(Arc::new(provider));
        let mut sink = RecordingSink::default();

        pipeline.stream_chat(&request("q"), &mut sink).await.unwrap();

        let concatenated: String = sink.chunks().concat();
        assert_eq!(
            sink.terminals(),
            vec![&StreamEvent::Complete(concatenated)]
        );
    }

    #[tokio::test]
    async fn test_empty_stream_completes_with_empty_text() {
        let pipeline = ChatPipeline::new(Arc::new(ScriptedProvider::deltas(vec![])));
        let mut sink = RecordingSink::default();

        let answer = pipeline.stream_chat(&request("q"), &mut sink).await.unwrap();

        assert_eq!(answer, "");
        assert_eq!(sink.events, vec![StreamEvent::Complete(String::new())]);
    }

    #[tokio::test]
    async fn test_mid_stream_failure_keeps_chunks_and_never_completes() {
        let provider = ScriptedProvider::deltas(vec![
            Ok(Some("partial ")),
            Ok(Some("answer")),
            Err(ClientError::Stream("connection reset".into())),
            Ok(Some("ignored")),
        ]);
        let pipeline = ChatPipeline::new(Arc::new(provider));
        let mut sink = RecordingSink::default();

        let err = pipeline.stream_chat(&request("q"), &mut sink).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Stream);
        assert_eq!(sink.chunks(), vec!["partial ", "answer"]);
        assert_eq!(
            sink.terminals(),
            vec![&StreamEvent::Failed(ClientError::Stream("connection reset".into()))]
        );
        assert!(!sink
            .events
            .iter()
            .any(|e| matches!(e, StreamEvent::Complete(_))));
    }

    #[tokio::test]
    async fn test_open_failure_is_single_error_event() {
        let provider = ScriptedProvider::failing_open(ClientError::Timeout("connect".into()));
        let pipeline = ChatPipeline::new(Arc::new(provider));
        let mut sink = RecordingSink::default();

        let err = pipeline.stream_chat(&request("q"), &mut sink).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Timeout);
        assert_eq!(sink.events, vec![StreamEvent::Failed(err)]);
    }

    #[tokio::test]
    async fn test_failure_does_not_poison_next_request() {
        let failing = ChatPipeline::new(Arc::new(ScriptedProvider::failing_open(
            ClientError::Network("unreachable".into()),
        )));
        let mut sink = RecordingSink::default();
        assert!(failing.stream_chat(&request("q"), &mut sink).await.is_err());

        let provider = Arc::new(ScriptedProvider::deltas(vec![Ok(Some("ok"))]));
        let pipeline = ChatPipeline::new(provider.clone());
        let mut first = RecordingSink::default();
        let mut second = RecordingSink::default();
        pipeline.stream_chat(&request("one"), &mut first).await.unwrap();
        pipeline.stream_chat(&request("two"), &mut second).await.unwrap();

        assert_eq!(second.events.last(), Some(&StreamEvent::Complete("ok".into())));
        assert_eq!(provider.prompts.lock().unwrap().len(), 2);
    }

    struct StaticSource(&'static str);

    #[async_trait]
    impl DocumentSource for StaticSource {
        async fn fetch(&self, _doc_id: i64) -> ClientResult<String> {
            Ok(self.0.to_string())
        }
    }

    #[tokio::test]
    async fn test_request_keeps_knowledge_captured_at_creation() {
        let mut aggregator = KnowledgeAggregator::new(Arc::new(StaticSource("before")), 2);
        aggregator.aggregate(vec![1]).await;
        let request = ChatRequest::new("What changed?", aggregator.snapshot());

        aggregator.aggregate(vec![1, 2]).await;
        aggregator.clear();

        let provider = Arc::new(ScriptedProvider::deltas(vec![Ok(Some("fine"))]));
        let pipeline = ChatPipeline::new(provider.clone());
        let mut sink = RecordingSink::default();
        pipeline.stream_chat(&request, &mut sink).await.unwrap();

        let prompts = provider.prompts.lock().unwrap();
        assert!(prompts[0].contains("What changed?"));
        assert!(prompts[0].contains("before"));
        assert_eq!(prompts[0].matches("before").count(), 1);
    }

    #[tokio::test]
    async fn test_spawned_stream_delivers_events_over_channel() {
        let provider = ScriptedProvider::deltas(vec![Ok(Some("one ")), Ok(None), Ok(Some("two"))]);
        let pipeline = ChatPipeline::new(Arc::new(provider));

        let mut events = pipeline.spawn_stream(request("q"), 1);
        let mut received = Vec::new();
        while let Some(event) = events.recv().await {
            received.push(event);
        }

        assert_eq!(
            received,
            vec![
                StreamEvent::Chunk("one ".to_string()),
                StreamEvent::Chunk("two".to_string()),
                StreamEvent::Complete("one two".to_string()),
            ]
        );
    }

    /// Provider counting how many fragments the pipeline pulled
    struct CountingProvider {
        fragments: usize,
        pulled: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ChatProvider for CountingProvider {
        async fn open_stream(&self, _prompt: &str) -> ClientResult<DeltaStream> {
            let pulled = Arc::clone(&self.pulled);
            let items: Vec<ClientResult<Option<String>>> = (0..self.fragments)
                .map(|i| Ok(Some(format!("part {} ", i))))
                .collect();
            Ok(stream::iter(items)
                .inspect(move |_| {
                    pulled.fetch_add(1, Ordering::SeqCst);
                })
                .boxed())
        }
    }

    #[tokio::test]
    async fn test_dropped_receiver_stops_reading_the_stream() {
        let pulled = Arc::new(AtomicUsize::new(0));
        let pipeline = ChatPipeline::new(Arc::new(CountingProvider {
            fragments: 100,
            pulled: Arc::clone(&pulled),
        }));
        let (mut tx, rx) = mpsc::channel::<StreamEvent>(4);
        drop(rx);

        let err = pipeline.stream_chat(&request("q"), &mut tx).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Stream);
        assert_eq!(pulled.load(Ordering::SeqCst), 1);
    }
}
