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
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn, Instrument};
use uuid::Uuid;

use crate::chat::prompt::build_prompt;
use crate::chat::provider::ChatProvider;
use crate::error::{ClientError, ClientResult};
use crate::knowledge::KnowledgeSnapshot;

/// A question bound to the knowledge available when it was asked
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub question: String,
    pub knowledge: KnowledgeSnapshot,
}

impl ChatRequest {
    pub fn new(question: impl Into<String>, knowledge: KnowledgeSnapshot) -> Self {
        Self {
            question: question.into(),
            knowledge,
        }
    }
}

/// Events of one streamed answer: any number of chunks, then exactly one
/// `Complete` or `Failed`
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Chunk(String),
    Complete(String),
    Failed(ClientError),
}

impl StreamEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, StreamEvent::Chunk(_))
    }
}

/// Receiver of a streamed answer.
///
/// Methods are async so a slow consumer holds back the stream reader.
#[async_trait]
pub trait ChatSink: Send {
    async fn on_chunk(&mut self, chunk: String);
    async fn on_complete(&mut self, full_text: String);
    async fn on_error(&mut self, error: ClientError);

    /// True once nobody is listening; the pipeline then stops reading
    fn is_closed(&self) -> bool {
        false
    }
}

#[async_trait]
impl ChatSink for mpsc::Sender<StreamEvent> {
    async fn on_chunk(&mut self, chunk: String) {
        if self.send(StreamEvent::Chunk(chunk)).await.is_err() {
            debug!("Stream receiver dropped, discarding chunk");
        }
    }

    async fn on_complete(&mut self, full_text: String) {
        if self.send(StreamEvent::Complete(full_text)).await.is_err() {
            debug!("Stream receiver dropped before completion");
        }
    }

    async fn on_error(&mut self, error: ClientError) {
        if self.send(StreamEvent::Failed(error)).await.is_err() {
            debug!("Stream receiver dropped before failure");
        }
    }

    fn is_closed(&self) -> bool {
        mpsc::Sender::is_closed(self)
    }
}

/// Formats the prompt, streams the model answer and forwards it to a sink
#[derive(Clone)]
pub struct ChatPipeline {
    provider: Arc<dyn ChatProvider>,
}

impl ChatPipeline {
    pub fn new(provider: Arc<dyn ChatProvider>) -> Self {
        Self { provider }
    }

    /// Stream one answer into `sink`.
    ///
    /// The sink sees every non-empty fragment once, in arrival order, then
    /// either `on_complete` with the concatenated text or `on_error`, never
    /// both. The same outcome is returned to the caller. If the sink reports
    /// itself closed the stream is dropped without a terminal callback.
    pub async fn stream_chat(
        &self,
        request: &ChatRequest,
        sink: &mut dyn ChatSink,
    ) -> ClientResult<String> {
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!("chat", request_id = %request_id);

        async {
            let prompt = build_prompt(&request.question, &request.knowledge);
            info!(
                knowledge_bytes = request.knowledge.len(),
                "Starting chat stream"
            );

            let mut deltas = match self.provider.open_stream(&prompt).await {
                Ok(deltas) => deltas,
                Err(e) => {
                    warn!(error = %e, "Failed to open chat stream");
                    sink.on_error(e.clone()).await;
                    return Err(e);
                }
            };

            let mut full_text = String::new();
            let mut chunks = 0usize;
            while let Some(item) = deltas.next().await {
                match item {
                    Ok(Some(text)) if !text.is_empty() => {
                        full_text.push_str(&text);
                        chunks += 1;
                        sink.on_chunk(text).await;
                        if sink.is_closed() {
                            info!(chunks = chunks, "Answer consumer gone, abandoning chat stream");
                            return Err(ClientError::Stream(
                                "Answer consumer went away".to_string(),
                            ));
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!(error = %e, chunks = chunks, "Chat stream failed");
                        sink.on_error(e.clone()).await;
                        return Err(e);
                    }
                }
            }

            info!(chunks = chunks, chars = full_text.len(), "Chat stream completed");
            sink.on_complete(full_text.clone()).await;
            Ok(full_text)
        }
        .instrument(span)
        .await
    }

    /// Run a request on its own task and receive its events over a bounded
    /// channel. The channel closes after the terminal event.
    pub fn spawn_stream(&self, request: ChatRequest, capacity: usize) -> mpsc::Receiver<StreamEvent> {
        let (mut tx, rx) = mpsc::channel(capacity.max(1));
        let pipeline = self.clone();
        tokio::spawn(async move {
            let _ = pipeline.stream_chat(&request, &mut tx).await;
        });
        rx
    }
}
