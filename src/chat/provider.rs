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
use futures::stream::{BoxStream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::config::ChatConfig;
use crate::error::{ClientError, ClientResult};
use crate::sse;

/// Stream of text deltas; `None` marks a fragment without text content
pub type DeltaStream = BoxStream<'static, ClientResult<Option<String>>>;

/// Language model backend able to stream a completion for one prompt
#[async_trait]
pub trait ChatProvider: Send + Sync {
    async fn open_stream(&self, prompt: &str) -> ClientResult<DeltaStream>;
}

const DONE_MARKER: &str = "[DONE]";

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

/// Message of an error frame sent in place of a chunk, either
/// `{"object": "error", "message": ...}` or `{"error": {"message": ...}}`
fn error_frame_message(frame: &Value) -> Option<String> {
    let object = frame.as_object()?;
    let details = if object.get("object").and_then(Value::as_str) == Some("error") {
        frame
    } else {
        object.get("error").filter(|e| !e.is_null())?
    };

    let message = details
        .get("message")
        .and_then(Value::as_str)
        .or_else(|| details.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| details.to_string());
    Some(message)
}

/// Decode one `data:` payload into its text delta
fn parse_delta(data: &str) -> ClientResult<Option<String>> {
    let frame: Value = serde_json::from_str(data)
        .map_err(|e| ClientError::Protocol(format!("Malformed stream chunk: {}", e)))?;
    if let Some(message) = error_frame_message(&frame) {
        return Err(ClientError::Stream(format!("Chat API error: {}", message)));
    }

    let chunk: ChatCompletionChunk = serde_json::from_value(frame)
        .map_err(|e| ClientError::Protocol(format!("Malformed stream chunk: {}", e)))?;
    Ok(chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content))
}

/// Mistral chat completions API (OpenAI-compatible streaming format)
pub struct MistralProvider {
    api_base: String,
    api_key: String,
    model: String,
    http: reqwest::Client,
}

impl MistralProvider {
    pub fn new(config: &ChatConfig, api_key: String) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .read_timeout(Duration::from_secs(config.read_timeout_secs))
            .user_agent(concat!("tali/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ClientError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            http,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl ChatProvider for MistralProvider {
    async fn open_stream(&self, prompt: &str) -> ClientResult<DeltaStream> {
        let url = format!("{}/chat/completions", self.api_base);
        let request = ChatCompletionRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            stream: true,
        };

        debug!(model = %self.model, prompt_chars = prompt.len(), "Opening chat stream");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Stream(format!(
                "Chat API returned HTTP {}: {}",
                status,
                body.trim()
            )));
        }

        let deltas = sse::data_events(response.bytes_stream())
            .take_while(|item| {
                let done = matches!(item, Ok(data) if data.trim() == DONE_MARKER);
                futures::future::ready(!done)
            })
            .map(|item| item.and_then(|data| parse_delta(&data)));

        Ok(deltas.boxed())
    }
}
