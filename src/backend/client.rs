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

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::config::BackendConfig;
use crate::error::{ClientError, ClientResult};

/// Deadline class of a backend call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deadline {
    /// Regular request/response calls
    Regular,
    /// Calls that run a pipeline stage before answering
    Long,
    /// Open-ended streams (connect timeout only)
    Unbounded,
}

/// HTTP client for the document search backend.
///
/// Each concern lives under its own path prefix (`/search`, `/history`,
/// `/crawler`, `/preprocess`, `/index`); the per-concern operations are
/// implemented in the sibling modules.
#[derive(Clone)]
pub struct BackendClient {
    base_url: String,
    http: reqwest::Client,
    request_timeout: Duration,
    long_timeout: Duration,
}

impl BackendClient {
    pub fn new(config: &BackendConfig) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .user_agent(concat!("tali/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ClientError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
            request_timeout: config.request_timeout(),
            long_timeout: config.long_timeout(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn apply_deadline(
        &self,
        request: reqwest::RequestBuilder,
        deadline: Deadline,
    ) -> reqwest::RequestBuilder {
        match deadline {
            Deadline::Regular => request.timeout(self.request_timeout),
            Deadline::Long => request.timeout(self.long_timeout),
            Deadline::Unbounded => request,
        }
    }

    /// GET `path` with query parameters and decode the JSON body
    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
        deadline: Deadline,
    ) -> ClientResult<T> {
        let request = self.http.get(self.url(path)).query(params);
        let response = self.apply_deadline(request, deadline).send().await?;
        decode_json(path, response).await
    }

    /// POST a JSON body to `path` and decode the JSON response
    pub(crate) async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        deadline: Deadline,
    ) -> ClientResult<T> {
        let request = self.http.post(self.url(path)).json(body);
        let response = self.apply_deadline(request, deadline).send().await?;
        decode_json(path, response).await
    }

    /// GET `path` and hand back the raw response for streaming
    pub(crate) async fn get_stream(&self, path: &str) -> ClientResult<reqwest::Response> {
        let request = self
            .http
            .get(self.url(path))
            .header(reqwest::header::ACCEPT, "text/event-stream");
        let response = self
            .apply_deadline(request, Deadline::Unbounded)
            .send()
            .await?;
        check_status(path, response).await
    }
}

async fn check_status(path: &str, response: reqwest::Response) -> ClientResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(ClientError::NotFound(format!("{} ({})", path, body.trim())));
    }
    Err(ClientError::Protocol(format!(
        "{} returned HTTP {}: {}",
        path,
        status,
        body.trim()
    )))
}

async fn decode_json<T: DeserializeOwned>(path: &str, response: reqwest::Response) -> ClientResult<T> {
    let response = check_status(path, response).await?;
    let text = response.text().await?;
    debug!(path = path, bytes = text.len(), "Backend response received");

    let value: Value = serde_json::from_str(&text)?;
    serde_json::from_value(value).map_err(|e| {
        ClientError::Protocol(format!("Unexpected response shape from {}: {}", path, e))
    })
}
