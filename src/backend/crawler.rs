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

use futures::stream::{BoxStream, StreamExt};
use serde_json::Value;
use tracing::warn;

use crate::backend::client::{BackendClient, Deadline};
use crate::backend::types::{reject_error_object, Ack, ProgressEvent};
use crate::error::{ClientError, ClientResult};
use crate::sse;

impl BackendClient {
    /// Start crawling; the backend answers once the crawl has been launched
    pub async fn start_crawler(&self) -> ClientResult<Ack> {
        self.crawler_command("/crawler/start_crawler").await
    }

    pub async fn stop_crawler(&self) -> ClientResult<Ack> {
        self.crawler_command("/crawler/stop_crawler").await
    }

    pub async fn continue_crawler(&self) -> ClientResult<Ack> {
        self.crawler_command("/crawler/continue_crawler").await
    }

    async fn crawler_command(&self, path: &str) -> ClientResult<Ack> {
        let ack: Ack = self.get_json(path, &[], Deadline::Long).await?;
        ack.into_result()
    }

    pub async fn get_crawler_config(&self) -> ClientResult<Value> {
        let body: Value = self
            .get_json("/crawler/get_crawler_config", &[], Deadline::Regular)
            .await?;
        reject_error_object(body)
    }

    pub async fn save_crawler_config(&self, config: &Value) -> ClientResult<Ack> {
        if !config.is_object() {
            return Err(ClientError::Protocol(
                "Crawler configuration must be a JSON object".to_string(),
            ));
        }
        let ack: Ack = self
            .post_json("/crawler/save_crawler_config", config, Deadline::Regular)
            .await?;
        ack.into_result()
    }

    /// Follow crawler progress until the crawl completes.
    ///
    /// Events that are not valid JSON are skipped; the stream ends after the
    /// `crawl_completed` event or when the backend closes the connection.
    pub async fn crawler_progress(
        &self,
    ) -> ClientResult<BoxStream<'static, ClientResult<ProgressEvent>>> {
        let response = self.get_stream("/crawler/get_progress").await?;

        let events = sse::data_events(response.bytes_stream())
            .filter_map(|item| async move {
                match item {
                    Ok(data) => match serde_json::from_str::<ProgressEvent>(&data) {
                        Ok(event) => Some(Ok(event)),
                        Err(e) => {
                            warn!(error = %e, "Skipping malformed progress event");
                            None
                        }
                    },
                    Err(e) => Some(Err(e)),
                }
            })
            .scan(false, |done, item| {
                if *done {
                    return futures::future::ready(None);
                }
                if let Ok(event) = &item {
                    *done = event.is_terminal();
                }
                futures::future::ready(Some(item))
            });

        Ok(events.boxed())
    }
}
