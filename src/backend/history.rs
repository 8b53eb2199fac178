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

use chrono::{DateTime, Local};

use crate::backend::client::{BackendClient, Deadline};
use crate::backend::types::{Ack, HistoryEntry};
use crate::error::ClientResult;

/// Timestamp format stored with history entries
pub const HISTORY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn format_history_time(time: DateTime<Local>) -> String {
    time.format(HISTORY_TIME_FORMAT).to_string()
}

impl BackendClient {
    pub async fn record_history(&self, search_query: &str, time: &str, num: usize) -> ClientResult<Ack> {
        let ack: Ack = self
            .get_json(
                "/history/record_history",
                &[
                    ("search_query", search_query.to_string()),
                    ("time", time.to_string()),
                    ("num", num.to_string()),
                ],
                Deadline::Regular,
            )
            .await?;
        ack.into_result()
    }

    pub async fn get_history(&self) -> ClientResult<Vec<HistoryEntry>> {
        self.get_json("/history/get_history", &[], Deadline::Regular)
            .await
    }

    pub async fn remove_history(&self, id: i64) -> ClientResult<Ack> {
        let ack: Ack = self
            .get_json(
                "/history/remove_history",
                &[("id", id.to_string())],
                Deadline::Regular,
            )
            .await?;
        ack.into_result()
    }

    pub async fn remove_all_history(&self) -> ClientResult<Ack> {
        let ack: Ack = self
            .get_json("/history/remove_all_history", &[], Deadline::Regular)
            .await?;
        ack.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackendConfig;
    use chrono::TimeZone;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> BackendClient {
        let config = BackendConfig {
            base_url: server.uri(),
            ..BackendConfig::default()
        };
        BackendClient::new(&config).unwrap()
    }

    #[test]
    fn test_history_time_format() {
        let time = Local.with_ymd_and_hms(2025, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(format_history_time(time), "2025-03-09 14:05:07");
    }

    #[tokio::test]
    async fn test_record_history_sends_params() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/history/record_history"))
            .and(query_param("search_query", "tokio"))
            .and(query_param("time", "2025-03-09 14:05:07"))
            .and(query_param("num", "12"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(["执行成功，受影响行数为:1"])))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let ack = client
            .record_history("tokio", "2025-03-09 14:05:07", 12)
            .await
            .unwrap();
        assert!(ack.message().contains("1"));
    }

    #[tokio::test]
    async fn test_get_history_entries() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/history/get_history"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 1, "search_query": "rust", "time": "2025-03-09 14:05:07", "num": 3},
                {"id": 2, "search_query": "tokio", "time": "2025-03-10 09:00:00", "num": 0}
            ])))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let entries = client.get_history().await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].search_query, "tokio");
    }

    #[tokio::test]
    async fn test_remove_history_by_id() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/history/remove_history"))
            .and(query_param("id", "7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(["执行成功，受影响行数为:1"])))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        client.remove_history(7).await.unwrap();
    }
}
