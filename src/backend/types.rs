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

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::error::ClientError;

/// Notices the search endpoint returns instead of a result list when
/// nothing matched or the query was blank.
const EMPTY_RESULT_NOTICES: &[&str] = &["未找到匹配的文档。", "请输入查询词"];

/// One ranked document from the search endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub doc_id: i64,
    #[serde(default, deserialize_with = "string_or_null")]
    pub title: String,
    #[serde(default, deserialize_with = "string_or_null")]
    pub content: String,
    #[serde(default, deserialize_with = "string_or_null")]
    pub source: String,
    #[serde(default, deserialize_with = "string_or_null")]
    pub publish_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    /// Any other fields the backend attaches (matched terms, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SearchResult {
    pub fn new(doc_id: i64, title: impl Into<String>) -> Self {
        Self {
            doc_id,
            title: title.into(),
            content: String::new(),
            source: String::new(),
            publish_time: String::new(),
            score: None,
            extra: Map::new(),
        }
    }

    pub fn matched_terms(&self) -> Vec<String> {
        self.extra
            .get("matched_terms")
            .and_then(|v| v.as_array())
            .map(|terms| {
                terms
                    .iter()
                    .filter_map(|t| t.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn string_or_null<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s,
        Some(other) => other.to_string(),
    })
}

/// Interpret a search response body.
///
/// The backend answers with a result list, or with a list of notice strings
/// when it has nothing to return.
pub fn parse_search_response(body: Value) -> Result<Vec<SearchResult>, ClientError> {
    let items = match body {
        Value::Array(items) => items,
        other => {
            return Err(ClientError::Protocol(format!(
                "Expected a result list, got: {}",
                other
            )))
        }
    };

    if items.iter().all(Value::is_object) {
        return items
            .into_iter()
            .map(|item| serde_json::from_value(item).map_err(ClientError::from))
            .collect();
    }

    let notices: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
    if !notices.is_empty() && notices.iter().all(|n| EMPTY_RESULT_NOTICES.contains(n)) {
        return Ok(Vec::new());
    }

    Err(ClientError::Protocol(format!(
        "Search backend returned: {}",
        notices.join("; ")
    )))
}

/// Interpret a document content response body
pub fn parse_content_response(doc_id: i64, body: Value) -> Result<String, ClientError> {
    match body {
        Value::Object(mut map) => match map.remove("content") {
            Some(Value::String(content)) => Ok(content),
            Some(Value::Null) | None => Err(ClientError::NotFound(format!(
                "document {} has no content",
                doc_id
            ))),
            Some(other) => Err(ClientError::Protocol(format!(
                "Unexpected content for document {}: {}",
                doc_id, other
            ))),
        },
        Value::Array(_) | Value::String(_) | Value::Null => Err(ClientError::NotFound(format!(
            "document {}",
            doc_id
        ))),
        other => Err(ClientError::Protocol(format!(
            "Unexpected content response for document {}: {}",
            doc_id, other
        ))),
    }
}

/// Raw page captured by the crawler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub url: String,
    pub html_content: String,
}

pub fn parse_snapshot_response(doc_id: i64, body: Value) -> Result<Snapshot, ClientError> {
    match body.as_object().map(|map| map.contains_key("html_content")) {
        Some(true) => Ok(serde_json::from_value(body)?),
        Some(false) => Err(ClientError::Protocol(format!(
            "Unexpected snapshot response for document {}",
            doc_id
        ))),
        None => Err(ClientError::NotFound(format!(
            "snapshot of document {}",
            doc_id
        ))),
    }
}

/// One recorded search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: i64,
    pub search_query: String,
    pub time: String,
    pub num: i64,
}

/// Acknowledgement bodies: a list of messages or a `{success|error|info: ..}` map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Ack {
    Messages(Vec<String>),
    Status(BTreeMap<String, Value>),
}

impl Ack {
    /// Turn an `{"error": ...}` status into an error; pass everything else through
    pub fn into_result(self) -> Result<Ack, ClientError> {
        if let Ack::Status(ref map) = self {
            if let Some(err) = map.get("error") {
                let message = err.as_str().map(str::to_string).unwrap_or_else(|| err.to_string());
                return Err(ClientError::Protocol(message));
            }
        }
        Ok(self)
    }

    pub fn message(&self) -> String {
        match self {
            Ack::Messages(messages) => messages.join("; "),
            Ack::Status(map) => map
                .iter()
                .map(|(k, v)| match v.as_str() {
                    Some(s) => format!("{}: {}", k, s),
                    None => format!("{}: {}", k, v),
                })
                .collect::<Vec<_>>()
                .join("; "),
        }
    }
}

/// Reject JSON objects that only carry an `error` key
pub fn reject_error_object(body: Value) -> Result<Value, ClientError> {
    if let Value::Object(ref map) = body {
        if map.len() == 1 {
            if let Some(err) = map.get("error") {
                let message = err.as_str().map(str::to_string).unwrap_or_else(|| err.to_string());
                return Err(ClientError::Protocol(message));
            }
        }
    }
    Ok(body)
}

/// Backend report about an artifact file of the processing pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileCheck {
    pub file_name: String,
    pub path: String,
    pub exists: bool,
    #[serde(default)]
    pub last_modified: Option<String>,
    #[serde(default)]
    pub size_bytes: Option<u64>,
    #[serde(default)]
    pub is_dir: bool,
}

/// One crawler progress event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProgressEvent {
    pub fn is_heartbeat(&self) -> bool {
        self.kind == "heartbeat"
    }

    pub fn is_terminal(&self) -> bool {
        self.kind == "crawl_completed"
    }
}
