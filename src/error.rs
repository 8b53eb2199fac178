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

use thiserror::Error;

/// Failures of backend and language model calls.
///
/// Cloneable so session state can keep the last error for display.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientError {
    /// Transport failure or unreachable backend
    #[error("Network error: {0}")]
    Network(String),

    /// Client-side deadline exceeded
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Backend reports the resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed or unexpected response
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Failure on an open streaming connection
    #[error("Stream error: {0}")]
    Stream(String),
}

/// Discriminant of [`ClientError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Network,
    Timeout,
    NotFound,
    Protocol,
    Stream,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Network => write!(f, "network"),
            ErrorKind::Timeout => write!(f, "timeout"),
            ErrorKind::NotFound => write!(f, "not_found"),
            ErrorKind::Protocol => write!(f, "protocol"),
            ErrorKind::Stream => write!(f, "stream"),
        }
    }
}

impl ClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Network(_) => ErrorKind::Network,
            ClientError::Timeout(_) => ErrorKind::Timeout,
            ClientError::NotFound(_) => ErrorKind::NotFound,
            ClientError::Protocol(_) => ErrorKind::Protocol,
            ClientError::Stream(_) => ErrorKind::Stream,
        }
    }

    /// Re-tag a transport failure that happened after a stream was opened.
    /// Timeouts keep their kind.
    pub fn into_stream_error(self) -> Self {
        match self {
            ClientError::Network(msg) | ClientError::Protocol(msg) => ClientError::Stream(msg),
            other => other,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout(err.to_string())
        } else if err.is_decode() || err.is_body() {
            ClientError::Protocol(err.to_string())
        } else if err.status().map(|s| s.as_u16()) == Some(404) {
            ClientError::NotFound(err.to_string())
        } else {
            ClientError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Protocol(format!("Invalid JSON: {}", err))
    }
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;
