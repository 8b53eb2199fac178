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

//! Server-sent events decoding shared by the chat stream and the crawler
//! progress feed. Only `data:` fields are surfaced.

use std::collections::VecDeque;

use futures::stream::{self, BoxStream, Stream, StreamExt};

use crate::error::ClientError;

/// Incremental decoder turning raw body bytes into event payloads.
///
/// Bytes are buffered until a full line is available, so multi-byte
/// characters split across network chunks decode correctly.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    data_lines: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed bytes; returns every event payload completed by them
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            let line = line.trim_end_matches(['\n', '\r']);
            if let Some(event) = self.process_line(line) {
                events.push(event);
            }
        }
        events
    }

    /// Flush a trailing event that was not terminated by a blank line
    pub fn finish(&mut self) -> Option<String> {
        if !self.buffer.is_empty() {
            let line = String::from_utf8_lossy(&self.buffer).into_owned();
            self.buffer.clear();
            if let Some(event) = self.process_line(line.trim_end_matches('\r')) {
                return Some(event);
            }
        }
        self.dispatch()
    }

    fn process_line(&mut self, line: &str) -> Option<String> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            // Comment / keep-alive
            return None;
        }
        if let Some(data) = line.strip_prefix("data:") {
            let data = data.strip_prefix(' ').unwrap_or(data);
            self.data_lines.push(data.to_string());
        }
        None
    }

    fn dispatch(&mut self) -> Option<String> {
        if self.data_lines.is_empty() {
            return None;
        }
        let event = self.data_lines.join("\n");
        self.data_lines.clear();
        Some(event)
    }
}

struct DecodeState<S> {
    body: std::pin::Pin<Box<S>>,
    decoder: SseDecoder,
    pending: VecDeque<String>,
    finished: bool,
}

/// Adapt a byte stream into a stream of event payloads.
///
/// A transport error is yielded once as [`ClientError::Stream`] (timeouts
/// keep their kind) and ends the stream.
pub fn data_events<S, B, E>(body: S) -> BoxStream<'static, Result<String, ClientError>>
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Into<ClientError> + Send + 'static,
{
    let state = DecodeState {
        body: Box::pin(body),
        decoder: SseDecoder::new(),
        pending: VecDeque::new(),
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(event) = state.pending.pop_front() {
                return Some((Ok(event), state));
            }
            if state.finished {
                return None;
            }

            match state.body.as_mut().next().await {
                Some(Ok(bytes)) => {
                    let events = state.decoder.push(bytes.as_ref());
                    state.pending.extend(events);
                }
                Some(Err(err)) => {
                    state.finished = true;
                    state.pending.clear();
                    let err: ClientError = err.into();
                    return Some((Err(err.into_stream_error()), state));
                }
                None => {
                    state.finished = true;
                    if let Some(event) = state.decoder.finish() {
                        state.pending.push_back(event);
                    }
                }
            }
        }
    })
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decodes_events_split_across_chunks() {
        let mut decoder = SseDecoder::new();

        assert!(decoder.push(b"data: {\"a\"").is_empty());
        assert!(decoder.push(b":1}\n").is_empty());
        let events = decoder.push(b"\ndata: second\n\n");

        assert_eq!(events, vec!["{\"a\":1}".to_string(), "second".to_string()]);
    }

    #[test]
    fn test_ignores_comments_and_other_fields() {
        let mut decoder = SseDecoder::new();
        let events = decoder.push(b": keep-alive\nevent: message\nid: 7\ndata: payload\r\n\r\n");

        assert_eq!(events, vec!["payload".to_string()]);
    }

    #[test]
    fn test_joins_multiline_data() {
        let mut decoder = SseDecoder::new();
        let events = decoder.push(b"data: line one\ndata: line two\n\n");

        assert_eq!(events, vec!["line one\nline two".to_string()]);
    }

    #[test]
    fn test_multibyte_character_split_between_chunks() {
        let text = "data: 知识库\n\n".as_bytes();
        let (head, tail) = text.split_at(8);
        let mut decoder = SseDecoder::new();

        assert!(decoder.push(head).is_empty());
        assert_eq!(decoder.push(tail), vec!["知识库".to_string()]);
    }

    #[test]
    fn test_finish_flushes_unterminated_event() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: [DONE]").is_empty());
        assert_eq!(decoder.finish(), Some("[DONE]".to_string()));
        assert_eq!(decoder.finish(), None);
    }

    #[tokio::test]
    async fn test_stream_adapter_stops_after_transport_error() {
        let chunks: Vec<Result<Vec<u8>, ClientError>> = vec![
            Ok(b"data: one\n\n".to_vec()),
            Err(ClientError::Network("connection reset".into())),
            Ok(b"data: never\n\n".to_vec()),
        ];

        let events: Vec<_> = data_events(stream::iter(chunks)).collect().await;

        assert_eq!(events.len(), 2);
        assert_eq!(events[0], Ok("one".to_string()));
        assert_eq!(
            events[1],
            Err(ClientError::Stream("connection reset".to_string()))
        );
    }
}
