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

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use colored::Colorize;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Stderr, Stdout};
use tracing::{debug, warn};

use super::search::run_search;
use super::App;
use crate::chat::{ChatPipeline, ChatRequest, ChatSink, MistralProvider, StreamEvent};
use crate::error::ClientError;
use crate::formatting::format_aggregation;
use crate::knowledge::KnowledgeAggregator;

fn create_pipeline(app: &App) -> Result<ChatPipeline> {
    let api_key = app.config.chat.api_key()?;
    let provider =
        MistralProvider::new(&app.config.chat, api_key).context("Failed to create chat provider")?;
    debug!(model = %provider.model(), "Chat provider ready");
    Ok(ChatPipeline::new(Arc::new(provider)))
}

fn create_aggregator(app: &App) -> KnowledgeAggregator {
    KnowledgeAggregator::new(
        Arc::new(app.backend.clone()),
        app.config.knowledge.max_concurrent_fetches,
    )
}

/// Search, then rebuild the knowledge base from the session's top documents.
/// A failed search leaves the previous knowledge in place.
async fn load_knowledge(
    app: &App,
    aggregator: &mut KnowledgeAggregator,
    query: &str,
    limit: usize,
) -> Result<()> {
    let results = run_search(app, query).await?;
    if results.is_empty() {
        eprintln!("{}", format!("No documents match \"{}\"", query).yellow());
    }

    let report = aggregator
        .aggregate_session(&app.store.session(), limit)
        .await;
    eprintln!("{}", format_aggregation(&report));
    Ok(())
}

/// Single question: answer streamed from a spawned task over a channel
pub async fn ask(app: &App, question: &str, query: Option<&str>, limit: Option<usize>) -> Result<()> {
    let pipeline = create_pipeline(app)?;
    let mut aggregator = create_aggregator(app);
    let limit = limit.unwrap_or(app.config.knowledge.max_documents);

    load_knowledge(app, &mut aggregator, query.unwrap_or(question), limit).await?;

    let request = ChatRequest::new(question, aggregator.snapshot());
    let mut events = pipeline.spawn_stream(request, app.config.chat.channel_capacity);

    let mut stdout = tokio::io::stdout();
    let mut printed = false;
    while let Some(event) = events.recv().await {
        match event {
            StreamEvent::Chunk(text) => {
                stdout.write_all(text.as_bytes()).await?;
                stdout.flush().await?;
                printed = true;
            }
            StreamEvent::Complete(_) => {
                stdout.write_all(b"\n").await?;
                stdout.flush().await?;
                return Ok(());
            }
            StreamEvent::Failed(e) => {
                if printed {
                    stdout.write_all(b"\n").await?;
                    stdout.flush().await?;
                }
                eprintln!("{}", "[answer interrupted]".red());
                return Err(anyhow!(e)).context("Chat request failed");
            }
        }
    }

    Err(anyhow!("Chat stream ended without a result"))
}

/// Prints chunks as they arrive; an interrupted answer gets an error marker
struct TerminalSink<O, E> {
    out: O,
    err: E,
    partial: bool,
}

impl TerminalSink<Stdout, Stderr> {
    fn stdio() -> Self {
        Self::new(tokio::io::stdout(), tokio::io::stderr())
    }
}

impl<O, E> TerminalSink<O, E>
where
    O: AsyncWrite + Unpin + Send,
    E: AsyncWrite + Unpin + Send,
{
    fn new(out: O, err: E) -> Self {
        Self {
            out,
            err,
            partial: false,
        }
    }

    async fn write(&mut self, text: &str) {
        if let Err(e) = write_flush(&mut self.out, text).await {
            debug!(error = %e, "Failed to write to stdout");
        }
    }
}

async fn write_flush<W: AsyncWrite + Unpin>(writer: &mut W, text: &str) -> std::io::Result<()> {
    writer.write_all(text.as_bytes()).await?;
    writer.flush().await
}

#[async_trait]
impl<O, E> ChatSink for TerminalSink<O, E>
where
    O: AsyncWrite + Unpin + Send,
    E: AsyncWrite + Unpin + Send,
{
    async fn on_chunk(&mut self, chunk: String) {
        self.partial = true;
        self.write(&chunk).await;
    }

    async fn on_complete(&mut self, _full_text: String) {
        self.partial = false;
        self.write("\n").await;
    }

    async fn on_error(&mut self, error: ClientError) {
        if self.partial {
            self.write("\n").await;
        }
        self.partial = false;
        let marker = format!("{} {}\n", "[answer interrupted]".red(), error);
        if let Err(e) = write_flush(&mut self.err, &marker).await {
            debug!(error = %e, "Failed to write to stderr");
        }
    }
}

const CHAT_HELP: &str = "Commands: /search <query> reloads the knowledge base, /clear empties it, /quit exits";

/// One line typed into the interactive session
#[derive(Debug, PartialEq, Eq)]
enum ChatInput<'a> {
    Blank,
    Quit,
    Help,
    Clear,
    /// `/search <query>`; empty when the query is missing
    Search(&'a str),
    Question(&'a str),
}

fn parse_input(line: &str) -> ChatInput<'_> {
    let line = line.trim();
    match line {
        "" => ChatInput::Blank,
        "/quit" | "/exit" => ChatInput::Quit,
        "/help" => ChatInput::Help,
        "/clear" => ChatInput::Clear,
        "/search" => ChatInput::Search(""),
        _ => match line.split_once(char::is_whitespace) {
            Some(("/search", query)) => ChatInput::Search(query.trim()),
            _ => ChatInput::Question(line),
        },
    }
}

/// Interactive session reading questions from stdin
pub async fn interactive(app: &App, query: Option<&str>) -> Result<()> {
    let pipeline = create_pipeline(app)?;
    let mut aggregator = create_aggregator(app);
    let limit = app.config.knowledge.max_documents;

    if let Some(query) = query {
        if let Err(e) = load_knowledge(app, &mut aggregator, query, limit).await {
            eprintln!("{} {:#}", "Search failed:".red(), e);
        }
    }

    eprintln!("{}", CHAT_HELP.bright_black());

    let mut sink = TerminalSink::stdio();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        sink.write("> ").await;
        let Some(line) = lines.next_line().await? else {
            break;
        };

        match parse_input(&line) {
            ChatInput::Blank => {}
            ChatInput::Quit => break,
            ChatInput::Help => eprintln!("{}", CHAT_HELP),
            ChatInput::Clear => {
                app.store.clear();
                aggregator.clear();
                eprintln!("{}", "Knowledge base cleared".bright_black());
            }
            ChatInput::Search("") => eprintln!("Usage: /search <query>"),
            ChatInput::Search(query) => {
                if let Err(e) = load_knowledge(app, &mut aggregator, query, limit).await {
                    eprintln!("{} {:#}", "Search failed:".red(), e);
                }
            }
            ChatInput::Question(question) => {
                if aggregator.is_empty() {
                    eprintln!(
                        "{}",
                        "No knowledge loaded, answering without documents".bright_black()
                    );
                }
                let request = ChatRequest::new(question, aggregator.snapshot());
                if let Err(e) = pipeline.stream_chat(&request, &mut sink).await {
                    warn!(error = %e, kind = %e.kind(), "Chat request failed");
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::provider::{ChatProvider, DeltaStream};
    use crate::error::ClientResult;
    use crate::knowledge::KnowledgeSnapshot;
    use futures::stream::{self, StreamExt};

    struct FixedProvider(Vec<ClientResult<Option<String>>>);

    #[async_trait]
    impl ChatProvider for FixedProvider {
        async fn open_stream(&self, _prompt: &str) -> ClientResult<DeltaStream> {
            Ok(stream::iter(self.0.clone()).boxed())
        }
    }

    async fn render(items: Vec<ClientResult<Option<String>>>) -> (String, String) {
        colored::control::set_override(false);
        let pipeline = ChatPipeline::new(Arc::new(FixedProvider(items)));
        let mut sink = TerminalSink::new(Vec::new(), Vec::new());
        let request = ChatRequest::new("q", KnowledgeSnapshot::default());

        let _ = pipeline.stream_chat(&request, &mut sink).await;

        (
            String::from_utf8(sink.out).unwrap(),
            String::from_utf8(sink.err).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_interrupted_answer_keeps_text_then_marker() {
        let (out, err) = render(vec![
            Ok(Some("par".to_string())),
            Ok(Some("tial".to_string())),
            Err(ClientError::Stream("connection reset".to_string())),
        ])
        .await;

        assert_eq!(out, "partial\n");
        assert_eq!(err, "[answer interrupted] Stream error: connection reset\n");
    }

    #[tokio::test]
    async fn test_failure_before_any_text_prints_only_marker() {
        let (out, err) = render(vec![Err(ClientError::Timeout("read".to_string()))]).await;

        assert_eq!(out, "");
        assert!(err.starts_with("[answer interrupted] Request timed out"));
    }

    #[tokio::test]
    async fn test_completed_answer_ends_with_newline() {
        let (out, err) = render(vec![Ok(Some("done".to_string()))]).await;

        assert_eq!(out, "done\n");
        assert!(err.is_empty());
    }

    #[test]
    fn test_search_command_needs_exact_word() {
        assert_eq!(parse_input("/search tokio runtime"), ChatInput::Search("tokio runtime"));
        assert_eq!(parse_input("  /search\tserde "), ChatInput::Search("serde"));
        assert_eq!(parse_input("/search"), ChatInput::Search(""));
        assert_eq!(parse_input("/searchlight"), ChatInput::Question("/searchlight"));
        assert_eq!(
            parse_input("/searchlight on"),
            ChatInput::Question("/searchlight on")
        );
    }

    #[test]
    fn test_session_commands() {
        assert_eq!(parse_input("   "), ChatInput::Blank);
        assert_eq!(parse_input("/quit"), ChatInput::Quit);
        assert_eq!(parse_input("/exit"), ChatInput::Quit);
        assert_eq!(parse_input("/clear"), ChatInput::Clear);
        assert_eq!(parse_input("/help"), ChatInput::Help);
        assert_eq!(parse_input(" What is X? "), ChatInput::Question("What is X?"));
    }
}
