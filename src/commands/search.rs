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

use anyhow::{Context, Result};
use chrono::Local;
use colored::Colorize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, warn};

use super::App;
use crate::backend::history::format_history_time;
use crate::backend::SearchResult;
use crate::cli::HistoryCommand;
use crate::formatting::{format_history, format_search_results, format_snapshot};

/// Run a search through the session store and record it in the backend history
pub async fn run_search(app: &App, query: &str) -> Result<Vec<SearchResult>> {
    let results = app
        .store
        .search(query)
        .await
        .with_context(|| format!("Search for \"{}\" failed", query))?;

    if app.config.search.record_history && !query.trim().is_empty() {
        let time = format_history_time(Local::now());
        match app.backend.record_history(query, &time, results.len()).await {
            Ok(ack) => debug!(message = %ack.message(), "Search recorded in history"),
            Err(e) => warn!(error = %e, "Failed to record search history"),
        }
    }

    Ok(results)
}

pub async fn search(app: &App, query: &str, json: bool, limit: Option<usize>) -> Result<()> {
    let results = run_search(app, query).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        let limit = limit.unwrap_or(app.config.search.display_limit);
        print!("{}", format_search_results(query, &results, limit));
    }
    Ok(())
}

pub async fn content(app: &App, doc_id: i64) -> Result<()> {
    let content = app
        .backend
        .get_content(doc_id)
        .await
        .with_context(|| format!("Failed to load document {}", doc_id))?;
    println!("{}", content);
    Ok(())
}

pub async fn snapshot(app: &App, doc_id: i64, raw: bool, width: usize) -> Result<()> {
    let snapshot = app
        .backend
        .get_snapshot(doc_id)
        .await
        .with_context(|| format!("Failed to load snapshot of document {}", doc_id))?;

    if raw {
        println!("{}", snapshot.html_content);
    } else {
        println!("{}", format_snapshot(&snapshot, width.max(20)));
    }
    Ok(())
}

pub async fn history(app: &App, command: HistoryCommand) -> Result<()> {
    match command {
        HistoryCommand::List { json } => {
            let entries = app.backend.get_history().await.context("Failed to load history")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else {
                print!("{}", format_history(&entries));
            }
        }
        HistoryCommand::Record { query, num } => {
            let time = format_history_time(Local::now());
            let ack = app.backend.record_history(&query, &time, num).await?;
            println!("{}", ack.message().green());
        }
        HistoryCommand::Remove { id } => {
            let ack = app
                .backend
                .remove_history(id)
                .await
                .with_context(|| format!("Failed to remove history entry {}", id))?;
            println!("{}", ack.message().green());
        }
        HistoryCommand::Clear { yes } => {
            if !yes && !confirm("Remove ALL search history? [y/N] ").await? {
                println!("Cancelled");
                return Ok(());
            }
            let ack = app.backend.remove_all_history().await?;
            println!("{}", ack.message().green());
        }
    }
    Ok(())
}

async fn confirm(question: &str) -> Result<bool> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(question.as_bytes()).await?;
    stdout.flush().await?;

    let mut answer = String::new();
    BufReader::new(tokio::io::stdin()).read_line(&mut answer).await?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
