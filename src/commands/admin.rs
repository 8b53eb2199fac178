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
use colored::Colorize;
use futures::StreamExt;
use serde_json::Value;

use super::App;
use crate::backend::ProgressEvent;
use crate::cli::{CrawlerCommand, IndexCommand, PreprocessCommand};
use crate::formatting::{format_file_check, format_file_checks};

pub async fn crawler(app: &App, command: CrawlerCommand) -> Result<()> {
    let backend = &app.backend;
    match command {
        CrawlerCommand::Start => {
            let ack = backend.start_crawler().await.context("Failed to start crawler")?;
            println!("{}", ack.message().green());
        }
        CrawlerCommand::Stop => {
            let ack = backend.stop_crawler().await.context("Failed to stop crawler")?;
            println!("{}", ack.message().green());
        }
        CrawlerCommand::Continue => {
            let ack = backend
                .continue_crawler()
                .await
                .context("Failed to resume crawler")?;
            println!("{}", ack.message().green());
        }
        CrawlerCommand::Config => {
            let config = backend.get_crawler_config().await?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        CrawlerCommand::SaveConfig { file } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let config: Value = serde_json::from_str(&raw)
                .with_context(|| format!("{} is not valid JSON", file.display()))?;
            let ack = backend.save_crawler_config(&config).await?;
            println!("{}", ack.message().green());
        }
        CrawlerCommand::Progress => {
            let mut events = backend
                .crawler_progress()
                .await
                .context("Failed to open progress stream")?;
            while let Some(event) = events.next().await {
                let event = event.context("Progress stream interrupted")?;
                if event.is_heartbeat() {
                    continue;
                }
                println!("{}", format_progress(&event));
            }
        }
    }
    Ok(())
}

fn format_progress(event: &ProgressEvent) -> String {
    let label = format!("[{}]", event.kind);
    let label = if event.is_terminal() {
        label.green().bold()
    } else {
        label.cyan()
    };

    match &event.message {
        Some(message) => format!("{} {}", label, message),
        None if event.extra.is_empty() => label.to_string(),
        None => format!("{} {}", label, Value::Object(event.extra.clone())),
    }
}

pub async fn preprocess(app: &App, command: PreprocessCommand) -> Result<()> {
    match command {
        PreprocessCommand::Check => {
            let check = app.backend.check_preprocess_file().await?;
            println!("{}", format_file_check(&check));
        }
        PreprocessCommand::Config => {
            let config = app.backend.get_preprocess_config().await?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        PreprocessCommand::Start { min_df, max_df } => {
            anyhow::ensure!(
                (0.0..=1.0).contains(&max_df),
                "max_df must be between 0.0 and 1.0"
            );
            eprintln!("{}", "Preprocessing, this can take a while...".bright_black());
            let report = app
                .backend
                .start_preprocess(min_df, max_df)
                .await
                .context("Preprocessing failed")?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}

pub async fn index(app: &App, command: IndexCommand) -> Result<()> {
    match command {
        IndexCommand::Check => {
            let checks = app.backend.check_index_file().await?;
            println!("{}", format_file_checks(&checks));
        }
        IndexCommand::Start {
            optimize,
            min_tfidf,
        } => {
            eprintln!("{}", "Building index, this can take a while...".bright_black());
            let report = app
                .backend
                .start_inverted_index(optimize, min_tfidf)
                .await
                .context("Index build failed")?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}
