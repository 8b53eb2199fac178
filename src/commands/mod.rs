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

mod admin;
mod chat;
mod search;

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::debug;

use crate::backend::BackendClient;
use crate::cli::Commands;
use crate::config::Config;
use crate::search::SearchStore;

/// Collaborators shared by every command
pub struct App {
    pub config: Config,
    pub backend: BackendClient,
    pub store: SearchStore,
}

impl App {
    pub fn new(config: &Config) -> Result<Self> {
        let backend = BackendClient::new(&config.backend).context("Failed to create backend client")?;
        debug!(backend = %backend.base_url(), "Backend client ready");
        let store = SearchStore::new(Arc::new(backend.clone()));
        Ok(Self {
            config: config.clone(),
            backend,
            store,
        })
    }
}

pub async fn execute(config: &Config, command: Commands) -> Result<()> {
    let app = App::new(config)?;

    match command {
        Commands::Search { query, json, limit } => search::search(&app, &query, json, limit).await,
        Commands::Content { doc_id } => search::content(&app, doc_id).await,
        Commands::Snapshot { doc_id, raw, width } => {
            search::snapshot(&app, doc_id, raw, width).await
        }
        Commands::Ask {
            question,
            query,
            limit,
        } => chat::ask(&app, &question, query.as_deref(), limit).await,
        Commands::Chat { query } => chat::interactive(&app, query.as_deref()).await,
        Commands::History { command } => search::history(&app, command).await,
        Commands::Crawler { command } => admin::crawler(&app, command).await,
        Commands::Preprocess { command } => admin::preprocess(&app, command).await,
        Commands::Index { command } => admin::index(&app, command).await,
    }
}
