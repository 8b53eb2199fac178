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

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "tali")]
#[command(version, author = "Muvon Un Limited <opensource@muvon.io>")]
#[command(about = "Document search client with knowledge-grounded chat", long_about = None)]
pub struct Cli {
    /// Verbose logging to stderr
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search the document index
    Search {
        /// Query text
        query: String,

        /// Print the raw result list as JSON
        #[arg(long)]
        json: bool,

        /// Maximum number of results to print (defaults to search.display_limit)
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Print the full text of a document
    Content {
        /// Document ID (from search results)
        doc_id: i64,
    },

    /// Show the crawled page snapshot of a document
    Snapshot {
        /// Document ID (from search results)
        doc_id: i64,

        /// Print the stored HTML instead of rendered text
        #[arg(long)]
        raw: bool,

        /// Wrap width for rendered text
        #[arg(short, long, default_value = "100")]
        width: usize,
    },

    /// Ask one question grounded in the documents matching a search
    Ask {
        /// Question for the model
        question: String,

        /// Search query used to build the knowledge base (defaults to the question)
        #[arg(short, long)]
        query: Option<String>,

        /// Number of top documents to load (defaults to knowledge.max_documents, 0 = all)
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Interactive chat session; use `/search <query>` to reload knowledge
    Chat {
        /// Initial search query for the knowledge base
        #[arg(short, long)]
        query: Option<String>,
    },

    /// Search history kept by the backend
    History {
        #[command(subcommand)]
        command: HistoryCommand,
    },

    /// Crawler control
    Crawler {
        #[command(subcommand)]
        command: CrawlerCommand,
    },

    /// Document preprocessing
    Preprocess {
        #[command(subcommand)]
        command: PreprocessCommand,
    },

    /// Inverted index build
    Index {
        #[command(subcommand)]
        command: IndexCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum HistoryCommand {
    /// List recorded searches
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Record a search manually
    Record {
        /// Query text
        query: String,

        /// Number of results the search returned
        #[arg(short, long, default_value = "0")]
        num: usize,
    },

    /// Remove one history entry
    Remove {
        /// History entry ID
        id: i64,
    },

    /// Remove ALL history entries
    Clear {
        /// Confirm deletion without prompting
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum CrawlerCommand {
    /// Start a new crawl
    Start,

    /// Stop the running crawl
    Stop,

    /// Resume a stopped crawl
    Continue,

    /// Print the crawler configuration as JSON
    Config,

    /// Replace the crawler configuration with the contents of a JSON file
    SaveConfig {
        /// Path to a JSON file
        file: PathBuf,
    },

    /// Follow crawl progress until the crawl completes
    Progress,
}

#[derive(Subcommand, Debug)]
pub enum PreprocessCommand {
    /// Check whether the preprocessed corpus exists
    Check,

    /// Print the preprocessing configuration
    Config,

    /// Run preprocessing
    Start {
        /// Minimum document frequency for kept terms
        #[arg(long, default_value = "2")]
        min_df: u32,

        /// Maximum document frequency ratio for kept terms (0.0-1.0)
        #[arg(long, default_value = "0.85")]
        max_df: f64,
    },
}

#[derive(Subcommand, Debug)]
pub enum IndexCommand {
    /// Check whether the index files exist
    Check,

    /// Build the inverted index
    Start {
        /// Optimize the index after building
        #[arg(long)]
        optimize: bool,

        /// Minimum TF-IDF weight for indexed terms
        #[arg(long, default_value = "0.0")]
        min_tfidf: f64,
    },
}
