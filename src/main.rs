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

use anyhow::Result;
use clap::Parser;

mod backend;
mod chat;
mod cli;
mod commands;
mod config;
mod error;
mod formatting;
mod knowledge;
mod logging;
mod search;
mod sse;
mod storage;

use cli::Cli;
use config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file if present
    dotenvy::dotenv().ok();

    // Parse command line arguments
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load()?;

    logging::init_logging(&config.logging, cli.debug)?;

    // Execute the command
    if let Err(e) = commands::execute(&config, cli.command).await {
        eprintln!("Error: {:#}", e);
        if let Some(log_dir) = logging::get_log_directory() {
            eprintln!("Logs: {}", log_dir.display());
        }
        std::process::exit(1);
    }

    Ok(())
}
