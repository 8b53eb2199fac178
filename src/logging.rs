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

use std::path::PathBuf;
use std::sync::OnceLock;
use tracing::info;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, registry::Registry, EnvFilter};

use crate::config::LoggingConfig;

static LOG_DIR: OnceLock<PathBuf> = OnceLock::new();

fn env_filter(debug_mode: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if debug_mode {
            EnvFilter::new("info,tali=debug")
        } else {
            EnvFilter::new("warn,tali=info")
        }
    })
}

/// Initialize logging: console output on stderr, plus an optional
/// daily-rotated JSON file in the data directory.
/// Stdout stays reserved for command output and streamed answers.
pub fn init_logging(config: &LoggingConfig, debug_mode: bool) -> Result<(), anyhow::Error> {
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(env_filter(debug_mode));

    if !config.file_logging {
        Registry::default().with(console_layer).init();
        return Ok(());
    }

    let log_dir = crate::storage::get_log_dir()?;
    std::fs::create_dir_all(&log_dir)?;

    LOG_DIR
        .set(log_dir.clone())
        .map_err(|_| anyhow::anyhow!("Failed to set log directory"))?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, "tali.log");

    // File layer with JSON formatting for structured logs
    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(true)
        .json()
        .with_filter(env_filter(debug_mode));

    Registry::default()
        .with(console_layer)
        .with(file_layer)
        .init();

    info!(
        log_directory = %log_dir.display(),
        debug_mode = debug_mode,
        "File logging initialized"
    );

    Ok(())
}

/// Get the current log directory
pub fn get_log_directory() -> Option<PathBuf> {
    LOG_DIR.get().cloned()
}
