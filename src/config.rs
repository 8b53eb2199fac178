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
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Connection settings for the document search backend
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub base_url: String,
    pub request_timeout_secs: u64,
    pub long_timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            request_timeout_secs: 10,
            long_timeout_secs: 50,
            connect_timeout_secs: 5,
        }
    }
}

impl BackendConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn long_timeout(&self) -> Duration {
        Duration::from_secs(self.long_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// Language model settings for the chat pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    pub api_base: String,
    pub model: String,
    pub api_key_env: String,
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,
    pub channel_capacity: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.mistral.ai/v1".to_string(),
            model: "mistral-tiny".to_string(),
            api_key_env: "MISTRAL_API_KEY".to_string(),
            connect_timeout_secs: 10,
            read_timeout_secs: 50,
            channel_capacity: 64,
        }
    }
}

impl ChatConfig {
    /// Resolve the API key from the configured environment variable
    pub fn api_key(&self) -> Result<String> {
        std::env::var(&self.api_key_env).with_context(|| {
            format!(
                "Chat API key not found: set the {} environment variable",
                self.api_key_env
            )
        })
    }
}

/// Knowledge aggregation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KnowledgeConfig {
    pub max_concurrent_fetches: usize,
    pub max_documents: usize,
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: 16,
            max_documents: 0,
        }
    }
}

/// Search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub record_history: bool,
    pub display_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            record_history: true,
            display_limit: 20,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub file_logging: bool,
}

/// Main configuration for tali
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub backend: BackendConfig,
    pub chat: ChatConfig,
    pub knowledge: KnowledgeConfig,
    pub search: SearchConfig,
    pub logging: LoggingConfig,
}

const DEFAULT_TEMPLATE: &str = include_str!("../config-templates/default.toml");

impl Config {
    /// Load configuration from config.toml file
    /// First tries to load from system config directory, falls back to embedded template
    pub fn load() -> Result<Self> {
        let config_path = crate::storage::get_system_config_path()?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read {}", config_path.display()))?;
            let config: Self = toml::from_str(&content)
                .with_context(|| format!("Invalid configuration in {}", config_path.display()))?;
            Ok(config)
        } else {
            let config = Self::from_template()?;

            if let Some(parent) = config_path.parent() {
                if !parent.exists() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            std::fs::write(&config_path, DEFAULT_TEMPLATE)?;

            Ok(config)
        }
    }

    pub fn from_template() -> Result<Self> {
        Ok(toml::from_str(DEFAULT_TEMPLATE)?)
    }
}
