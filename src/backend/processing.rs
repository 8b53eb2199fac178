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

//! Preprocessing and inverted-index build stages of the backend pipeline

use serde_json::Value;
use std::collections::BTreeMap;

use crate::backend::client::{BackendClient, Deadline};
use crate::backend::types::{reject_error_object, FileCheck};
use crate::error::ClientResult;

impl BackendClient {
    /// Check the crawler database the preprocessing stage reads
    pub async fn check_preprocess_file(&self) -> ClientResult<FileCheck> {
        self.get_json("/preprocess/check_preprocess_file", &[], Deadline::Regular)
            .await
    }

    pub async fn get_preprocess_config(&self) -> ClientResult<Value> {
        let body: Value = self
            .get_json("/preprocess/get_preprocess_config", &[], Deadline::Regular)
            .await?;
        reject_error_object(body)
    }

    /// Run preprocessing with TF-IDF document frequency bounds; returns the report
    pub async fn start_preprocess(&self, min_df: u32, max_df: f64) -> ClientResult<Value> {
        let body: Value = self
            .get_json(
                "/preprocess/start_preprocess",
                &[("min_df", min_df.to_string()), ("max_df", max_df.to_string())],
                Deadline::Long,
            )
            .await?;
        reject_error_object(body)
    }

    /// Check the preprocessed artifacts the index build reads, keyed by path
    pub async fn check_index_file(&self) -> ClientResult<BTreeMap<String, FileCheck>> {
        self.get_json("/index/check_index_file", &[], Deadline::Regular)
            .await
    }

    /// Build the inverted index; returns the build report
    pub async fn start_inverted_index(&self, optimize: bool, min_tfidf: f64) -> ClientResult<Value> {
        let body: Value = self
            .get_json(
                "/index/start_inverted_index",
                &[
                    ("optimize", optimize.to_string()),
                    ("min_tfidf", min_tfidf.to_string()),
                ],
                Deadline::Long,
            )
            .await?;
        reject_error_object(body)
    }
}
