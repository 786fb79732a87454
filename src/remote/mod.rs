// Copyright 2026 Daniel Pelikan
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

//! Clients for the hosted text service.
//!
//! The same service answers AI queries (`/ask-ai`) and extracts text from
//! uploaded PDFs (`/extract-text`).

mod assistant;
mod extract;

use anyhow::Result;
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::config::AssistantConfig;

pub use assistant::{AskError, AssistantClient};
pub use extract::{ExtractError, PdfExtract, PdfExtractor};

/// Shared HTTP plumbing for the hosted service.
#[derive(Clone)]
pub struct ServiceClient {
    http: reqwest::Client,
    base_url: String,
}

impl ServiceClient {
    pub fn new(config: &AssistantConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            http: builder.build()?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Decode a JSON reply, turning non-2xx statuses into an error string.
    async fn parse<R: DeserializeOwned>(resp: reqwest::Response) -> Result<R, String> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(format!("HTTP {}: {}", status.as_u16(), body.trim()));
        }
        let body = resp
            .text()
            .await
            .map_err(|e| format!("response body: {}", e))?;
        serde_json::from_str(&body).map_err(|e| format!("unexpected response {:?}: {}", body, e))
    }
}
