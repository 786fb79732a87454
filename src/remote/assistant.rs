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

//! Remote AI assistant query.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::ServiceClient;

#[derive(Debug, Error)]
pub enum AskError {
    #[error("say or type something first")]
    EmptyQuery,

    #[error("assistant unavailable: {0}")]
    ServiceError(String),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AskRequest<'a> {
    user_query: &'a str,
}

#[derive(Deserialize)]
struct AskResponse {
    success: bool,
    #[serde(default)]
    response: Option<String>,
}

/// Client for `POST /ask-ai`.
#[derive(Clone)]
pub struct AssistantClient {
    service: ServiceClient,
}

impl AssistantClient {
    pub fn new(service: ServiceClient) -> Self {
        Self { service }
    }

    /// Ask the assistant and return its reply.
    pub async fn ask(&self, query: &str) -> Result<String, AskError> {
        if query.trim().is_empty() {
            return Err(AskError::EmptyQuery);
        }

        let url = self.service.url("ask-ai");
        debug!("POST {} ({} chars)", url, query.len());

        let resp = self
            .service
            .http
            .post(&url)
            .json(&AskRequest { user_query: query })
            .send()
            .await
            .map_err(|e| {
                warn!("Assistant request failed: {}", e);
                AskError::ServiceError(e.to_string())
            })?;

        let reply: AskResponse = ServiceClient::parse(resp)
            .await
            .map_err(AskError::ServiceError)?;

        if !reply.success {
            warn!("Assistant reported failure");
            return Err(AskError::ServiceError("could not get response".to_string()));
        }

        let text = reply
            .response
            .ok_or_else(|| AskError::ServiceError("reply had no response text".to_string()))?;
        info!("Assistant replied with {} chars", text.len());
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AssistantConfig;

    #[tokio::test]
    async fn test_empty_query_needs_no_network() {
        // Port 9 (discard) is never contacted because the query is rejected first.
        let config = AssistantConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout_secs: Some(1),
        };
        let client = AssistantClient::new(ServiceClient::new(&config).unwrap());

        assert!(matches!(client.ask("").await, Err(AskError::EmptyQuery)));
        assert!(matches!(client.ask("  \n").await, Err(AskError::EmptyQuery)));
    }

    #[test]
    fn test_request_uses_camel_case() {
        let json = serde_json::to_string(&AskRequest { user_query: "2+2" }).unwrap();
        assert_eq!(json, r#"{"userQuery":"2+2"}"#);
    }
}
