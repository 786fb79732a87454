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

//! PDF text extraction through the hosted service.

use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::ServiceClient;

const PDF_MAGIC: &[u8] = b"%PDF";

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    #[error("{0} is not a PDF document")]
    NotPdf(PathBuf),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("extraction failed: {0}")]
    ServiceError(String),
}

#[derive(Deserialize)]
struct ExtractResponse {
    success: bool,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Text pulled out of a PDF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfExtract {
    pub file_name: String,
    pub text: String,
    pub word_count: usize,
}

impl PdfExtract {
    pub fn new(file_name: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            file_name: file_name.into(),
            word_count: text.split_whitespace().count(),
            text,
        }
    }
}

/// Client for `POST /extract-text`.
#[derive(Clone)]
pub struct PdfExtractor {
    service: ServiceClient,
}

impl PdfExtractor {
    pub fn new(service: ServiceClient) -> Self {
        Self { service }
    }

    /// Upload the PDF at `path` and return its text.
    pub async fn extract(&self, path: &Path) -> Result<PdfExtract, ExtractError> {
        let data = tokio::fs::read(path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ExtractError::NotFound(path.to_path_buf()),
            _ => ExtractError::Io {
                path: path.to_path_buf(),
                source: e,
            },
        })?;

        if !data.starts_with(PDF_MAGIC) {
            return Err(ExtractError::NotPdf(path.to_path_buf()));
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "document.pdf".to_string());

        let part = Part::bytes(data)
            .file_name(file_name.clone())
            .mime_str("application/pdf")
            .map_err(|e| ExtractError::ServiceError(e.to_string()))?;
        let form = Form::new().part("pdfFile", part);

        let url = self.service.url("extract-text");
        debug!("POST {} ({})", url, file_name);

        let resp = self
            .service
            .http
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                warn!("Upload of {} failed: {}", file_name, e);
                ExtractError::ServiceError(e.to_string())
            })?;

        let reply: ExtractResponse = ServiceClient::parse(resp)
            .await
            .map_err(ExtractError::ServiceError)?;

        if !reply.success {
            let reason = reply
                .error
                .unwrap_or_else(|| "extraction failed".to_string());
            return Err(ExtractError::ServiceError(reason));
        }

        let extract = PdfExtract::new(file_name, reply.text.unwrap_or_default());
        info!(
            "Extracted {} words from {}",
            extract.word_count, extract.file_name
        );
        Ok(extract)
    }
}
