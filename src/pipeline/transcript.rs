//! Transcript stage — fetches YouTube transcripts from the Supadata API.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{info, warn};

use crate::errors::TranscriptError;

const SUPADATA_ENDPOINT: &str = "https://api.supadata.ai/v1/youtube/transcript";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_RETRIES: u32 = 3;
const INITIAL_BACKOFF_MS: u64 = 1000;

/// A fetched transcript plus the metadata the pipeline reports on.
#[derive(Debug, Clone)]
pub struct Transcript {
    pub text: String,
    pub language: String,
}

impl Transcript {
    pub fn chars(&self) -> usize {
        self.text.chars().count()
    }
}

/// Source of video transcripts. Real implementation: `SupadataClient`.
/// Tests substitute a double.
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    async fn fetch(
        &self,
        youtube_url: &str,
        video_id: &str,
        language: &str,
    ) -> Result<Transcript, TranscriptError>;
}

#[derive(Debug, Deserialize)]
struct TranscriptResponse {
    content: Option<String>,
    lang: Option<String>,
}

/// Supadata transcript API client.
pub struct SupadataClient {
    client: reqwest::Client,
    api_key: String,
}

impl SupadataClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("reqwest client construction cannot fail with static options");
        Self {
            client,
            api_key: api_key.into(),
        }
    }

    async fn request(
        &self,
        youtube_url: &str,
        language: &str,
    ) -> Result<reqwest::Response, reqwest::Error> {
        self.client
            .get(SUPADATA_ENDPOINT)
            .header("x-api-key", self.api_key.as_str())
            .query(&[("url", youtube_url), ("lang", language), ("text", "true")])
            .send()
            .await
    }
}

#[async_trait]
impl TranscriptSource for SupadataClient {
    /// Fetch the transcript, retrying transport failures with exponential
    /// backoff. HTTP error statuses are not retried: a 404 today is a 404
    /// in a second, and 4xx generally means the video has no transcript.
    async fn fetch(
        &self,
        youtube_url: &str,
        video_id: &str,
        language: &str,
    ) -> Result<Transcript, TranscriptError> {
        let mut attempt = 0;
        let response = loop {
            attempt += 1;
            match self.request(youtube_url, language).await {
                Ok(response) => break response,
                Err(e) => {
                    if attempt >= MAX_RETRIES {
                        return Err(TranscriptError::Request(e));
                    }
                    let backoff = Duration::from_millis(INITIAL_BACKOFF_MS * 2u64.pow(attempt - 1));
                    warn!(video_id, attempt, error = %e, "transcript request failed, retrying");
                    tokio::time::sleep(backoff).await;
                }
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let excerpt: String = body.chars().take(200).collect();
            return Err(TranscriptError::Http {
                status: status.as_u16(),
                body: excerpt,
            });
        }

        let parsed: TranscriptResponse =
            response.json().await.map_err(TranscriptError::Decode)?;

        match parsed.content {
            Some(text) if !text.trim().is_empty() => {
                info!(video_id, chars = text.chars().count(), "transcript fetched");
                Ok(Transcript {
                    text,
                    language: parsed.lang.unwrap_or_else(|| language.to_string()),
                })
            }
            _ => Err(TranscriptError::NotFound {
                video_id: video_id.to_string(),
            }),
        }
    }
}
