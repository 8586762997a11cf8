//! HTTP client for the evaluation backend.
//!
//! Two contracts: the streaming analyze endpoint, which answers a posted
//! article URL with a chunked event stream, and the plain results
//! endpoint, which returns previous evaluations grouped by article.

use crate::config::BackendConfig;
use crate::error::ClientError;
use crate::models::ArticleGroup;
use futures::{Stream, StreamExt};
use reqwest::Url;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

/// Body of an analyze request.
#[derive(Debug, Serialize)]
struct AnalyzeRequest<'a> {
    url: &'a str,
}

/// Client for both backend endpoints.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http_client: reqwest::Client,
    base_url: String,
    analyze_url: Url,
    results_url: Url,
    timeout_seconds: u64,
}

impl BackendClient {
    /// Create a client from backend settings.
    pub fn new(config: &BackendConfig) -> Result<Self, ClientError> {
        let analyze_url = endpoint_url(&config.base_url, &config.analyze_path)?;
        let results_url = endpoint_url(&config.base_url, &config.results_path)?;

        // No overall timeout: it would also cut off a long-running stream
        let http_client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| ClientError::Build(e.to_string()))?;

        info!("Using evaluation backend at {}", config.base_url);

        Ok(Self {
            http_client,
            base_url: config.base_url.clone(),
            analyze_url,
            results_url,
            timeout_seconds: config.timeout_seconds,
        })
    }

    /// Submit an article and open its event stream.
    ///
    /// Fails before any byte is read if the request can't be sent or the
    /// backend answers with a non-success status. Errors while reading the
    /// returned stream are yielded as stream items.
    pub async fn open_analysis_stream(
        &self,
        article_url: &str,
    ) -> Result<impl Stream<Item = Result<impl AsRef<[u8]>, ClientError>>, ClientError> {
        debug!("POST {} for {}", self.analyze_url, article_url);

        let response = self
            .http_client
            .post(self.analyze_url.clone())
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .json(&AnalyzeRequest { url: article_url })
            .send()
            .await
            .map_err(|e| self.map_error(e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status { status, body });
        }

        let base_url = self.base_url.clone();
        let timeout_seconds = self.timeout_seconds;
        Ok(response.bytes_stream().map(move |chunk| {
            chunk.map_err(|e| ClientError::from_reqwest(e, &base_url, timeout_seconds))
        }))
    }

    /// Fetch all previous evaluations.
    pub async fn fetch_results(&self) -> Result<Vec<ArticleGroup>, ClientError> {
        debug!("GET {}", self.results_url);

        let response = self
            .http_client
            .get(self.results_url.clone())
            .timeout(Duration::from_secs(self.timeout_seconds))
            .send()
            .await
            .map_err(|e| self.map_error(e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status { status, body });
        }

        let body: Value = response.json().await.map_err(|e| self.map_error(e))?;
        let groups = normalize_results(body)?;
        info!("Fetched {} article groups", groups.len());
        Ok(groups)
    }

    fn map_error(&self, err: reqwest::Error) -> ClientError {
        ClientError::from_reqwest(err, &self.base_url, self.timeout_seconds)
    }
}

/// Join a base URL and an endpoint path.
pub fn endpoint_url(base_url: &str, path: &str) -> Result<Url, ClientError> {
    let joined = format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    Url::parse(&joined).map_err(|e| ClientError::InvalidUrl(format!("{}: {}", joined, e)))
}

/// The results endpoint returns either one group or a list of them.
pub fn normalize_results(body: Value) -> Result<Vec<ArticleGroup>, ClientError> {
    let groups = match body {
        Value::Array(_) => serde_json::from_value(body),
        other => serde_json::from_value(other).map(|group| vec![group]),
    };
    groups.map_err(|e| ClientError::Decode(e.to_string()))
}
