use reqwest::Client;
use tracing::{debug, warn};

use super::types::SearchResponse;
use crate::config::{ApiKey, SearchSettings};

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("invalid search endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),

    #[error("search failed: status {0}")]
    Status(u16),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Turns a free-text query into candidate page URLs.
///
/// Failures are absorbed: implementations return an empty list rather than
/// an error, so callers only ever see "some URLs" or "none".
pub trait UrlResolver {
    async fn resolve(&self, query: &str) -> Vec<String>;
}

/// Bing Web Search v7 client.
#[derive(Clone)]
pub struct BingClient {
    http: Client,
    api_key: ApiKey,
    endpoint: String,
}

impl BingClient {
    pub fn new(http: Client, settings: SearchSettings) -> Self {
        Self {
            http,
            api_key: settings.api_key,
            endpoint: settings.endpoint,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_base_url(http: Client, endpoint: &str) -> Self {
        Self {
            http,
            api_key: ApiKey::new("test-key"),
            endpoint: endpoint.to_string(),
        }
    }

    async fn search(&self, query: &str) -> Result<Vec<String>, SearchError> {
        let url = url::Url::parse_with_params(
            &self.endpoint,
            &[
                ("q", query),
                ("textDecorations", "true"),
                ("textFormat", "HTML"),
            ],
        )?;

        let response = self
            .http
            .get(url)
            .header("Ocp-Apim-Subscription-Key", self.api_key.expose())
            .header("User-Agent", crate::USER_AGENT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Status(status.as_u16()));
        }

        let body: SearchResponse = response.json().await?;
        Ok(body.into_urls())
    }
}

impl UrlResolver for BingClient {
    async fn resolve(&self, query: &str) -> Vec<String> {
        match self.search(query).await {
            Ok(urls) => {
                debug!(%query, count = urls.len(), "search complete");
                urls
            }
            Err(e) => {
                warn!(%query, error = %e, "search failed, no candidate URLs");
                Vec::new()
            }
        }
    }
}
