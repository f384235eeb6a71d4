//! Page harvesting: fetch one candidate URL and extract contact data from its HTML.

mod extractor;
pub mod page;

pub use page::HarvestedPage;

use extractor::extract_page;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use tracing::{debug, warn};

const MAX_RESPONSE_BYTES: usize = 10_000_000;

#[derive(Debug, thiserror::Error)]
pub enum HarvestError {
    #[error("invalid URL: must be HTTP(S)")]
    InvalidScheme,

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("invalid URL: missing host")]
    MissingHost,

    #[error("fetch failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("fetch failed: status {0}")]
    Status(u16),

    #[error("response too large (>{} bytes)", MAX_RESPONSE_BYTES)]
    TooLarge,
}

/// Fetches a page and extracts its contact data.
///
/// Every failure collapses to `None`; the reason is logged, never returned.
/// The page is rendered through its serialized document form.
pub trait PageHarvester {
    type Page: Serialize;

    async fn harvest(&self, url: &str) -> Option<Self::Page>;
}

/// Harvester backed by one shared HTTP client.
#[derive(Clone)]
pub struct Harvester {
    http: Client,
}

impl Harvester {
    pub fn new(http: Client) -> Self {
        Self { http }
    }

    async fn try_harvest(&self, url: &str) -> Result<HarvestedPage, HarvestError> {
        validate_url(url)?;
        let html = download(&self.http, url).await?;
        debug!(%url, bytes = html.len(), "page fetched");
        Ok(extract_page(&html, url))
    }
}

impl PageHarvester for Harvester {
    type Page = HarvestedPage;

    async fn harvest(&self, url: &str) -> Option<HarvestedPage> {
        match self.try_harvest(url).await {
            Ok(page) => {
                debug!(
                    %url,
                    emails = page.contact_information.emails.len(),
                    phones = page.contact_information.phone_numbers.len(),
                    "page harvested"
                );
                Some(page)
            }
            Err(e) => {
                warn!(%url, error = %e, "harvest failed");
                None
            }
        }
    }
}

fn validate_url(raw: &str) -> Result<(), HarvestError> {
    let parsed = url::Url::parse(raw)?;

    match parsed.scheme() {
        "http" | "https" => {}
        _ => return Err(HarvestError::InvalidScheme),
    }

    // The parser supplies a host for `http:/host` and `http:host`; only a
    // written `//` authority counts.
    let has_authority = raw
        .trim_start()
        .split_once(':')
        .is_some_and(|(_, rest)| rest.starts_with("//"));
    if !has_authority || parsed.host_str().is_none_or(str::is_empty) {
        return Err(HarvestError::MissingHost);
    }

    Ok(())
}

async fn download(client: &Client, url: &str) -> Result<String, HarvestError> {
    let response = client
        .get(url)
        .header("User-Agent", crate::USER_AGENT)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(HarvestError::Status(status.as_u16()));
    }

    if let Some(len) = response.content_length()
        && len as usize > MAX_RESPONSE_BYTES
    {
        return Err(HarvestError::TooLarge);
    }

    let charset = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(charset_from_content_type);

    let mut body = Vec::new();
    let mut stream = response;
    while let Some(chunk) = stream.chunk().await? {
        body.extend_from_slice(&chunk);
        if body.len() > MAX_RESPONSE_BYTES {
            return Err(HarvestError::TooLarge);
        }
    }

    Ok(decode_body(&body, charset.as_deref()))
}

fn charset_from_content_type(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches('"').to_string())
    })
}

/// Decodes with the declared charset, falling back to lossy UTF-8.
fn decode_body(body: &[u8], charset: Option<&str>) -> String {
    match charset.and_then(|c| encoding_rs::Encoding::for_label(c.as_bytes())) {
        Some(encoding) => encoding.decode(body).0.into_owned(),
        None => String::from_utf8_lossy(body).into_owned(),
    }
}


#[cfg(test)]
mod http_tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PAGE: &str = r#"<html><head><title>Acme</title></head>
        <body><p>Contact: info@acme.example</p>
        <a href="https://facebook.com/acme">fb</a></body></html>"#;

    #[tokio::test]
    async fn harvest_success_returns_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/contact"))
            .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
            .mount(&server)
            .await;

        let url = format!("{}/contact", server.uri());
        let page = Harvester::new(Client::new()).harvest(&url).await.unwrap();

        assert_eq!(page.metadata.website_url, url);
        assert_eq!(page.metadata.page_title, "Acme");
        assert!(page.contact_information.emails.contains("info@acme.example"));
        assert_eq!(page.social_media, vec!["https://facebook.com/acme"]);
    }

    #[tokio::test]
    async fn harvest_non_success_status_returns_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let url = format!("{}/missing", server.uri());
        assert!(Harvester::new(Client::new()).harvest(&url).await.is_none());
    }

    #[tokio::test]
    async fn harvest_invalid_url_makes_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
            .expect(0)
            .mount(&server)
            .await;

        // Host and port of the mock server, but no scheme.
        let url = format!("{}/contact", server.address());
        assert!(Harvester::new(Client::new()).harvest(&url).await.is_none());
    }

    #[tokio::test]
    async fn download_500_returns_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let result = download(&Client::new(), &server.uri()).await;
        assert!(matches!(result, Err(HarvestError::Status(500))));
    }

    #[tokio::test]
    async fn download_too_large_body_rejected() {
        let oversized = "x".repeat(MAX_RESPONSE_BYTES + 1);
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/huge"))
            .respond_with(ResponseTemplate::new(200).set_body_string(oversized))
            .mount(&server)
            .await;

        let result = download(&Client::new(), &format!("{}/huge", server.uri())).await;
        assert!(matches!(result, Err(HarvestError::TooLarge)));
    }

    #[tokio::test]
    async fn harvest_connection_failure_returns_none() {
        let harvester = Harvester::new(Client::new());
        assert!(harvester.harvest("http://127.0.0.1:1/").await.is_none());
    }
}
