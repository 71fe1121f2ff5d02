use reqwest::header::{ACCEPT_LANGUAGE, HeaderMap, HeaderValue, InvalidHeaderValue};
use reqwest::{Client, StatusCode};

use crate::config::FetchSettings;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("{url} responded with {status}")]
    Status { url: String, status: StatusCode },
    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] InvalidHeaderValue),
}

/// Anything that can turn a URL into page HTML.
pub trait PageSource {
    fn fetch_page(&self, url: &str) -> impl Future<Output = Result<String, FetchError>> + Send;
}

#[derive(Debug, Clone)]
pub struct WebScraper {
    client: Client,
}

impl WebScraper {
    pub fn new(settings: &FetchSettings) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        if let Some(language) = &settings.accept_language {
            headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_str(language)?);
        }

        let client = Client::builder()
            .timeout(settings.timeout)
            .user_agent(settings.user_agent.as_str())
            .default_headers(headers)
            .build()?;

        Ok(Self { client })
    }
}

impl PageSource for WebScraper {
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .inspect_err(|e| log::debug!("HTTP error: {e:?}"))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        Ok(response
            .text()
            .await
            .inspect_err(|e| log::debug!("Decode error: {e:?}"))?)
    }
}
