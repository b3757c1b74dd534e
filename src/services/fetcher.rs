//! Page fetcher with retry and backoff.
//!
//! One HTTP GET per resource. Server errors and rate limiting are retried
//! with a linearly increasing backoff; everything else fails fast with a
//! typed error the caller can record without aborting the run.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use thiserror::Error;

use crate::models::CrawlerConfig;

/// Typed fetch failure.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The request timed out
    #[error("timeout fetching {url}")]
    Timeout { url: String },

    /// Connection-level failure
    #[error("network error fetching {url}: {message}")]
    Network { url: String, message: String },

    /// Non-2xx response after retries were exhausted
    #[error("HTTP {status} fetching {url}")]
    Http { url: String, status: StatusCode },
}

/// A successfully fetched page.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub body: String,
    pub content_type: String,
}

/// Service issuing GET requests with retry/backoff.
#[derive(Clone)]
pub struct PageFetcher {
    client: Client,
    max_retries: u32,
    backoff_base: Duration,
}

impl PageFetcher {
    pub fn new(client: Client, config: &CrawlerConfig) -> Self {
        Self {
            client,
            max_retries: config.max_retries,
            backoff_base: Duration::from_millis(config.backoff_base_ms),
        }
    }

    /// Fetch a page, retrying on 429 and 5xx up to the attempt limit.
    pub async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let mut attempt = 0u32;

        loop {
            attempt += 1;

            match self.client.get(url).send().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let content_type = response
                            .headers()
                            .get(reqwest::header::CONTENT_TYPE)
                            .and_then(|v| v.to_str().ok())
                            .unwrap_or("")
                            .to_string();
                        let body =
                            response.text().await.map_err(|e| Self::classify(url, e))?;
                        return Ok(FetchedPage { body, content_type });
                    }

                    if !Self::is_retryable(status) || attempt > self.max_retries {
                        return Err(FetchError::Http {
                            url: url.to_string(),
                            status,
                        });
                    }
                }
                Err(e) => {
                    let error = Self::classify(url, e);
                    // Only connection-level errors are retried; timeouts are
                    // already bounded by the client timeout.
                    let retryable = matches!(error, FetchError::Network { .. });
                    if !retryable || attempt > self.max_retries {
                        return Err(error);
                    }
                }
            }

            tokio::time::sleep(self.backoff_base * attempt).await;
        }
    }

    /// Retryable status classes: rate limiting and server errors.
    fn is_retryable(status: StatusCode) -> bool {
        status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
    }

    fn classify(url: &str, error: reqwest::Error) -> FetchError {
        if error.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
            }
        } else {
            FetchError::Network {
                url: url.to_string(),
                message: error.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher_for(config: &CrawlerConfig) -> PageFetcher {
        let client = Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        PageFetcher::new(client, config)
    }

    fn fast_config() -> CrawlerConfig {
        CrawlerConfig {
            max_retries: 3,
            backoff_base_ms: 1,
            ..CrawlerConfig::default()
        }
    }

    #[tokio::test]
    async fn test_fetch_success_returns_body_and_content_type() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw("<html>ok</html>", "text/html; charset=utf-8"),
            )
            .mount(&server)
            .await;

        let page = fetcher_for(&fast_config())
            .fetch(&format!("{}/page", server.uri()))
            .await
            .unwrap();
        assert_eq!(page.body, "<html>ok</html>");
        assert!(page.content_type.starts_with("text/html"));
    }

    #[tokio::test]
    async fn test_fetch_retries_server_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(200).set_body_string("recovered"))
            .expect(1)
            .mount(&server)
            .await;

        let page = fetcher_for(&fast_config())
            .fetch(&format!("{}/flaky", server.uri()))
            .await
            .unwrap();
        assert_eq!(page.body, "recovered");
    }

    #[tokio::test]
    async fn test_fetch_does_not_retry_client_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let error = fetcher_for(&fast_config())
            .fetch(&format!("{}/missing", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(
            error,
            FetchError::Http {
                status: StatusCode::NOT_FOUND,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_fetch_exhausts_retries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/down"))
            .respond_with(ResponseTemplate::new(500))
            // 1 initial attempt + 3 retries
            .expect(4)
            .mount(&server)
            .await;

        let error = fetcher_for(&fast_config())
            .fetch(&format!("{}/down", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(error, FetchError::Http { .. }));
    }
}
