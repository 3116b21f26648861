use async_trait::async_trait;
use odb_core::{FetchError, SourceConfig};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::redirect::Policy;
use reqwest::Client;
use tracing::{debug, instrument, warn};
use url::Url;

const MAX_REDIRECTS: usize = 10;

#[async_trait]
pub trait Fetch: Send + Sync {
    /// Returns the body of `url`, or why it could not be retrieved.
    async fn fetch(&self, url: &Url) -> Result<String, FetchError>;
}

/// Fetches pages over HTTP while presenting itself as a regular browser.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &SourceConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        let client = Client::builder()
            .user_agent(config.user_agent())
            .default_headers(headers)
            .timeout(config.timeout())
            .redirect(Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(classify)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    #[instrument(level = "debug", skip_all, fields(url = %url))]
    async fn fetch(&self, url: &Url) -> Result<String, FetchError> {
        let response = self.client.get(url.clone()).send().await.map_err(classify)?;
        let status = response.status();
        if !status.is_success() {
            warn!(%url, status = status.as_u16(), "upstream returned an error status");
            return Err(FetchError::HttpStatus(status.as_u16()));
        }
        let body = response.text().await.map_err(classify)?;
        debug!(bytes = body.len(), "fetched page");
        Ok(body)
    }
}

fn classify(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout
    } else if let Some(status) = err.status() {
        FetchError::HttpStatus(status.as_u16())
    } else {
        FetchError::Network(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves `response` verbatim to the first connection, or holds the
    /// connection open without answering when `response` is `None`.
    async fn one_shot_server(response: Option<&'static str>) -> Url {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 4096];
            let _ = socket.read(&mut request).await;
            match response {
                Some(response) => {
                    socket.write_all(response.as_bytes()).await.unwrap();
                    socket.shutdown().await.ok();
                }
                None => tokio::time::sleep(Duration::from_secs(10)).await,
            }
        });
        Url::parse(&format!("http://{}/en/devotionals/", addr)).unwrap()
    }

    fn fetcher(timeout: Duration) -> HttpFetcher {
        HttpFetcher::new(&SourceConfig::default().with_timeout(timeout)).unwrap()
    }

    #[tokio::test]
    async fn test_success_returns_body() {
        let url = one_shot_server(Some(
            "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: 12\r\nConnection: close\r\n\r\n<p>bread</p>",
        ))
        .await;
        assert_eq!(fetcher(Duration::from_secs(5)).fetch(&url).await, Ok("<p>bread</p>".to_string()));
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let url = one_shot_server(Some(
            "HTTP/1.1 503 Service Unavailable\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        ))
        .await;
        assert_eq!(
            fetcher(Duration::from_secs(5)).fetch(&url).await,
            Err(FetchError::HttpStatus(503))
        );
    }

    #[tokio::test]
    async fn test_silent_server_times_out() {
        let url = one_shot_server(None).await;
        assert_eq!(
            fetcher(Duration::from_millis(300)).fetch(&url).await,
            Err(FetchError::Timeout)
        );
    }

    #[test]
    fn test_builds_from_config() {
        let config = SourceConfig::default().with_timeout(Duration::from_secs(2));
        assert!(HttpFetcher::new(&config).is_ok());
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        let config = SourceConfig::default().with_timeout(Duration::from_secs(2));
        let fetcher = HttpFetcher::new(&config).unwrap();
        // nothing listens on the discard port
        let url = Url::parse("http://127.0.0.1:9/").unwrap();
        match fetcher.fetch(&url).await {
            Err(FetchError::Network(_)) | Err(FetchError::Timeout) => {}
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
