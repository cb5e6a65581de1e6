use std::time::Duration;

use async_trait::async_trait;
use mt_core::{ArticleSource, FetchError, Fetcher, Result};
use reqwest::Client;
use tracing::{debug, error};

const USER_AGENT: &str = concat!("mt/", env!("CARGO_PKG_VERSION"));

/// Plain HTTP GET fetcher.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }
}

fn classify(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout
    } else if let Some(status) = err.status() {
        FetchError::Http(status.as_u16())
    } else {
        FetchError::Network(err.to_string())
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> std::result::Result<ArticleSource, FetchError> {
        debug!("GET {}", url);
        let response = self.client.get(url).send().await.map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            error!("Failed to fetch URL {}: HTTP {}", url, status.as_u16());
            return Err(FetchError::Http(status.as_u16()));
        }

        let html = response.text().await.map_err(classify)?;
        Ok(ArticleSource::new(url, html))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, response::Html, routing::get, Router};

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_fetch_article() {
        let app = Router::new().route("/news/1", get(|| async { Html("<p>ޚަބަރު</p>") }));
        let base = serve(app).await;

        let fetcher = HttpFetcher::new(Duration::from_secs(5)).unwrap();
        let source = fetcher.fetch(&format!("{}/news/1", base)).await.unwrap();
        assert_eq!(source.url, format!("{}/news/1", base));
        assert_eq!(source.raw_document, "<p>ޚަބަރު</p>");
    }

    #[tokio::test]
    async fn test_fetch_http_error() {
        let app = Router::new()
            .route("/gone", get(|| async { StatusCode::NOT_FOUND }))
            .route("/down", get(|| async { StatusCode::BAD_GATEWAY }));
        let base = serve(app).await;

        let fetcher = HttpFetcher::new(Duration::from_secs(5)).unwrap();
        let err = fetcher.fetch(&format!("{}/gone", base)).await.unwrap_err();
        assert_eq!(err, FetchError::Http(404));
        assert!(!err.is_retryable());

        let err = fetcher.fetch(&format!("{}/down", base)).await.unwrap_err();
        assert_eq!(err, FetchError::Http(502));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_fetch_timeout() {
        let app = Router::new().route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(2)).await;
                "late"
            }),
        );
        let base = serve(app).await;

        let fetcher = HttpFetcher::new(Duration::from_millis(100)).unwrap();
        let err = fetcher.fetch(&format!("{}/slow", base)).await.unwrap_err();
        assert_eq!(err, FetchError::Timeout);
    }

    #[tokio::test]
    async fn test_fetch_network_error() {
        let fetcher = HttpFetcher::new(Duration::from_secs(2)).unwrap();
        let err = fetcher.fetch("http://127.0.0.1:1/unreachable").await.unwrap_err();
        assert!(matches!(err, FetchError::Network(_)));
    }
}
