//! Newsletter feed access.
//!
//! The workflow only consumes the body of the newest entry of one
//! syndication feed. [`FeedSource`] is that capability; [`HttpFeed`] is the
//! production implementation (one HTTP GET, parsed with `feed-rs`).
//! [`extract`] turns the entry body into [`Article`](crate::models::Article)s.

pub mod extract;

use crate::errors::WorkflowError;
use std::time::{Duration, Instant};
use tracing::{info, instrument, warn};
use url::Url;

/// Default newsletter feed.
pub const DEFAULT_FEED_URL: &str = "https://buttondown.com/ainews/rss";

/// Something that can hand over the body of the newest feed entry.
pub trait FeedSource {
    async fn first_entry_body(&self) -> Result<String, WorkflowError>;
}

/// Fetches a feed over HTTP.
#[derive(Debug, Clone)]
pub struct HttpFeed {
    url: Url,
    client: reqwest::Client,
}

impl HttpFeed {
    /// Build a feed client for `url`.
    ///
    /// # Returns
    ///
    /// `FeedFetch` if the HTTP client cannot be constructed (TLS backend
    /// initialisation failure). Nothing is requested until
    /// [`FeedSource::first_entry_body`] is called.
    pub fn new(url: Url) -> Result<Self, WorkflowError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| WorkflowError::FeedFetch(e.to_string()))?;
        Ok(Self { url, client })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl FeedSource for HttpFeed {
    #[instrument(level = "info", skip_all, fields(url = %self.url))]
    async fn first_entry_body(&self) -> Result<String, WorkflowError> {
        let t0 = Instant::now();
        let response = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| {
                warn!(error = %e, "Feed request failed");
                WorkflowError::FeedFetch(e.to_string())
            })?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| WorkflowError::FeedFetch(e.to_string()))?;

        info!(
            bytes = bytes.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Downloaded feed"
        );
        first_entry_body_from(&bytes)
    }
}

/// Parse an RSS/Atom document and return the newest entry's body.
///
/// The entry summary is preferred, falling back to its full content.
pub fn first_entry_body_from(document: &[u8]) -> Result<String, WorkflowError> {
    let feed =
        feed_rs::parser::parse(document).map_err(|e| WorkflowError::FeedFetch(e.to_string()))?;
    let entry = feed.entries.into_iter().next().ok_or(WorkflowError::FeedEmpty)?;

    let body = entry
        .summary
        .map(|t| t.content)
        .filter(|s| !s.trim().is_empty())
        .or_else(|| entry.content.and_then(|c| c.body))
        .unwrap_or_default();
    Ok(body)
}


#[cfg(test)]
mod tests {
    use super::*;

    const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>AI News</title>
    <link>https://buttondown.com/ainews</link>
    <description>Daily AI news</description>
    <item>
      <title>Issue 2</title>
      <link>https://buttondown.com/ainews/archive/2</link>
      <description>&lt;h3&gt;New model&lt;/h3&gt;&lt;p&gt;It is fast.&lt;/p&gt;&lt;hr /&gt;</description>
    </item>
    <item>
      <title>Issue 1</title>
      <link>https://buttondown.com/ainews/archive/1</link>
      <description>older</description>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn test_first_entry_body_from_rss() {
        let body = first_entry_body_from(RSS.as_bytes()).unwrap();
        assert!(body.contains("<h3>New model</h3>"));
        assert!(body.contains("It is fast."));
        assert!(!body.contains("older"));
    }

    #[test]
    fn test_empty_feed() {
        let rss = r#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>Empty</title><link>https://x.test</link><description>none</description></channel></rss>"#;
        assert_eq!(
            first_entry_body_from(rss.as_bytes()),
            Err(WorkflowError::FeedEmpty)
        );
    }

    #[test]
    fn test_garbage_is_fetch_error() {
        let err = first_entry_body_from(b"this is not xml").unwrap_err();
        assert!(matches!(err, WorkflowError::FeedFetch(_)));
    }

    #[test]
    fn test_feed_pipes_into_extractor() {
        let body = first_entry_body_from(RSS.as_bytes()).unwrap();
        let articles = extract::extract_articles(&body);
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title, "New model");
        assert_eq!(articles[0].body, "It is fast.");
    }

    /// Serve one canned HTTP response on a local port and return its URL.
    async fn serve_once(status: &str, body: &'static str) -> Url {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let head = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/rss+xml\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            body.len()
        );
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            socket.write_all(head.as_bytes()).await.unwrap();
            socket.write_all(body.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });
        Url::parse(&format!("http://{addr}/rss")).unwrap()
    }

    #[tokio::test]
    async fn test_http_feed_downloads_newest_entry() {
        let feed = HttpFeed::new(serve_once("200 OK", RSS).await).unwrap();
        let body = feed.first_entry_body().await.unwrap();
        assert!(body.contains("It is fast."));
    }

    #[tokio::test]
    async fn test_http_error_status_is_fetch_error() {
        let feed = HttpFeed::new(serve_once("404 Not Found", "").await).unwrap();
        let err = feed.first_entry_body().await.unwrap_err();
        assert!(matches!(err, WorkflowError::FeedFetch(_)));
    }

    #[tokio::test]
    async fn test_unreachable_feed_is_fetch_error() {
        let feed = HttpFeed::new(Url::parse("http://127.0.0.1:1/rss").unwrap()).unwrap();
        let err = feed.first_entry_body().await.unwrap_err();
        assert!(matches!(err, WorkflowError::FeedFetch(_)));
    }
}
