//! HTTP access for the catalog and the artifact cache.
//!
//! All network traffic of the engine goes through the [`HttpFetcher`] trait so
//! that tests can substitute an in-memory implementation. The production
//! implementation, [`ReqwestFetcher`], wraps a `reqwest` client.

use crate::error::FetchError;
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Upper bound on the buffer reserved from an announced `Content-Length`.
const MAX_PREALLOCATION: u64 = 1 << 20;

/// A body being received chunk by chunk.
#[async_trait]
pub trait ByteStream: Send {
    /// Total body length announced by the server, when known.
    fn content_length(&self) -> Option<u64>;

    /// Returns the next chunk, or `None` once the body is complete.
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, FetchError>;
}

/// Minimal HTTP GET capability used by the engine.
#[async_trait]
pub trait HttpFetcher: Send + Sync {
    /// Issues a GET request and returns the body as a stream.
    ///
    /// Implementations must fail with [`FetchError::Status`] on non-success
    /// responses instead of streaming an error page.
    async fn open(&self, url: &str) -> Result<Box<dyn ByteStream>, FetchError>;

    /// Issues a GET request and buffers the whole body.
    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let mut stream = self.open(url).await?;
        let announced = stream.content_length().unwrap_or(0).min(MAX_PREALLOCATION);
        let mut body = Vec::with_capacity(announced as usize);
        while let Some(chunk) = stream.next_chunk().await? {
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }
}

/// [`HttpFetcher`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: reqwest::Client,
}

impl ReqwestFetcher {
    /// Builds a client with the given connect and whole-request timeouts.
    pub fn new(connect_timeout: Duration, request_timeout: Option<Duration>) -> Result<Self, FetchError> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .user_agent(concat!("hearth/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|error| FetchError::Request {
                url: String::new(),
                message: error.to_string(),
            })?;

        Ok(Self { client })
    }
}

struct ReqwestStream {
    url: String,
    response: reqwest::Response,
}

#[async_trait]
impl ByteStream for ReqwestStream {
    fn content_length(&self) -> Option<u64> {
        self.response.content_length()
    }

    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, FetchError> {
        let chunk = self
            .response
            .chunk()
            .await
            .map_err(|error| FetchError::Request {
                url: self.url.clone(),
                message: error.to_string(),
            })?;
        Ok(chunk.map(|bytes| bytes.to_vec()))
    }
}

#[async_trait]
impl HttpFetcher for ReqwestFetcher {
    async fn open(&self, url: &str) -> Result<Box<dyn ByteStream>, FetchError> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|error| FetchError::Request {
                url: url.to_string(),
                message: error.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(Box::new(ReqwestStream {
            url: url.to_string(),
            response,
        }))
    }
}
