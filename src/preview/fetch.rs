//! Byte sources for preview requests
//!
//! Every fetch is bounded: a fetcher refuses payloads larger than the limit it
//! is given, before reading them where the length is known up front.

use super::error::FetchError;
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tracing::debug;
use url::Url;

/// Something that can turn a source URL into bytes
///
/// A fetch is attempted once; implementations must not retry.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch the full content behind `source`, at most `max_size` bytes
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::TooLarge`] once the payload is known to exceed
    /// `max_size`, or another [`FetchError`] on any transport, status or I/O
    /// failure.
    async fn fetch(&self, source: &str, max_size: u64) -> Result<Vec<u8>, FetchError>;
}

/// HTTP(S) fetcher backed by a shared `reqwest` client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Build a client with the given user agent and optional timeout
    ///
    /// Without a timeout the transport's own limits apply.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Transport`] if the client cannot be built.
    pub fn new(user_agent: &str, timeout: Option<Duration>) -> Result<Self, FetchError> {
        let mut builder = reqwest::Client::builder().user_agent(user_agent);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }

    #[must_use]
    pub const fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

/// Read a response body, refusing it on `Content-Length` or once the streamed
/// length passes `max_size`
async fn read_body_with_limit(
    response: &mut reqwest::Response,
    max_size: u64,
) -> Result<Vec<u8>, FetchError> {
    if let Some(size) = response.content_length()
        && size > max_size
    {
        return Err(FetchError::TooLarge { size, max: max_size });
    }

    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        let size = (body.len() + chunk.len()) as u64;
        if size > max_size {
            return Err(FetchError::TooLarge { size, max: max_size });
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, source: &str, max_size: u64) -> Result<Vec<u8>, FetchError> {
        debug!(source, "fetching over http");
        let mut response = self.client.get(source).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        read_body_with_limit(&mut response, max_size).await
    }
}

/// Local file fetcher accepting plain paths and `file://` URLs
#[derive(Debug, Clone, Copy, Default)]
pub struct FileFetcher;

impl FileFetcher {
    /// Resolve a source string to a filesystem path
    ///
    /// `file://` URLs are percent-decoded; plain paths are taken as-is.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidSource`] for empty sources, non-file URL
    /// schemes and `file://` URLs that name a remote host.
    pub fn resolve(source: &str) -> Result<PathBuf, FetchError> {
        let invalid = || FetchError::InvalidSource(source.to_string());
        if source.starts_with("file://") {
            return Url::parse(source)
                .map_err(|_| invalid())?
                .to_file_path()
                .map_err(|()| invalid());
        }
        if source.is_empty() || source.contains("://") {
            return Err(invalid());
        }
        Ok(PathBuf::from(source))
    }
}

#[async_trait]
impl Fetcher for FileFetcher {
    async fn fetch(&self, source: &str, max_size: u64) -> Result<Vec<u8>, FetchError> {
        let path = Self::resolve(source)?;
        debug!(path = %path.display(), "reading local file");

        let size = tokio::fs::metadata(&path).await?.len();
        if size > max_size {
            return Err(FetchError::TooLarge { size, max: max_size });
        }

        // The file may grow between the metadata check and the read
        let file = tokio::fs::File::open(&path).await?;
        let mut bytes = Vec::new();
        file.take(max_size.saturating_add(1))
            .read_to_end(&mut bytes)
            .await?;
        let size = bytes.len() as u64;
        if size > max_size {
            return Err(FetchError::TooLarge { size, max: max_size });
        }
        Ok(bytes)
    }
}

/// Routes `http://` and `https://` sources to HTTP, everything else to disk
#[derive(Debug, Clone)]
pub struct SourceFetcher {
    http: HttpFetcher,
    file: FileFetcher,
}

impl SourceFetcher {
    #[must_use]
    pub const fn new(http: HttpFetcher) -> Self {
        Self {
            http,
            file: FileFetcher,
        }
    }

    /// Whether `source` would be fetched over the network
    #[must_use]
    pub fn is_remote(source: &str) -> bool {
        let lower = source.trim_start().to_ascii_lowercase();
        lower.starts_with("http://") || lower.starts_with("https://")
    }
}

#[async_trait]
impl Fetcher for SourceFetcher {
    async fn fetch(&self, source: &str, max_size: u64) -> Result<Vec<u8>, FetchError> {
        if Self::is_remote(source) {
            self.http.fetch(source, max_size).await
        } else {
            self.file.fetch(source, max_size).await
        }
    }
}
