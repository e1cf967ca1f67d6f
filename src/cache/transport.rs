use std::path::Path;

use async_trait::async_trait;
use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use url::Url;

use crate::error::{CardError, Result};

/// Transfer seam between the fetch worker and the network.
///
/// Implementations stream the body of `url` into `dest`, creating or
/// truncating that file. Partial output on failure is fine: the worker
/// points `dest` at a temp path and renames only on `Ok`.
#[async_trait]
pub trait ContentTransport: Send + Sync {
    async fn fetch(&self, url: &Url, dest: &Path) -> Result<()>;
}

/// HTTP transport backed by a shared `reqwest` client.
///
/// The client carries no request timeout. Card media can be large and
/// slow links are expected, so a hung transfer is only ever abandoned by
/// stopping the cache.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .build()
            .expect("Failed to create HTTP client");
        Self { client }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentTransport for HttpTransport {
    async fn fetch(&self, url: &Url, dest: &Path) -> Result<()> {
        let response =
            self.client.get(url.as_str()).send().await.map_err(|e| {
                CardError::Fetch(format!("request to {url} failed: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CardError::Fetch(format!("HTTP {status} from {url}")));
        }

        let mut file = tokio::fs::File::create(dest).await?;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| {
                CardError::Fetch(format!("body stream from {url} failed: {e}"))
            })?;
            file.write_all(&chunk).await?;
        }
        file.flush().await?;

        Ok(())
    }
}
