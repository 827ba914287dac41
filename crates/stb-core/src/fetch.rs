use std::{path::Path, time::Duration};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::{errors::Error, ports::FileFetcher, Result};

/// `FileFetcher` over plain HTTP GET. The body is streamed to disk chunk by
/// chunk; nothing is buffered in memory beyond one chunk.
#[derive(Clone, Debug)]
pub struct HttpFileFetcher {
    http: reqwest::Client,
}

impl HttpFileFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("http client build failed: {e}")))?;
        Ok(Self { http })
    }

    async fn stream_to(&self, url: &str, destination: &Path) -> Result<()> {
        let mut resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Transfer(format!("request to {url} failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(Error::Transfer(format!("{url} answered {}", resp.status())));
        }

        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::File::create(destination).await?;
        while let Some(chunk) = resp
            .chunk()
            .await
            .map_err(|e| Error::Transfer(format!("reading body of {url} failed: {e}")))?
        {
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl FileFetcher for HttpFileFetcher {
    async fn fetch(&self, url: &str, destination: &Path) -> Result<()> {
        let out = self.stream_to(url, destination).await;
        if out.is_err() {
            // Best-effort: don't leave a truncated file behind.
            let _ = tokio::fs::remove_file(destination).await;
        }
        out
    }
}
