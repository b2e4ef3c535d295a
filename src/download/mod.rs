use anyhow::{Context, Result};
use async_trait::async_trait;
use log::info;
use std::path::Path;

use crate::error::InstallError;
use crate::http::{HttpClient, NonRetryableError};
use crate::runtime::Runtime;

/// Fetches a release archive onto disk.
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Download `url` into `dest`, returning the number of bytes written.
    ///
    /// Transport failures surface as [`InstallError::Network`].
    async fn download(&self, runtime: &dyn Runtime, url: &str, dest: &Path) -> Result<u64>;
}

/// Downloader backed by the retrying [`HttpClient`].
pub struct HttpDownloader {
    http_client: HttpClient,
}

impl HttpDownloader {
    pub fn new(http_client: HttpClient) -> Self {
        Self { http_client }
    }

    pub fn http_client(&self) -> &HttpClient {
        &self.http_client
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    #[tracing::instrument(skip(self, runtime, dest))]
    async fn download(&self, runtime: &dyn Runtime, url: &str, dest: &Path) -> Result<u64> {
        info!("Downloading {}...", url);

        let dest = dest.to_path_buf();
        let bytes = self
            .http_client
            .download_file(url, || {
                runtime
                    .create_file(&dest)
                    .with_context(|| format!("Failed to create download file at {:?}", dest))
            })
            .await
            .map_err(|e| {
                if is_transport_error(&e) {
                    InstallError::Network {
                        url: url.to_string(),
                        reason: format!("{:#}", e),
                    }
                    .into()
                } else {
                    e
                }
            })?;

        info!("Download complete ({} bytes).", bytes);
        Ok(bytes)
    }
}

fn is_transport_error(e: &anyhow::Error) -> bool {
    e.chain()
        .any(|cause| cause.is::<reqwest::Error>() || cause.is::<NonRetryableError>())
}
