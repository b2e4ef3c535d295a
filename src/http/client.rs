//! HTTP client with built-in retry logic and error handling.

use anyhow::{Context, Result};
use log::{debug, warn};
use reqwest::Client;
use std::io::Write;
use std::time::Duration;

use super::retry::{
    LocalWriteError, MAX_RETRIES, RETRY_DELAY_MS, check_retryable, is_retryable,
};

/// HTTP client with built-in retry logic for downloads.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    retry_delay: Duration,
}

impl HttpClient {
    /// Creates a new HTTP client wrapping the given reqwest Client.
    pub fn new(client: Client) -> Self {
        Self {
            client,
            retry_delay: Duration::from_millis(RETRY_DELAY_MS),
        }
    }

    /// Overrides the pause between attempts.
    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Returns a reference to the underlying reqwest Client.
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Streams the body at `url` into a writer created per attempt.
    ///
    /// Transient failures are retried up to [`MAX_RETRIES`] times; each
    /// attempt calls `create_writer` again so a retry never appends to a
    /// partial body. Returns the number of bytes written.
    #[tracing::instrument(skip(self, create_writer))]
    pub async fn download_file<W, F>(&self, url: &str, create_writer: F) -> Result<u64>
    where
        W: Write,
        F: Fn() -> Result<W>,
    {
        debug!("Downloading file from {}...", url);
        self.with_retry("Download", || self.download_file_once(url, &create_writer))
            .await
    }

    /// Single download attempt without retry.
    async fn download_file_once<W, F>(&self, url: &str, create_writer: &F) -> Result<u64>
    where
        W: Write,
        F: Fn() -> Result<W>,
    {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to start download request")?;

        let mut response = response.error_for_status().map_err(check_retryable)?;

        let mut writer = create_writer()
            .map_err(|e| e.context(LocalWriteError("Failed to create download destination")))?;
        let mut downloaded_bytes: u64 = 0;

        while let Some(chunk) = response
            .chunk()
            .await
            .context("Failed to read chunk from download stream")?
        {
            writer
                .write_all(&chunk)
                .context(LocalWriteError("Failed to write chunk to file"))?;
            downloaded_bytes += chunk.len() as u64;
        }
        writer
            .flush()
            .context(LocalWriteError("Failed to flush downloaded file"))?;

        debug!(
            "Downloaded {:.2} MB",
            downloaded_bytes as f64 / (1024.0 * 1024.0)
        );

        Ok(downloaded_bytes)
    }

    /// Executes an async operation with retry logic.
    async fn with_retry<F, Fut, T>(&self, operation_name: &str, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let mut attempt = 1;
        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if !is_retryable(&e) => {
                    debug!("{}: non-retryable error: {}", operation_name, e);
                    return Err(e);
                }
                Err(e) if attempt >= MAX_RETRIES => {
                    return Err(e.context(format!(
                        "{} failed after {} attempts",
                        operation_name, MAX_RETRIES
                    )));
                }
                Err(e) => {
                    warn!(
                        "{}: attempt {}/{} failed ({:#}), retrying in {}ms...",
                        operation_name,
                        attempt,
                        MAX_RETRIES,
                        e,
                        self.retry_delay.as_millis()
                    );
                    tokio::time::sleep(self.retry_delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::NonRetryableError;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fast_client() -> HttpClient {
        HttpClient::new(Client::new()).with_retry_delay(Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_download_file_success() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let mock = server
            .mock("GET", "/file.tar.gz")
            .with_status(200)
            .with_body("test content")
            .create_async()
            .await;

        let client = fast_client();
        let bytes = client
            .download_file(&format!("{}/file.tar.gz", url), || Ok(std::io::sink()))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(bytes, 12); // "test content" is 12 bytes
    }

    #[tokio::test]
    async fn test_download_file_not_found_is_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let mock = server
            .mock("GET", "/file.tar.gz")
            .with_status(404)
            .expect(1)
            .create_async()
            .await;

        let client = fast_client();
        let result = client
            .download_file(&format!("{}/file.tar.gz", url), || Ok(std::io::sink()))
            .await;

        mock.assert_async().await;
        let err = result.unwrap_err();
        assert!(err.downcast_ref::<NonRetryableError>().is_some());
    }

    #[tokio::test]
    async fn test_download_file_server_error_exhausts_retries() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let mock = server
            .mock("GET", "/file.tar.gz")
            .with_status(500)
            .expect(MAX_RETRIES)
            .create_async()
            .await;

        let client = fast_client();
        let result = client
            .download_file(&format!("{}/file.tar.gz", url), || Ok(std::io::sink()))
            .await;

        mock.assert_async().await;
        let err = result.unwrap_err();
        assert!(err.to_string().contains("failed after 3 attempts"));
    }

    #[tokio::test]
    async fn test_download_file_writer_failure_is_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let mock = server
            .mock("GET", "/file.tar.gz")
            .with_status(200)
            .with_body("test content")
            .expect(1)
            .create_async()
            .await;

        let client = fast_client();
        let result = client
            .download_file(&format!("{}/file.tar.gz", url), || {
                Err::<std::io::Sink, _>(anyhow::anyhow!("Read-only file system"))
            })
            .await;

        mock.assert_async().await;
        let err = result.unwrap_err();
        assert!(err.downcast_ref::<LocalWriteError>().is_some());
        assert!(format!("{:#}", err).contains("Read-only file system"));
        assert!(!err.to_string().contains("failed after"));
    }

    #[tokio::test]
    async fn test_download_file_write_error_is_not_retried() {
        struct FullDisk;

        impl Write for FullDisk {
            fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::from(std::io::ErrorKind::StorageFull))
            }

            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let mock = server
            .mock("GET", "/file.tar.gz")
            .with_status(200)
            .with_body("test content")
            .expect(1)
            .create_async()
            .await;

        let created = Arc::new(AtomicUsize::new(0));
        let created_clone = Arc::clone(&created);
        let client = fast_client();
        let result = client
            .download_file(&format!("{}/file.tar.gz", url), || {
                created_clone.fetch_add(1, Ordering::SeqCst);
                Ok(FullDisk)
            })
            .await;

        mock.assert_async().await;
        assert_eq!(created.load(Ordering::SeqCst), 1);
        assert_eq!(
            result.unwrap_err().downcast_ref::<LocalWriteError>(),
            Some(&LocalWriteError("Failed to write chunk to file"))
        );
    }

    #[tokio::test]
    async fn test_with_retry_success() {
        let client = fast_client();
        let result = client
            .with_retry("test", || async { Ok::<_, anyhow::Error>("success") })
            .await;
        assert_eq!(result.unwrap(), "success");
    }

    #[tokio::test]
    async fn test_with_retry_immediate_failure_on_non_retryable() {
        let client = fast_client();
        let call_count = Arc::new(AtomicUsize::new(0));
        let call_count_clone = call_count.clone();

        let result = client
            .with_retry("test", || {
                let count = call_count_clone.clone();
                async move {
                    count.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>(anyhow::Error::from(NonRetryableError::NotFound(
                        "not found".to_string(),
                    )))
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_with_retry_retries_on_network_error() {
        let client = fast_client();
        let call_count = Arc::new(AtomicUsize::new(0));
        let call_count_clone = call_count.clone();

        let result = client
            .with_retry("test", || {
                let count = call_count_clone.clone();
                async move {
                    let current = count.fetch_add(1, Ordering::SeqCst);
                    if current < 2 {
                        Err::<&str, _>(anyhow::anyhow!("connection reset"))
                    } else {
                        Ok("success after retries")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "success after retries");
        assert_eq!(call_count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_with_retry_exhausts_retries() {
        let client = fast_client();
        let call_count = Arc::new(AtomicUsize::new(0));
        let call_count_clone = call_count.clone();

        let result = client
            .with_retry("test", || {
                let count = call_count_clone.clone();
                async move {
                    count.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>(anyhow::anyhow!("connection timeout"))
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(call_count.load(Ordering::SeqCst), MAX_RETRIES);
    }
}
