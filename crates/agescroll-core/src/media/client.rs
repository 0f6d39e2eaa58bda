use std::path::PathBuf;
use std::time::Duration;

use bytes::Bytes;
use reqwest::header::{HeaderValue, ACCEPT};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use url::Url;

use super::models::{ImageListing, MediaCatalog, PhotoId, UploadReceipt};
use super::store::MediaStore;
use crate::config::StoreConfig;
use crate::{Error, Result};

const LIST_PATH: &str = "processed-images/";
const UPLOAD_PATH: &str = "upload-images/";
const IMAGE_PATH: &str = "image/";
const UPLOAD_FIELD: &str = "files";
const MAX_PHOTO_BYTES: usize = 20 * 1024 * 1024;
const INITIAL_RETRY_DELAY_MS: u64 = 200;

/// HTTP binding of the image store API
pub struct HttpMediaStore {
    client: Client,
    base: Url,
    max_retries: u32,
}

impl HttpMediaStore {
    /// Create a store client from configuration
    pub fn new(config: &StoreConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .build()
            .map_err(Error::Http)?;

        Ok(Self {
            client,
            base: Self::normalize_base(&config.base_url)?,
            max_retries: config.max_retries,
        })
    }

    /// Parse the base URL so relative joins append instead of replacing the last segment
    fn normalize_base(base_url: &str) -> Result<Url> {
        let mut base = Url::parse(base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(base)
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn photo_url(&self, id: &PhotoId) -> Result<Url> {
        let mut url = self.base.join(IMAGE_PATH)?;
        url.path_segments_mut()
            .map_err(|_| Error::Config(format!("Base URL cannot hold a path: {}", self.base)))?
            .pop_if_empty()
            .push(id.as_str());
        Ok(url)
    }

    /// Send a request, retrying 429/503 with exponential backoff
    async fn send_with_retry<F>(&self, build: F) -> Result<Response>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut delay_ms = INITIAL_RETRY_DELAY_MS;
        let mut attempt = 0;

        loop {
            let response = build()
                .send()
                .await
                .map_err(|e| Error::StoreUnavailable(e.to_string()))?;
            let status = response.status();

            let retryable = status == StatusCode::TOO_MANY_REQUESTS
                || status == StatusCode::SERVICE_UNAVAILABLE;
            if !retryable || attempt >= self.max_retries {
                return Ok(response);
            }

            attempt += 1;
            tracing::warn!(
                status = %status,
                attempt,
                max_retries = self.max_retries,
                delay_ms,
                "Media store busy, retrying"
            );
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            delay_ms *= 2;
        }
    }

    fn unavailable(status: StatusCode, url: &Url) -> Error {
        Error::StoreUnavailable(format!("HTTP {} for URL: {}", status, url))
    }
}

#[async_trait::async_trait]
impl MediaStore for HttpMediaStore {
    async fn list_photos(&self) -> Result<MediaCatalog> {
        let url = self.base.join(LIST_PATH)?;
        tracing::debug!("Listing photos from: {}", url);

        let response = self
            .send_with_retry(|| {
                self.client
                    .get(url.clone())
                    .header(ACCEPT, HeaderValue::from_static("application/json"))
            })
            .await?;

        if !response.status().is_success() {
            return Err(Self::unavailable(response.status(), &url));
        }

        let listing: ImageListing = response
            .json()
            .await
            .map_err(|e| Error::StoreUnavailable(format!("Malformed listing: {}", e)))?;

        let catalog = MediaCatalog::new(listing.images);
        tracing::info!(photos = catalog.len(), "Catalog listed");
        Ok(catalog)
    }

    async fn upload_photos(&self, files: &[PathBuf]) -> Result<UploadReceipt> {
        let url = self.base.join(UPLOAD_PATH)?;

        let mut form = Form::new();
        for path in files {
            let data = tokio::fs::read(path).await?;
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .ok_or_else(|| Error::Other(format!("Not a file: {}", path.display())))?;
            form = form.part(UPLOAD_FIELD, Part::bytes(data).file_name(file_name));
        }

        tracing::info!(files = files.len(), "Uploading photos to: {}", url);

        // Multipart bodies are consumed on send, so uploads are not retried
        let response = self
            .client
            .post(url.clone())
            .multipart(form)
            .send()
            .await
            .map_err(|e| Error::StoreUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::unavailable(response.status(), &url));
        }

        Ok(response.json().await?)
    }

    async fn fetch_photo(&self, id: &PhotoId) -> Result<Bytes> {
        let url = self.photo_url(id)?;

        let response = self.send_with_retry(|| self.client.get(url.clone())).await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(Error::NotFound(id.to_string()));
        }
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            // The store reports a missing file as a 500 whose detail names the 404
            let body = response.text().await.unwrap_or_default();
            if body.to_ascii_lowercase().contains("not found") {
                return Err(Error::NotFound(id.to_string()));
            }
            return Err(Self::unavailable(status, &url));
        }
        if !status.is_success() {
            return Err(Self::unavailable(status, &url));
        }

        let bytes = response.bytes().await?;
        if bytes.len() > MAX_PHOTO_BYTES {
            return Err(Error::Other(format!(
                "Photo too large ({} bytes): {}",
                bytes.len(),
                id
            )));
        }
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn store_for(server: &mockito::ServerGuard, max_retries: u32) -> HttpMediaStore {
        HttpMediaStore::new(&StoreConfig {
            base_url: server.url(),
            request_timeout_secs: 5,
            max_retries,
        })
        .unwrap()
    }

    #[test]
    fn test_base_url_keeps_prefix() {
        let store = HttpMediaStore::new(&StoreConfig {
            base_url: "http://example.com/api".to_string(),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(store.base_url().as_str(), "http://example.com/api/");
        let url = store.photo_url(&PhotoId::from("processed me.jpg")).unwrap();
        assert_eq!(url.as_str(), "http://example.com/api/image/processed%20me.jpg");
    }

    #[tokio::test]
    async fn list_photos_preserves_order() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/processed-images/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"images":["processed_1995.jpg","processed_1990.jpg"]}"#)
            .create_async()
            .await;

        let catalog = store_for(&server, 0).list_photos().await.unwrap();
        let ids: Vec<&str> = catalog.iter().map(PhotoId::as_str).collect();
        assert_eq!(ids, vec!["processed_1995.jpg", "processed_1990.jpg"]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn list_photos_server_error_is_store_unavailable() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/processed-images/")
            .with_status(500)
            .create_async()
            .await;

        let err = store_for(&server, 0).list_photos().await.unwrap_err();
        assert!(matches!(err, Error::StoreUnavailable(_)));
    }

    #[tokio::test]
    async fn list_photos_retries_busy_store() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/processed-images/")
            .with_status(503)
            .expect(2)
            .create_async()
            .await;

        let err = store_for(&server, 1).list_photos().await.unwrap_err();
        assert!(matches!(err, Error::StoreUnavailable(_)));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn list_photos_unreachable_store() {
        let store = HttpMediaStore::new(&StoreConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            request_timeout_secs: 2,
            max_retries: 0,
        })
        .unwrap();

        let err = store.list_photos().await.unwrap_err();
        assert!(matches!(err, Error::StoreUnavailable(_)));
    }

    #[tokio::test]
    async fn fetch_photo_returns_bytes() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/image/processed_a.jpg")
            .with_status(200)
            .with_header("content-type", "image/jpeg")
            .with_body([0xFF, 0xD8, 0xFF])
            .create_async()
            .await;

        let bytes = store_for(&server, 0)
            .fetch_photo(&PhotoId::from("processed_a.jpg"))
            .await
            .unwrap();
        assert_eq!(bytes.as_ref(), &[0xFF, 0xD8, 0xFF]);
    }

    #[tokio::test]
    async fn fetch_photo_missing_is_not_found() {
        let mut server = mockito::Server::new_async().await;
        let _missing = server
            .mock("GET", "/image/gone.jpg")
            .with_status(404)
            .create_async()
            .await;
        let _wrapped = server
            .mock("GET", "/image/wrapped.jpg")
            .with_status(500)
            .with_body(r#"{"detail":"404: Image not found"}"#)
            .create_async()
            .await;

        let store = store_for(&server, 0);
        assert!(matches!(
            store.fetch_photo(&PhotoId::from("gone.jpg")).await,
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            store.fetch_photo(&PhotoId::from("wrapped.jpg")).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn upload_photos_sends_multipart_files() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("a.jpg");
        let second = dir.path().join("b.jpg");
        std::fs::write(&first, b"aaa").unwrap();
        std::fs::write(&second, b"bbb").unwrap();

        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/upload-images/")
            .match_header(
                "content-type",
                Matcher::Regex("multipart/form-data".to_string()),
            )
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex(r#"name="files"; filename="a.jpg""#.to_string()),
                Matcher::Regex(r#"name="files"; filename="b.jpg""#.to_string()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"message":"Successfully uploaded and processed 2 images"}"#)
            .create_async()
            .await;

        let receipt = store_for(&server, 0)
            .upload_photos(&[first, second])
            .await
            .unwrap();
        assert!(receipt.message.contains("2 images"));
        mock.assert_async().await;
    }
}
