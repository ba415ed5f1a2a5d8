//! HTTP client shared foundation
//!
//! A thin wrapper over reqwest that issues single GET requests with
//! optional headers. Transport failures, non-2xx statuses, and body
//! decode failures are surfaced as distinct FetchError variants.
//! Per-dependency callers turn these into skipped results; there is no
//! retry policy at this layer.

use crate::error::FetchError;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Default timeout for HTTP requests (30 seconds)
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default User-Agent header
const DEFAULT_USER_AGENT: &str = concat!("pkgscout/", env!("CARGO_PKG_VERSION"));

/// HTTP client wrapper
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Creates a new HTTP client with default settings
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_config(DEFAULT_TIMEOUT, DEFAULT_USER_AGENT)
    }

    /// Creates a new HTTP client with custom configuration
    pub fn with_config(timeout: Duration, user_agent: &str) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }

    /// Performs a GET request and returns the raw body bytes
    pub async fn get_bytes(
        &self,
        url: &str,
        headers: &[(&str, &str)],
    ) -> Result<Vec<u8>, FetchError> {
        debug!(url, "fetching");

        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let response = request.send().await.map_err(|source| FetchError::Transport {
            url: url.to_string(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|source| FetchError::Transport {
            url: url.to_string(),
            source,
        })?;

        Ok(body.to_vec())
    }

    /// Performs a GET request and decodes the body as JSON
    pub async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        headers: &[(&str, &str)],
    ) -> Result<T, FetchError> {
        let body = self.get_bytes(url, headers).await?;
        serde_json::from_slice(&body).map_err(|e| FetchError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    #[test]
    fn test_client_creation() {
        assert!(HttpClient::new().is_ok());
    }

    #[test]
    fn test_client_with_config() {
        let client = HttpClient::with_config(Duration::from_secs(60), "test-agent/1.0");
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn test_get_json_success() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/ok")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"version": "1.2.3"}"#)
            .create_async()
            .await;

        #[derive(serde::Deserialize)]
        struct Payload {
            version: String,
        }

        let client = HttpClient::new().unwrap();
        let payload: Payload = client
            .get_json(&format!("{}/ok", server.url()), &[])
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(payload.version, "1.2.3");
    }

    #[tokio::test]
    async fn test_get_surfaces_status_code() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/missing")
            .with_status(404)
            .create_async()
            .await;

        let client = HttpClient::new().unwrap();
        let err = client
            .get_bytes(&format!("{}/missing", server.url()), &[])
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(404));
    }

    #[tokio::test]
    async fn test_get_json_decode_failure() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/garbled")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let client = HttpClient::new().unwrap();
        let result: Result<serde_json::Value, _> = client
            .get_json(&format!("{}/garbled", server.url()), &[])
            .await;

        assert!(matches!(result, Err(FetchError::Decode { .. })));
    }

    #[tokio::test]
    async fn test_custom_headers_forwarded() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/releases")
            .match_header("accept", "application/vnd.github.v3+json")
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let client = HttpClient::new().unwrap();
        client
            .get_bytes(
                &format!("{}/releases", server.url()),
                &[("Accept", "application/vnd.github.v3+json")],
            )
            .await
            .unwrap();

        mock.assert_async().await;
    }
}
