//! Transport seam: one POST of a JSON body, returning status and raw body.

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
use reqwest::{
    Client, Url,
    header::{CONTENT_TYPE, HeaderValue},
};
use std::time::Duration;

/// Plain HTTP response as seen by the classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Sends one request attempt. Any `Err` is a transport-level failure;
/// non-success statuses come back as `Ok` and are classified later.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post_json(&self, url: &Url, body: String) -> Result<HttpResponse>;
}

/// `Transport` backed by reqwest.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Builds a client with the crate user agent and a per-attempt timeout.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("email-append/", env!("EMAIL_APPEND_VERSION")))
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }

    /// Wraps an existing reqwest Client.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    #[tracing::instrument(skip_all)]
    async fn post_json(&self, url: &Url, body: String) -> Result<HttpResponse> {
        debug!("POST {} ({} bytes)", url.path(), body.len());

        let response = self
            .client
            .post(url.clone())
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .body(body)
            .send()
            .await
            .context("Failed to send request")?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .context("Failed to read response body")?;

        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn transport() -> ReqwestTransport {
        ReqwestTransport::new(Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_post_json_success() {
        let mut server = mockito::Server::new_async().await;

        let mock = server
            .mock("POST", "/append")
            .match_query(Matcher::UrlEncoded("k2".into(), "abc".into()))
            .match_header("content-type", "application/json")
            .match_body(Matcher::JsonString(r#"{"a":1}"#.to_string()))
            .with_status(200)
            .with_body(r#"{"num-results": 0}"#)
            .create_async()
            .await;

        let url = Url::parse(&format!("{}/append?k2=abc", server.url())).unwrap();
        let response = transport()
            .post_json(&url, r#"{"a":1}"#.to_string())
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response, HttpResponse::new(200, r#"{"num-results": 0}"#));
    }

    #[tokio::test]
    async fn test_post_json_error_status_is_not_a_transport_failure() {
        let mut server = mockito::Server::new_async().await;

        let mock = server
            .mock("POST", "/append")
            .with_status(404)
            .with_body("missing")
            .create_async()
            .await;

        let url = Url::parse(&format!("{}/append", server.url())).unwrap();
        let response = transport().post_json(&url, "{}".to_string()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(response.status, 404);
        assert_eq!(response.body, "missing");
    }

    #[tokio::test]
    async fn test_post_json_sends_user_agent() {
        let mut server = mockito::Server::new_async().await;

        let mock = server
            .mock("POST", "/")
            .match_header("user-agent", Matcher::Regex("^email-append/".to_string()))
            .with_status(201)
            .create_async()
            .await;

        let url = Url::parse(&server.url()).unwrap();
        let response = transport().post_json(&url, "{}".to_string()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(response.status, 201);
    }

    #[tokio::test]
    async fn test_from_client_keeps_custom_headers() {
        let mut server = mockito::Server::new_async().await;

        let mock = server
            .mock("POST", "/append")
            .match_header("x-request-source", "batch")
            .match_header("content-type", "application/json")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("x-request-source", HeaderValue::from_static("batch"));
        let client = Client::builder().default_headers(headers).build().unwrap();

        let url = Url::parse(&format!("{}/append", server.url())).unwrap();
        let response = ReqwestTransport::from_client(client)
            .post_json(&url, "{}".to_string())
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response, HttpResponse::new(200, "{}"));
    }

    #[tokio::test]
    async fn test_post_json_connection_refused() {
        // Nothing listens on port 1
        let url = Url::parse("http://127.0.0.1:1/append").unwrap();
        let result = transport().post_json(&url, "{}".to_string()).await;
        assert!(result.is_err());
    }
}
