use crate::error::{ApiError, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Thin JSON-over-HTTP wrapper rooted at `<base_url>/api`.
///
/// Every call is a single attempt: no retry, no timeout, no caching.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder().default_headers(headers).build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, common::API_PREFIX, path)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let request = self.http.request(Method::GET, self.url(path));
        self.send(path, request).await
    }

    /// POST with optional query pairs (URL-encoded by reqwest) and optional JSON body.
    pub async fn post<B, T>(&self, path: &str, query: &[(&str, &str)], body: Option<&B>) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut request = self.http.request(Method::POST, self.url(path));
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        self.send(path, request).await
    }

    async fn send<T: DeserializeOwned>(&self, path: &str, request: RequestBuilder) -> Result<T> {
        log::debug!("-> {}", path);

        let response = request.send().await.map_err(|e| {
            log::warn!("Request to {} failed: {}", path, e);
            ApiError::Transport(e)
        })?;

        let status = response.status();
        let body = response.text().await?;
        log::debug!("<- {} {}", path, status);

        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound { path: path.to_string() });
        }

        if !status.is_success() {
            log::warn!("{} returned {}: {}", path, status, body);
            return Err(ApiError::Http {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(ApiError::Decode)
    }
}
