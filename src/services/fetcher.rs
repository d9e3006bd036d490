// src/services/fetcher.rs

//! HTTP fetcher.
//!
//! Every request goes through one shared client. Failures come back as a
//! classified [`FetchError`]; deciding whether a failure is fatal is left to
//! the caller.

use reqwest::header::{ACCEPT, REFERER};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::error::{FetchError, Result};
use crate::models::Config;
use crate::utils::http::create_async_client;

/// Shared HTTP access for a scrape run.
#[derive(Clone)]
pub struct Fetcher {
    client: Client,
    referer: String,
    image_accept: String,
}

impl Fetcher {
    /// Build a fetcher from configuration.
    pub fn new(config: &Config) -> Result<Self> {
        let client = create_async_client(&config.http)?;
        Ok(Self::with_client(
            client,
            &config.source.page_url,
            &config.http.image_accept,
        ))
    }

    /// Build a fetcher around an existing client.
    pub fn with_client(client: Client, referer: &str, image_accept: &str) -> Self {
        Self {
            client,
            referer: referer.to_string(),
            image_accept: image_accept.to_string(),
        }
    }

    /// Fetch a page or API body as text.
    pub async fn get_text(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> std::result::Result<String, FetchError> {
        let response = self.send(self.client.get(url).query(query), url).await?;
        Self::read_text(response, url).await
    }

    /// Fetch a per-title detail page. Carries the lineup page as referer.
    pub async fn get_detail(&self, url: &str) -> std::result::Result<String, FetchError> {
        let request = self.client.get(url).header(REFERER, &self.referer);
        let response = self.send(request, url).await?;
        Self::read_text(response, url).await
    }

    /// Fetch and decode a JSON document.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> std::result::Result<T, FetchError> {
        let body = self.get_text(url, query).await?;
        serde_json::from_str(&body).map_err(|e| FetchError::Decode {
            url: url.to_string(),
            cause: e.to_string(),
        })
    }

    /// Fetch image bytes.
    ///
    /// Only an exact 200 with a non-empty body counts as success.
    pub async fn get_image(&self, url: &str) -> std::result::Result<Vec<u8>, FetchError> {
        let request = self
            .client
            .get(url)
            .header(REFERER, &self.referer)
            .header(ACCEPT, &self.image_accept);
        let response = self.send(request, url).await?;
        if response.status() != StatusCode::OK {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::from_reqwest(url, &e))?;
        if bytes.is_empty() {
            return Err(FetchError::Decode {
                url: url.to_string(),
                cause: "empty body".to_string(),
            });
        }
        Ok(bytes.to_vec())
    }

    async fn send(
        &self,
        request: RequestBuilder,
        url: &str,
    ) -> std::result::Result<Response, FetchError> {
        let response = request
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, &e))?;

        let status = response.status();
        if !status.is_success() {
            log::debug!("HTTP {} from {}", status.as_u16(), url);
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    async fn read_text(response: Response, url: &str) -> std::result::Result<String, FetchError> {
        response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(url, &e))
    }
}
