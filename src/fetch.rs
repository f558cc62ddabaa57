use std::future::Future;

use anyhow::{Context, Result};
use reqwest::StatusCode;
use scraper::Html;
use tracing::debug;

use crate::config::Settings;
use crate::error::FetchError;

/// One GET per call, no retry and no caching.
pub trait PageFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Html, FetchError>> + Send;
}

pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout())
            .user_agent(&settings.user_agent)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self { client })
    }
}

impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Html, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;
        debug!(url, bytes = body.len(), "fetched");
        Ok(Html::parse_document(&body))
    }
}
