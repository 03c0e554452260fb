//! Downstream webhook notification.

use std::time::Duration;

use async_trait::async_trait;
use coastwatch_pipeline::{RenderSync, SyncError};

const SYNC_TIMEOUT: Duration = Duration::from_secs(30);

/// [`RenderSync`] implementation that POSTs to a deploy/refresh webhook.
pub struct WebhookSync {
    client: reqwest::Client,
    url: String,
}

impl WebhookSync {
    /// Creates a webhook sync for the given URL.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError`] if the HTTP client cannot be built.
    pub fn new(url: impl Into<String>) -> Result<Self, SyncError> {
        let client = reqwest::Client::builder()
            .timeout(SYNC_TIMEOUT)
            .build()
            .map_err(|e| SyncError(Box::new(e)))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl RenderSync for WebhookSync {
    async fn trigger(&self) -> Result<(), SyncError> {
        log::info!("Triggering downstream sync at {}", self.url);
        self.client
            .post(&self.url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| SyncError(Box::new(e)))?;
        Ok(())
    }
}
