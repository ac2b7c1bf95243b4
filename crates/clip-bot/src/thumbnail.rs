//! Source thumbnail fetching for inline suggestions.

use std::time::Duration;

use tracing::debug;

use crate::error::{BotError, BotResult};

/// Placeholder replaced by the source id in the URL template.
const ID_PLACEHOLDER: &str = "{id}";

#[derive(Debug, Clone)]
pub struct ThumbnailFetcher {
    http: reqwest::Client,
    template: String,
    timeout: Duration,
}

impl ThumbnailFetcher {
    pub fn new(template: impl Into<String>, timeout: Duration) -> BotResult<Self> {
        let template = template.into();
        if !template.contains(ID_PLACEHOLDER) {
            return Err(BotError::config_error(format!(
                "thumbnail URL template must contain {}",
                ID_PLACEHOLDER
            )));
        }
        Ok(Self {
            http: reqwest::Client::builder().build()?,
            template,
            timeout,
        })
    }

    pub fn url(&self, source_id: &str) -> String {
        self.template.replace(ID_PLACEHOLDER, source_id)
    }

    /// Download the thumbnail; any non-2xx answer is an error.
    pub async fn fetch(&self, source_id: &str) -> BotResult<Vec<u8>> {
        let url = self.url(source_id);
        debug!(url = %url, "Fetching thumbnail");

        let response = self
            .http
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(BotError::Thumbnail(format!("{} returned {}", url, status)));
        }
        Ok(response.bytes().await?.to_vec())
    }
}
