//! Write-back of decisions to the spreadsheet.

use async_trait::async_trait;
use tracing::debug;

use staffdesk_types::api::StatusUpdate;

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("webhook request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("webhook returned {0}")]
    Status(u16),
}

/// Receiver of decided statuses, keyed by spreadsheet row.
#[async_trait]
pub trait StatusSink: Send + Sync {
    async fn write_status(&self, row_index: u64, status: &str) -> Result<(), SinkError>;
}

/// Posts `{rowIndex, status}` to the spreadsheet's webhook URL. The response
/// body is not read.
pub struct WebhookSink {
    client: reqwest::Client,
    url: String,
}

impl WebhookSink {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl StatusSink for WebhookSink {
    async fn write_status(&self, row_index: u64, status: &str) -> Result<(), SinkError> {
        let body = StatusUpdate {
            row_index,
            status: status.to_string(),
        };

        let res = self.client.post(&self.url).json(&body).send().await?;
        debug!("Sheet webhook answered {} for row {}", res.status(), row_index);

        if !res.status().is_success() {
            return Err(SinkError::Status(res.status().as_u16()));
        }
        Ok(())
    }
}
