use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use crate::config::Config;
use crate::error::{Error, Result};

#[derive(Debug, Serialize)]
struct Payload<'a> {
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    blocks: Option<&'a Value>,
}

/// Posts status messages to the configured webhook.
#[derive(Debug, Clone)]
pub struct Notifier {
    client: Client,
    webhook_url: String,
}

impl Notifier {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(Error::Notification)?;

        Ok(Self {
            client,
            webhook_url: config.webhook_url.clone(),
        })
    }

    pub async fn notify(&self, text: &str) -> Result<()> {
        self.send(text, None).await
    }

    pub async fn notify_with_blocks(&self, text: &str, blocks: &Value) -> Result<()> {
        self.send(text, Some(blocks)).await
    }

    async fn send(&self, text: &str, blocks: Option<&Value>) -> Result<()> {
        let payload = Payload { text, blocks };

        self.client
            .post(&self.webhook_url)
            .json(&payload)
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(Error::Notification)?;

        log::debug!("Notification sent: {}", text);

        Ok(())
    }
}
