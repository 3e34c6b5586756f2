use anyhow::{Context, Result};
use reqwest::Client;

pub struct ApiClient {
    client: Client,
    base_url: String,
    publish_path: String,
}

impl ApiClient {
    pub fn new(client: Client, base_url: String, publish_path: String) -> Self {
        Self {
            client,
            base_url,
            publish_path,
        }
    }

    pub async fn health_check(&self) -> Result<()> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await
            .context("Failed to reach the hub")?;

        if !response.status().is_success() {
            anyhow::bail!("Health check failed: {}", response.status());
        }

        Ok(())
    }

    pub async fn publish(&self, message: &str) -> Result<()> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, self.publish_path))
            .body(message.to_string())
            .send()
            .await
            .context("Failed to send publish request")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Failed to publish: {} - {}", status, error_text);
        }

        Ok(())
    }
}
