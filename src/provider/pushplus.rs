use anyhow::{Context, Result};
use log::{debug, error};
use reqwest::{Client, StatusCode};
use serde::Serialize;

use crate::config::{Credentials, PushPlusConfig};

pub struct PushPlusNotifier {
    client: Client,
    url: String,
    token: String,
    title: String,
    template: String,
    channel: String,
}

#[derive(Debug, Serialize)]
struct PushRequest<'a> {
    token: &'a str,
    title: &'a str,
    content: &'a str,
    template: &'a str,
    channel: &'a str,
}

impl PushPlusNotifier {
    pub fn new(client: Client, config: &PushPlusConfig, credentials: &Credentials) -> Self {
        Self {
            client,
            url: config.url.clone(),
            token: credentials.pushplus_token.clone(),
            title: config.title.clone(),
            template: config.template.clone(),
            channel: config.channel.clone(),
        }
    }

    /// Best effort: failures are logged and never reach the caller.
    pub async fn notify(&self, content: &str) {
        if let Err(e) = self.send(content).await {
            error!("PushPlus 推送异常: {:#}", e);
        }
    }

    async fn send(&self, content: &str) -> Result<()> {
        let body = PushRequest {
            token: &self.token,
            title: &self.title,
            content,
            template: &self.template,
            channel: &self.channel,
        };

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .context("Failed to send request to PushPlus")?;

        if response.status() != StatusCode::OK {
            let text = response.text().await.unwrap_or_default();
            error!("PushPlus 推送失败: {}", text);
        } else {
            debug!("PushPlus notification delivered");
        }

        Ok(())
    }
}
