//! Client for the relay's local bridge.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use snippet_relay::bridge::BridgeConfig;
use snippet_relay::coordinator::{Ack, CapturedText, Request};
use tracing::debug;
use url::Url;
use wp_snippets::{Credentials, SaveResult};

use crate::error::{CliError, Result};

/// `{status, message}` body of a rejected bridge request.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

pub struct RelayClient {
    http: Client,
    message_url: Url,
}

impl RelayClient {
    pub fn new(base: &str) -> Result<Self> {
        let base = Url::parse(base)?;
        let message_url = base.join("/message")?;
        let http = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_default();
        Ok(Self { http, message_url })
    }

    /// Base URL for a relay bound as configured. A wildcard bind is reached over loopback.
    pub fn base_url_for(bridge: &BridgeConfig) -> String {
        let host = match bridge.bind_address.as_str() {
            "0.0.0.0" | "" => "127.0.0.1",
            "::" => "[::1]",
            other => other,
        };
        format!("http://{}:{}", host, bridge.port)
    }

    async fn send<T: DeserializeOwned>(&self, request: &Request) -> Result<T> {
        debug!(kind = request.kind(), url = %self.message_url, "Sending to relay");
        let response = self
            .http
            .post(self.message_url.clone())
            .json(request)
            .send()
            .await
            .map_err(|e| CliError::RelayUnavailable {
                url: self.message_url.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|b| b.message)
                .unwrap_or_else(|_| format!("HTTP {status}"));
            return Err(CliError::Relay(message));
        }

        serde_json::from_str(&body).map_err(|e| CliError::UnexpectedReply(e.to_string()))
    }

    pub async fn capture(&self, text: &str) -> Result<Ack> {
        self.send(&Request::CaptureText {
            text: text.to_string(),
        })
        .await
    }

    pub async fn captured_text(&self) -> Result<String> {
        let reply: CapturedText = self.send(&Request::GetCapturedText).await?;
        Ok(reply.text)
    }

    pub async fn save(&self, text: &str, category: &str) -> Result<SaveResult> {
        self.send(&Request::SaveText {
            text: text.to_string(),
            category: category.to_string(),
        })
        .await
    }

    pub async fn credentials(&self) -> Result<Credentials> {
        self.send(&Request::GetCredentials).await
    }
}
