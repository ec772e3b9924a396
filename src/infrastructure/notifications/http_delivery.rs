// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use anyhow::{Context, Result};
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde_json::json;
use sha2::Sha256;
use std::time::Duration;
use tracing::debug;

use crate::config::settings::NotificationSettingsConfig;
use crate::domain::models::notification::{
    Channel, DeliveryReceipt, EventType, NotificationMessage,
};
use crate::domain::services::notification_service::NotificationDelivery;

type HmacSha256 = Hmac<Sha256>;

/// 基于HTTP的通知投递器
///
/// 将通知负载签名后POST到远程投递函数，由远程函数完成实际的
/// 邮件/短信/Webhook发送。负载使用HMAC-SHA256签名，远程端通过
/// `X-Scrapeloom-Signature` 头校验来源。
pub struct HttpDelivery {
    delivery_url: String,
    secret: String,
    client: Client,
}

impl HttpDelivery {
    pub fn new(settings: &NotificationSettingsConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout))
            .build()
            .context("failed to build notification HTTP client")?;
        Ok(Self {
            delivery_url: settings.delivery_url.clone(),
            secret: settings.secret.clone(),
            client,
        })
    }

    fn sign(&self, payload: &serde_json::Value) -> Result<String> {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .context("invalid notification signing secret")?;
        mac.update(payload.to_string().as_bytes());
        let signature = mac.finalize().into_bytes();
        Ok(hex::encode(signature))
    }
}

#[async_trait]
impl NotificationDelivery for HttpDelivery {
    async fn deliver(
        &self,
        event: EventType,
        channel: Channel,
        recipient: &str,
        message: &NotificationMessage,
    ) -> Result<DeliveryReceipt> {
        let payload = json!({
            "type": event.to_string(),
            "channel": channel.to_string(),
            "recipient": recipient,
            "message": message,
        });
        let signature = self.sign(&payload)?;

        debug!(%event, %channel, "dispatching notification payload");

        let response = self
            .client
            .post(&self.delivery_url)
            .header("Content-Type", "application/json")
            .header("X-Scrapeloom-Signature", signature)
            .header("X-Scrapeloom-Channel", channel.to_string())
            .json(&payload)
            .send()
            .await
            .context("Failed to reach notification delivery endpoint")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!(
                "Notification delivery failed: {} - {}",
                status,
                error_text
            ));
        }

        let receipt: DeliveryReceipt = response
            .json()
            .await
            .context("Failed to parse delivery receipt")?;
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use wiremock::matchers::{body_partial_json, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings(url: &str) -> NotificationSettingsConfig {
        NotificationSettingsConfig {
            delivery_url: url.to_string(),
            secret: "test-secret".to_string(),
            request_timeout: 5,
        }
    }

    fn message() -> NotificationMessage {
        NotificationMessage {
            title: "Job completed".to_string(),
            body: "Price watch finished".to_string(),
            timestamp: Utc::now(),
            job_id: None,
            execution_id: None,
            metadata: None,
        }
    }

    #[tokio::test]
    async fn test_deliver_signs_payload_and_parses_receipt() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/deliver"))
            .and(header_exists("X-Scrapeloom-Signature"))
            .and(body_partial_json(serde_json::json!({
                "type": "job.completed",
                "channel": "email",
                "recipient": "user@example.com"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "message": "sent",
                "sent": 1
            })))
            .mount(&server)
            .await;

        let delivery = HttpDelivery::new(&settings(&format!("{}/deliver", server.uri()))).unwrap();
        let receipt = delivery
            .deliver(
                EventType::JobCompleted,
                Channel::Email,
                "user@example.com",
                &message(),
            )
            .await
            .unwrap();
        assert!(receipt.success);
        assert_eq!(receipt.sent, 1);
    }

    #[tokio::test]
    async fn test_deliver_surfaces_remote_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let delivery = HttpDelivery::new(&settings(&server.uri())).unwrap();
        let err = delivery
            .deliver(
                EventType::JobFailed,
                Channel::Webhook,
                "https://example.com/hook",
                &message(),
            )
            .await
            .unwrap_err();
        assert!(err.to_string().contains("500"));
    }

    #[test]
    fn test_signature_is_deterministic() {
        let delivery = HttpDelivery::new(&settings("http://localhost/deliver")).unwrap();
        let payload = serde_json::json!({"channel": "email", "recipient": "a@b.c"});
        let first = delivery.sign(&payload).unwrap();
        let second = delivery.sign(&payload).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 64);
    }
}
