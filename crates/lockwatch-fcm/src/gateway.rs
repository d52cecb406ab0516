// FCM push gateway
//
// One HTTP v1 `messages:send` call per message. Status mapping:
// - 2xx: the returned message name is the batch id
// - 401/403/429/5xx and transport failures: UpstreamUnavailable
// - any other 4xx (UNREGISTERED, INVALID_ARGUMENT, ...): Rejected

use std::sync::Arc;

use async_trait::async_trait;
use lockwatch_core::{traits::PushGateway, Error, PushMessage, Result};
use reqwest::{Client, StatusCode};

use crate::auth::{AccessTokenSource, ServiceAccountTokenSource};
use crate::config::FcmConfig;
use crate::types::{ErrorResponse, FcmMessage, FcmNotification, SendRequest, SendResponse};

#[derive(Clone)]
pub struct FcmGateway {
    client: Client,
    send_url: String,
    tokens: Arc<dyn AccessTokenSource>,
}

impl FcmGateway {
    pub fn new(
        client: Client,
        endpoint: &str,
        project_id: &str,
        tokens: Arc<dyn AccessTokenSource>,
    ) -> Self {
        Self {
            client,
            send_url: format!(
                "{}/v1/projects/{}/messages:send",
                endpoint.trim_end_matches('/'),
                project_id
            ),
            tokens,
        }
    }

    /// Gateway authenticated with the configured service account
    pub fn from_config(config: FcmConfig) -> Result<Self> {
        let client = Client::new();
        let tokens = ServiceAccountTokenSource::new(client.clone(), config.service_account.clone())?;
        Ok(Self::new(
            client,
            &config.endpoint,
            &config.service_account.project_id,
            Arc::new(tokens),
        ))
    }

    pub fn from_env() -> Result<Self> {
        Self::from_config(FcmConfig::from_env()?)
    }

    pub fn send_url(&self) -> &str {
        &self.send_url
    }
}

fn classify_failure(status: StatusCode, body: &str) -> Error {
    let detail = match serde_json::from_str::<ErrorResponse>(body) {
        Ok(parsed) => format!("{} {}", parsed.error.error_code(), parsed.error.message),
        Err(_) => body.to_string(),
    };

    let retryable = status.is_server_error()
        || matches!(
            status,
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS
        );
    if retryable {
        Error::upstream(format!("FCM error ({status}): {detail}"))
    } else {
        Error::rejected(format!("FCM rejected message ({status}): {detail}"))
    }
}

#[async_trait]
impl PushGateway for FcmGateway {
    async fn send(&self, message: &PushMessage) -> Result<String> {
        let access_token = self.tokens.access_token().await?;

        let request = SendRequest {
            message: FcmMessage {
                token: &message.token,
                notification: FcmNotification {
                    title: &message.title,
                    body: &message.body,
                },
                data: &message.data,
            },
        };

        let response = self
            .client
            .post(&self.send_url)
            .bearer_auth(access_token)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::upstream(format!("Failed to send FCM request: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(classify_failure(status, &error_text));
        }

        let sent: SendResponse = response
            .json()
            .await
            .map_err(|e| Error::upstream(format!("Invalid FCM response: {e}")))?;
        Ok(sent.name)
    }
}

impl std::fmt::Debug for FcmGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FcmGateway")
            .field("send_url", &self.send_url)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticTokenSource;
    use std::collections::BTreeMap;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn gateway(server: &MockServer) -> FcmGateway {
        FcmGateway::new(
            Client::new(),
            &server.uri(),
            "locks-test",
            Arc::new(StaticTokenSource::new("test-token")),
        )
    }

    fn message() -> PushMessage {
        let mut data = BTreeMap::new();
        data.insert("campaign_id".to_string(), "battery_low_alert".to_string());
        data.insert("lock_id".to_string(), "l1".to_string());
        data.insert("user_id".to_string(), "u1".to_string());
        data.insert("timestamp".to_string(), "2024-06-01T12:00:00.000Z".to_string());
        PushMessage {
            token: "device-token".to_string(),
            title: "🔋 Battery Alert".to_string(),
            body: "Lock l1 battery needs attention!".to_string(),
            data,
        }
    }

    #[test]
    fn test_send_url_layout() {
        let gw = FcmGateway::new(
            Client::new(),
            "https://fcm.googleapis.com/",
            "locks-prod",
            Arc::new(StaticTokenSource::new("t")),
        );
        assert_eq!(
            gw.send_url(),
            "https://fcm.googleapis.com/v1/projects/locks-prod/messages:send"
        );
    }

    #[tokio::test]
    async fn test_send_returns_message_name() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/projects/locks-test/messages:send"))
            .and(header("authorization", "Bearer test-token"))
            .and(body_json(json!({
                "message": {
                    "token": "device-token",
                    "notification": {
                        "title": "🔋 Battery Alert",
                        "body": "Lock l1 battery needs attention!"
                    },
                    "data": {
                        "campaign_id": "battery_low_alert",
                        "lock_id": "l1",
                        "timestamp": "2024-06-01T12:00:00.000Z",
                        "user_id": "u1"
                    }
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "projects/locks-test/messages/0:1717243200000000%abc"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let name = gateway(&server).send(&message()).await.unwrap();
        assert_eq!(name, "projects/locks-test/messages/0:1717243200000000%abc");
    }

    #[tokio::test]
    async fn test_unregistered_token_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": {
                    "code": 404,
                    "message": "Requested entity was not found.",
                    "status": "NOT_FOUND",
                    "details": [{ "errorCode": "UNREGISTERED" }]
                }
            })))
            .mount(&server)
            .await;

        let err = gateway(&server).send(&message()).await.unwrap_err();
        match err {
            Error::Rejected(msg) => assert!(msg.contains("UNREGISTERED")),
            other => panic!("Expected Rejected, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_server_error_is_upstream_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
            .mount(&server)
            .await;

        let err = gateway(&server).send(&message()).await.unwrap_err();
        assert!(matches!(err, Error::UpstreamUnavailable(_)));
    }

    #[tokio::test]
    async fn test_quota_exceeded_is_upstream_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "error": { "code": 429, "message": "quota", "status": "RESOURCE_EXHAUSTED" }
            })))
            .mount(&server)
            .await;

        let err = gateway(&server).send(&message()).await.unwrap_err();
        assert!(matches!(err, Error::UpstreamUnavailable(_)));
    }

    #[tokio::test]
    async fn test_unreachable_gateway_is_upstream_unavailable() {
        let gw = FcmGateway::new(
            Client::new(),
            "http://127.0.0.1:1",
            "p",
            Arc::new(StaticTokenSource::new("t")),
        );
        let err = gw.send(&message()).await.unwrap_err();
        assert!(matches!(err, Error::UpstreamUnavailable(_)));
    }
}
