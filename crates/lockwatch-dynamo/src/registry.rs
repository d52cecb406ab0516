// DynamoDB-backed DeviceRegistry
//
// Talks to the DynamoDB JSON API directly: one signed POST per operation,
// `X-Amz-Target` selecting the action. Every transport or service failure
// is `UpstreamUnavailable`.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use lockwatch_core::{traits::DeviceRegistry, Error, Result, StaleResource};
use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::config::DynamoConfig;
use crate::sigv4::{self, SigningRequest};

const SERVICE: &str = "dynamodb";
const CONTENT_TYPE: &str = "application/x-amz-json-1.0";
const TARGET_PREFIX: &str = "DynamoDB_20120810";

pub const KEY_ATTRIBUTE: &str = "locks_id";
pub const CHECKED_ATTRIBUTE: &str = "last_battery_check";

/// Render a timestamp the way the registry stores it (lexically ordered)
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

fn string_attribute<'a>(item: &'a Map<String, Value>, name: &str) -> Option<&'a str> {
    item.get(name)?.get("S")?.as_str()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ScanResponse {
    #[serde(default)]
    items: Vec<Map<String, Value>>,
    last_evaluated_key: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct UpdateItemResponse {
    attributes: Option<Map<String, Value>>,
}

#[derive(Clone)]
pub struct DynamoDeviceRegistry {
    client: Client,
    config: DynamoConfig,
    url: Url,
    host: String,
}

impl DynamoDeviceRegistry {
    pub fn new(config: DynamoConfig) -> Result<Self> {
        Self::with_client(Client::new(), config)
    }

    pub fn with_client(client: Client, config: DynamoConfig) -> Result<Self> {
        let url = Url::parse(&config.endpoint)
            .map_err(|e| Error::config(format!("Invalid DynamoDB endpoint {:?}: {e}", config.endpoint)))?;
        let host = match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) => host.to_string(),
            (None, _) => {
                return Err(Error::config(format!(
                    "DynamoDB endpoint {:?} has no host",
                    config.endpoint
                )))
            }
        };

        Ok(Self {
            client,
            config,
            url,
            host,
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(DynamoConfig::from_env()?)
    }

    pub fn table(&self) -> &str {
        &self.config.table
    }

    async fn call<T: for<'de> Deserialize<'de>>(&self, operation: &str, body: &Value) -> Result<T> {
        let target = format!("{TARGET_PREFIX}.{operation}");
        let payload = serde_json::to_vec(body).map_err(|e| Error::Internal(e.into()))?;

        let signed = sigv4::sign(
            &SigningRequest {
                host: &self.host,
                path: self.url.path(),
                content_type: CONTENT_TYPE,
                target: &target,
                body: &payload,
            },
            &self.config.credentials,
            &self.config.region,
            SERVICE,
            Utc::now(),
        )
        .map_err(|e| Error::config(format!("Failed to sign DynamoDB request: {e}")))?;

        let mut request = self
            .client
            .post(self.url.clone())
            .header("Content-Type", CONTENT_TYPE)
            .header("X-Amz-Target", &target)
            .header("X-Amz-Date", &signed.amz_date)
            .header("Authorization", &signed.authorization);
        if let Some(token) = &signed.security_token {
            request = request.header("X-Amz-Security-Token", token);
        }

        let response = request
            .body(payload)
            .send()
            .await
            .map_err(|e| Error::upstream(format!("DynamoDB {operation} request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(Error::upstream(format!(
                "DynamoDB {operation} error ({status}): {error_text}"
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| Error::upstream(format!("Invalid DynamoDB {operation} response: {e}")))
    }
}

#[async_trait]
impl DeviceRegistry for DynamoDeviceRegistry {
    async fn checked_before(&self, cutoff: DateTime<Utc>) -> Result<Vec<StaleResource>> {
        let threshold = format_timestamp(cutoff);
        let mut stale = Vec::new();
        let mut start_key: Option<Value> = None;
        let mut pages = 0usize;

        loop {
            let mut body = json!({
                "TableName": self.config.table,
                "FilterExpression": format!("{CHECKED_ATTRIBUTE} < :threshold"),
                "ExpressionAttributeValues": {
                    ":threshold": { "S": threshold }
                }
            });
            if let Some(key) = start_key.take() {
                body["ExclusiveStartKey"] = key;
            }

            let page: ScanResponse = self.call("Scan", &body).await?;
            pages += 1;

            for item in &page.items {
                let Some(lock_id) = string_attribute(item, KEY_ATTRIBUTE) else {
                    tracing::warn!(table = %self.config.table, "Skipping registry item without {KEY_ATTRIBUTE}");
                    continue;
                };
                match string_attribute(item, CHECKED_ATTRIBUTE).and_then(parse_timestamp) {
                    Some(last_checked_at) => stale.push(StaleResource {
                        lock_id: lock_id.to_string(),
                        last_checked_at,
                    }),
                    None => tracing::warn!(
                        lock_id = %lock_id,
                        "Skipping lock with missing or unparseable {CHECKED_ATTRIBUTE}"
                    ),
                }
            }

            match page.last_evaluated_key {
                Some(key) if !key.is_null() => start_key = Some(key),
                _ => break,
            }
        }

        tracing::debug!(
            table = %self.config.table,
            pages,
            found = stale.len(),
            threshold = %threshold,
            "Registry scan complete"
        );
        Ok(stale)
    }

    async fn mark_checked(&self, lock_id: &str) -> Result<DateTime<Utc>> {
        let timestamp = format_timestamp(Utc::now());
        let body = json!({
            "TableName": self.config.table,
            "Key": { KEY_ATTRIBUTE: { "S": lock_id } },
            "UpdateExpression": format!("SET {CHECKED_ATTRIBUTE} = :timestamp"),
            "ExpressionAttributeValues": {
                ":timestamp": { "S": timestamp }
            },
            "ReturnValues": "ALL_NEW"
        });

        let response: UpdateItemResponse = self.call("UpdateItem", &body).await?;

        let stored = response
            .attributes
            .as_ref()
            .and_then(|attrs| string_attribute(attrs, CHECKED_ATTRIBUTE))
            .unwrap_or(&timestamp);
        let updated_at = parse_timestamp(stored).ok_or_else(|| {
            Error::upstream(format!("DynamoDB returned unparseable {CHECKED_ATTRIBUTE}: {stored}"))
        })?;

        tracing::info!(lock_id = %lock_id, updated_at = %stored, "Battery check recorded");
        Ok(updated_at)
    }
}

impl std::fmt::Debug for DynamoDeviceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamoDeviceRegistry")
            .field("endpoint", &self.config.endpoint)
            .field("table", &self.config.table)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AwsCredentials;
    use chrono::{Duration, TimeZone};
    use wiremock::matchers::{body_partial_json, header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn registry(server: &MockServer, token: Option<&str>) -> DynamoDeviceRegistry {
        let credentials = AwsCredentials {
            access_key_id: "AKIDEXAMPLE".to_string(),
            secret_access_key: "secret".to_string(),
            session_token: token.map(str::to_string),
        };
        let config = DynamoConfig::new("us-east-1", credentials).with_endpoint(server.uri());
        DynamoDeviceRegistry::new(config).unwrap()
    }

    fn lock_item(id: &str, checked: Option<&str>) -> Value {
        match checked {
            Some(ts) => json!({ "locks_id": { "S": id }, "last_battery_check": { "S": ts } }),
            None => json!({ "locks_id": { "S": id } }),
        }
    }

    #[test]
    fn test_timestamp_format_is_millisecond_utc() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap() + Duration::milliseconds(67);
        assert_eq!(format_timestamp(ts), "2024-01-02T03:04:05.067Z");
    }

    #[tokio::test]
    async fn test_scan_sends_signed_filter_request() {
        let server = MockServer::start().await;
        let cutoff = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();

        Mock::given(method("POST"))
            .and(path("/"))
            .and(header("x-amz-target", "DynamoDB_20120810.Scan"))
            .and(header("content-type", "application/x-amz-json-1.0"))
            .and(header_exists("authorization"))
            .and(header_exists("x-amz-date"))
            .and(body_partial_json(json!({
                "TableName": "locks",
                "FilterExpression": "last_battery_check < :threshold",
                "ExpressionAttributeValues": { ":threshold": { "S": "2024-05-01T00:00:00.000Z" } }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Items": [
                    lock_item("l1", Some("2024-03-01T10:00:00.000Z")),
                    lock_item("l2", Some("2024-04-30T23:59:59.999Z")),
                ],
                "Count": 2
            })))
            .expect(1)
            .mount(&server)
            .await;

        let stale = registry(&server, None).checked_before(cutoff).await.unwrap();

        assert_eq!(stale.len(), 2);
        assert_eq!(stale[0].lock_id, "l1");
        assert_eq!(
            stale[1].last_checked_at,
            Utc.with_ymd_and_hms(2024, 4, 30, 23, 59, 59).unwrap() + Duration::milliseconds(999)
        );
    }

    #[tokio::test]
    async fn test_scan_follows_pagination() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "ExclusiveStartKey": { "locks_id": { "S": "l1" } }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Items": [lock_item("l2", Some("2024-01-01T00:00:00.000Z"))]
            })))
            .with_priority(1)
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Items": [lock_item("l1", Some("2024-01-01T00:00:00.000Z"))],
                "LastEvaluatedKey": { "locks_id": { "S": "l1" } }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let stale = registry(&server, None).checked_before(Utc::now()).await.unwrap();

        let ids: Vec<_> = stale.iter().map(|r| r.lock_id.as_str()).collect();
        assert_eq!(ids, vec!["l1", "l2"]);
    }

    #[tokio::test]
    async fn test_scan_skips_items_without_timestamp() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Items": [
                    lock_item("l1", None),
                    lock_item("l2", Some("not-a-date")),
                    lock_item("l3", Some("2024-01-01T00:00:00.000Z")),
                ]
            })))
            .mount(&server)
            .await;

        let stale = registry(&server, None).checked_before(Utc::now()).await.unwrap();

        assert_eq!(stale.len(), 1);
        assert_eq!(stale[0].lock_id, "l3");
    }

    #[tokio::test]
    async fn test_service_error_is_upstream_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
            .mount(&server)
            .await;

        let err = registry(&server, None)
            .checked_before(Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UpstreamUnavailable(_)));
    }

    #[tokio::test]
    async fn test_mark_checked_updates_item() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("x-amz-target", "DynamoDB_20120810.UpdateItem"))
            .and(header("x-amz-security-token", "session"))
            .and(body_partial_json(json!({
                "TableName": "locks",
                "Key": { "locks_id": { "S": "lock-9" } },
                "UpdateExpression": "SET last_battery_check = :timestamp",
                "ReturnValues": "ALL_NEW"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Attributes": lock_item("lock-9", Some("2024-06-01T12:00:00.123Z"))
            })))
            .expect(1)
            .mount(&server)
            .await;

        let updated_at = registry(&server, Some("session"))
            .mark_checked("lock-9")
            .await
            .unwrap();

        assert_eq!(format_timestamp(updated_at), "2024-06-01T12:00:00.123Z");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_upstream_unavailable() {
        let credentials = AwsCredentials {
            access_key_id: "AKID".to_string(),
            secret_access_key: "secret".to_string(),
            session_token: None,
        };
        let config = DynamoConfig::new("us-east-1", credentials).with_endpoint("http://127.0.0.1:1");
        let registry = DynamoDeviceRegistry::new(config).unwrap();

        let err = registry.mark_checked("l1").await.unwrap_err();
        assert!(matches!(err, Error::UpstreamUnavailable(_)));
    }

    #[test]
    fn test_endpoint_without_host_is_configuration_error() {
        let credentials = AwsCredentials {
            access_key_id: "AKID".to_string(),
            secret_access_key: "secret".to_string(),
            session_token: None,
        };
        let config = DynamoConfig::new("us-east-1", credentials).with_endpoint("not a url");
        let err = DynamoDeviceRegistry::new(config).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }
}
