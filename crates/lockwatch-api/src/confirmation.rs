// Battery-check confirmation endpoint
//
// The app calls this after the user checked a lock's battery. The device
// registry update always happens first; the click correlation runs only when
// user and campaign are known, and its failure never fails the request.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use chrono::SecondsFormat;
use lockwatch_core::CorrelationKey;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::common::ErrorResponse;
use crate::AppState;

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct BatteryCheckedRequest {
    #[serde(default, alias = "resourceId", alias = "lockId")]
    pub lock_id: Option<String>,
    #[serde(default, alias = "userId")]
    pub user_id: Option<String>,
    #[serde(default, alias = "campaignName", alias = "campaign_name")]
    pub campaign_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BatteryCheckedResponse {
    pub success: bool,
    pub message: String,
    pub lock_id: String,
    /// ISO-8601 UTC timestamp stored in the device registry
    pub updated_at: String,
}

/// Non-blank values pass through untouched; whitespace is part of the id
fn present(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|v| !v.trim().is_empty())
}

fn bad_request(msg: &str) -> (StatusCode, Json<ErrorResponse>) {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(msg)))
}

/// Record a battery check and attribute it to the latest notification
#[utoipa::path(
    post,
    path = "/api/battery-checked",
    request_body = BatteryCheckedRequest,
    responses(
        (status = 200, description = "Battery check recorded", body = BatteryCheckedResponse),
        (status = 400, description = "lock_id missing", body = ErrorResponse),
        (status = 500, description = "Device registry update failed", body = ErrorResponse)
    ),
    tag = "confirmations"
)]
pub async fn battery_checked(
    State(state): State<AppState>,
    payload: Result<Json<BatteryCheckedRequest>, JsonRejection>,
) -> Result<Json<BatteryCheckedResponse>, (StatusCode, Json<ErrorResponse>)> {
    let Json(req) = payload.map_err(|e| {
        tracing::warn!("Rejected confirmation body: {}", e);
        bad_request("Invalid JSON body")
    })?;

    let lock_id = present(req.lock_id.as_ref())
        .ok_or_else(|| bad_request("lock_id is required"))?
        .to_string();

    let updated_at = state.registry.mark_checked(&lock_id).await.map_err(|e| {
        tracing::error!(lock_id = %lock_id, "Failed to update battery check: {}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new("Failed to update battery check").with_details(e.to_string())),
        )
    })?;

    if let (Some(user_id), Some(campaign)) = (
        present(req.user_id.as_ref()),
        present(req.campaign_id.as_ref()),
    ) {
        let key = CorrelationKey::new(campaign, user_id, lock_id.as_str());
        if let Err(e) = state.correlator.correlate(&key).await {
            tracing::error!(
                lock_id = %lock_id,
                user_id = %user_id,
                campaign = %campaign,
                "Failed to record click: {}",
                e
            );
        }
    }

    Ok(Json(BatteryCheckedResponse {
        success: true,
        message: "Battery check updated successfully".to_string(),
        lock_id,
        updated_at: updated_at.to_rfc3339_opts(SecondsFormat::Millis, true),
    }))
}
