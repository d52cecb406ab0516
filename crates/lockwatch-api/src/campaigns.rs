// Campaign reporting API endpoints (read-only)

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use lockwatch_core::{CampaignStats, OverallPerformance, Reporter, UserEngagement};

use crate::common::{ErrorResponse, ListResponse};
use crate::AppState;

fn internal_error(e: lockwatch_core::Error, what: &str) -> (StatusCode, Json<ErrorResponse>) {
    tracing::error!("Failed to {}: {}", what, e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new("Internal server error")),
    )
}

/// List all campaigns, most recent activity first
#[utoipa::path(
    get,
    path = "/v1/campaigns",
    responses(
        (status = 200, description = "Campaign statistics", body = ListResponse<CampaignStats>),
        (status = 500, description = "Internal error", body = ErrorResponse)
    ),
    tag = "campaigns"
)]
pub async fn list_campaigns(
    State(state): State<AppState>,
) -> Result<Json<ListResponse<CampaignStats>>, (StatusCode, Json<ErrorResponse>)> {
    let campaigns = state
        .reporter
        .all_campaigns()
        .await
        .map_err(|e| internal_error(e, "list campaigns"))?;

    Ok(Json(campaigns.into()))
}

/// Totals across every campaign
#[utoipa::path(
    get,
    path = "/v1/overall",
    responses(
        (status = 200, description = "Overall performance", body = OverallPerformance),
        (status = 500, description = "Internal error", body = ErrorResponse)
    ),
    tag = "campaigns"
)]
pub async fn overall_performance(
    State(state): State<AppState>,
) -> Result<Json<OverallPerformance>, (StatusCode, Json<ErrorResponse>)> {
    let campaigns = state
        .reporter
        .all_campaigns()
        .await
        .map_err(|e| internal_error(e, "compute overall performance"))?;

    Ok(Json(Reporter::overall(&campaigns)))
}

/// Statistics for one campaign
#[utoipa::path(
    get,
    path = "/v1/campaigns/{campaign_name}",
    params(
        ("campaign_name" = String, Path, description = "Campaign name")
    ),
    responses(
        (status = 200, description = "Campaign found", body = CampaignStats),
        (status = 404, description = "No sends recorded for this campaign", body = ErrorResponse),
        (status = 500, description = "Internal error", body = ErrorResponse)
    ),
    tag = "campaigns"
)]
pub async fn get_campaign(
    State(state): State<AppState>,
    Path(campaign_name): Path<String>,
) -> Result<Json<CampaignStats>, (StatusCode, Json<ErrorResponse>)> {
    let stats = state
        .reporter
        .campaign_stats(&campaign_name)
        .await
        .map_err(|e| internal_error(e, "get campaign"))?
        .ok_or_else(|| {
            (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse::new(format!("Campaign '{campaign_name}' not found"))),
            )
        })?;

    Ok(Json(stats))
}

/// A user's notification history, newest first
#[utoipa::path(
    get,
    path = "/v1/users/{user_id}/engagement",
    params(
        ("user_id" = String, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Engagement history", body = ListResponse<UserEngagement>),
        (status = 500, description = "Internal error", body = ErrorResponse)
    ),
    tag = "campaigns"
)]
pub async fn user_engagement(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<ListResponse<UserEngagement>>, (StatusCode, Json<ErrorResponse>)> {
    let history = state
        .reporter
        .user_history(&user_id)
        .await
        .map_err(|e| internal_error(e, "get user engagement"))?;

    Ok(Json(history.into()))
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/v1/campaigns", get(list_campaigns))
        .route("/v1/overall", get(overall_performance))
        .route("/v1/campaigns/:campaign_name", get(get_campaign))
        .route("/v1/users/:user_id/engagement", get(user_engagement))
        .with_state(state)
}
