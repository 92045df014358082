use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use jetway_core::Rating;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::customers::TicketView;
use crate::error::AppError;
use crate::extract::{JsonBody, PathParams, QueryParams};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct EligibilityQuery {
    pub customer_id: String,
}

#[derive(Debug, Serialize)]
pub struct EligibilityResponse {
    pub eligible: bool,
    pub ticket: TicketView,
}

#[derive(Debug, Deserialize)]
pub struct SubmitRatingRequest {
    pub customer_id: String,
    pub score: u8,
    pub comment: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/tickets/{ticket_id}/rating-eligibility", get(rating_eligibility))
        .route("/v1/tickets/{ticket_id}/rating", post(submit_rating))
}

async fn rating_eligibility(
    State(state): State<AppState>,
    PathParams(ticket_id): PathParams<Uuid>,
    QueryParams(query): QueryParams<EligibilityQuery>,
) -> Result<Json<EligibilityResponse>, AppError> {
    let ticket = state
        .ratings
        .check_rating_eligibility(ticket_id, &query.customer_id, Utc::now())
        .await?;

    Ok(Json(EligibilityResponse {
        eligible: true,
        ticket: ticket.into(),
    }))
}

async fn submit_rating(
    State(state): State<AppState>,
    PathParams(ticket_id): PathParams<Uuid>,
    JsonBody(req): JsonBody<SubmitRatingRequest>,
) -> Result<(StatusCode, Json<Rating>), AppError> {
    let rating = state
        .ratings
        .submit_rating(ticket_id, &req.customer_id, req.score, req.comment, Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(rating)))
}
