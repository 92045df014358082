use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use jetway_core::{LegKey, PaymentInfo, SeatRequest};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::extract::JsonBody;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct BookSeatRequest {
    pub customer_id: String,
    #[serde(flatten)]
    pub leg: LegKey,
    pub seat: String,
    pub payment: PaymentInfo,
}

#[derive(Debug, Serialize)]
pub struct BookingResponse {
    pub ticket_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct BookRoundTripRequest {
    pub customer_id: String,
    pub onward: SeatRequest,
    #[serde(rename = "return")]
    pub ret: SeatRequest,
    pub payment: PaymentInfo,
}

#[derive(Debug, Serialize)]
pub struct RoundTripResponse {
    pub onward_ticket_id: Uuid,
    pub return_ticket_id: Uuid,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/bookings", post(book_seat))
        .route("/v1/bookings/round-trip", post(book_round_trip))
}

async fn book_seat(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<BookSeatRequest>,
) -> Result<(StatusCode, Json<BookingResponse>), AppError> {
    let ticket_id = state
        .booking
        .book_single_seat(&req.customer_id, &req.leg, &req.seat, &req.payment)
        .await?;

    Ok((StatusCode::CREATED, Json(BookingResponse { ticket_id })))
}

async fn book_round_trip(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<BookRoundTripRequest>,
) -> Result<(StatusCode, Json<RoundTripResponse>), AppError> {
    let (onward_ticket_id, return_ticket_id) = state
        .booking
        .book_round_trip(&req.customer_id, &req.onward, &req.ret, &req.payment)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RoundTripResponse {
            onward_ticket_id,
            return_ticket_id,
        }),
    ))
}
