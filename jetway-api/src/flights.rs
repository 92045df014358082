use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use jetway_core::tickets::ManifestEntry;
use jetway_core::{FlightLeg, FlightStatus, LegKey, SeatLabel};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::extract::{JsonBody, PathParams};
use crate::state::AppState;

/// `/v1/flights/{airline}/{flight_number}/{departure}` where departure is RFC 3339.
#[derive(Debug, Deserialize)]
pub struct FlightPath {
    airline: String,
    flight_number: String,
    departure: String,
}

impl FlightPath {
    pub fn leg(&self) -> Result<LegKey, AppError> {
        let departure_at = DateTime::parse_from_rfc3339(&self.departure)
            .map_err(|e| AppError::BadRequest(format!("departure '{}' is not RFC 3339: {}", self.departure, e)))?
            .with_timezone(&Utc);
        Ok(LegKey::new(self.airline.clone(), self.flight_number.clone(), departure_at))
    }
}

#[derive(Debug, Serialize)]
pub struct SeatAvailabilityResponse {
    pub flight: LegKey,
    pub available_seats: Vec<SeatLabel>,
}

#[derive(Debug, Deserialize)]
pub struct ScheduleFlightRequest {
    #[serde(flatten)]
    pub leg: LegKey,
    pub departure_airport: String,
    pub arrival_airport: String,
    pub arrival_at: DateTime<Utc>,
    pub base_price: i64,
    pub airplane_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangeStatusRequest {
    pub status: FlightStatus,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/flights", post(schedule_flight))
        .route("/v1/flights/{airline}/{flight_number}/{departure}/seats", get(available_seats))
        .route("/v1/flights/{airline}/{flight_number}/{departure}/passengers", get(passengers))
        .route("/v1/flights/{airline}/{flight_number}/{departure}/status", put(change_status))
}

async fn available_seats(
    State(state): State<AppState>,
    PathParams(path): PathParams<FlightPath>,
) -> Result<Json<SeatAvailabilityResponse>, AppError> {
    let leg = path.leg()?;
    let available_seats = state.availability.compute_availability(&leg).await?;
    Ok(Json(SeatAvailabilityResponse {
        flight: leg,
        available_seats,
    }))
}

async fn passengers(
    State(state): State<AppState>,
    PathParams(path): PathParams<FlightPath>,
) -> Result<Json<Vec<ManifestEntry>>, AppError> {
    let leg = path.leg()?;
    Ok(Json(state.tickets.passenger_manifest(&leg).await?))
}

async fn schedule_flight(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<ScheduleFlightRequest>,
) -> Result<(StatusCode, Json<FlightLeg>), AppError> {
    let leg = FlightLeg {
        key: req.leg,
        departure_airport: req.departure_airport,
        arrival_airport: req.arrival_airport,
        arrival_at: req.arrival_at,
        base_price: req.base_price,
        airplane_id: req.airplane_id,
        status: FlightStatus::OnTime,
    };
    let scheduled = state.fleet.schedule_flight(&leg).await?;
    Ok((StatusCode::CREATED, Json(scheduled)))
}

async fn change_status(
    State(state): State<AppState>,
    PathParams(path): PathParams<FlightPath>,
    JsonBody(req): JsonBody<ChangeStatusRequest>,
) -> Result<StatusCode, AppError> {
    let leg = path.leg()?;
    state.fleet.change_status(&leg, req.status).await?;
    Ok(StatusCode::NO_CONTENT)
}
