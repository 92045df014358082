use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use jetway_core::Airplane;

use crate::error::AppError;
use crate::extract::JsonBody;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/airplanes", post(register_airplane))
}

async fn register_airplane(
    State(state): State<AppState>,
    JsonBody(airplane): JsonBody<Airplane>,
) -> Result<(StatusCode, Json<Airplane>), AppError> {
    state.fleet.register_airplane(&airplane).await?;
    Ok((StatusCode::CREATED, Json(airplane)))
}
