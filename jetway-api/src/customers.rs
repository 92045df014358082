use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use jetway_core::{LegKey, SeatLabel, Ticket};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::extract::{PathParams, QueryParams};
use crate::state::AppState;

/// Ticket as shown to its holder. Only the last four card digits leave the server.
#[derive(Debug, Serialize)]
pub struct TicketView {
    pub id: Uuid,
    pub customer_id: String,
    pub flight: LegKey,
    pub seat: SeatLabel,
    pub purchase_date: NaiveDate,
    pub card_type: String,
    pub card_last_four: String,
}

impl From<Ticket> for TicketView {
    fn from(ticket: Ticket) -> Self {
        Self {
            id: ticket.id,
            card_last_four: ticket.payment.card_number.last_four(),
            card_type: ticket.payment.card_type,
            customer_id: ticket.customer_id,
            flight: ticket.leg,
            seat: ticket.seat,
            purchase_date: ticket.purchase_date,
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TicketScope {
    #[default]
    Upcoming,
    Past,
}

#[derive(Debug, Deserialize)]
pub struct TicketListQuery {
    #[serde(default)]
    pub scope: TicketScope,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/customers/{customer_id}/tickets", get(list_tickets))
}

async fn list_tickets(
    State(state): State<AppState>,
    PathParams(customer_id): PathParams<String>,
    QueryParams(query): QueryParams<TicketListQuery>,
) -> Result<Json<Vec<TicketView>>, AppError> {
    let now = Utc::now();
    let tickets = match query.scope {
        TicketScope::Upcoming => state.tickets.upcoming_tickets(&customer_id, now).await?,
        TicketScope::Past => state.tickets.past_tickets(&customer_id, now).await?,
    };
    Ok(Json(tickets.into_iter().map(TicketView::from).collect()))
}
