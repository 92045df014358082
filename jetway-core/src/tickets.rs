use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use crate::models::{LegKey, Ticket};
use crate::repository::TicketStore;
use crate::seat_map::SeatLabel;
use crate::{require_non_empty, CoreResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestEntry {
    pub customer_id: String,
    pub seat: SeatLabel,
}

/// Read-only ticket lookups for customers and staff
pub struct TicketQueries {
    tickets: Arc<dyn TicketStore>,
}

impl TicketQueries {
    pub fn new(tickets: Arc<dyn TicketStore>) -> Self {
        Self { tickets }
    }

    /// Tickets for flights that have not departed yet, soonest first.
    pub async fn upcoming_tickets(&self, customer_id: &str, now: DateTime<Utc>) -> CoreResult<Vec<Ticket>> {
        require_non_empty("customer_id", customer_id)?;
        let mut tickets: Vec<Ticket> = self
            .tickets
            .list_customer_tickets(customer_id)
            .await?
            .into_iter()
            .filter(|t| t.leg.departure_at >= now)
            .collect();
        tickets.sort_by_key(|t| t.leg.departure_at);
        Ok(tickets)
    }

    /// Tickets for flights already flown, most recent first.
    pub async fn past_tickets(&self, customer_id: &str, now: DateTime<Utc>) -> CoreResult<Vec<Ticket>> {
        require_non_empty("customer_id", customer_id)?;
        let mut tickets: Vec<Ticket> = self
            .tickets
            .list_customer_tickets(customer_id)
            .await?
            .into_iter()
            .filter(|t| t.leg.departure_at < now)
            .collect();
        tickets.sort_by(|a, b| b.leg.departure_at.cmp(&a.leg.departure_at));
        Ok(tickets)
    }

    pub async fn passenger_manifest(&self, leg: &LegKey) -> CoreResult<Vec<ManifestEntry>> {
        leg.validate()?;
        let mut entries: Vec<ManifestEntry> = self
            .tickets
            .list_leg_tickets(leg)
            .await?
            .into_iter()
            .map(|t| ManifestEntry {
                customer_id: t.customer_id,
                seat: t.seat,
            })
            .collect();
        entries.sort_by_key(|e| e.seat);
        Ok(entries)
    }
}
