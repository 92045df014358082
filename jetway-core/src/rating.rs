use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::models::{Rating, Ticket};
use crate::repository::{RatingRepository, StoreError, TicketStore};
use crate::{require_non_empty, CoreError, CoreResult};

pub const MIN_SCORE: u8 = 1;
pub const MAX_SCORE: u8 = 5;

/// Decides whether a ticket holder may rate the flight they took.
pub struct RatingGate {
    tickets: Arc<dyn TicketStore>,
    ratings: Arc<dyn RatingRepository>,
}

impl RatingGate {
    pub fn new(tickets: Arc<dyn TicketStore>, ratings: Arc<dyn RatingRepository>) -> Self {
        Self { tickets, ratings }
    }

    /// The ticket must belong to `customer_id` and its flight must have
    /// departed strictly before `now`. Returns the ticket on success.
    pub async fn check_rating_eligibility(
        &self,
        ticket_id: Uuid,
        customer_id: &str,
        now: DateTime<Utc>,
    ) -> CoreResult<Ticket> {
        require_non_empty("customer_id", customer_id)?;

        let ticket = self
            .tickets
            .get_ticket(ticket_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("ticket {}", ticket_id)))?;

        if ticket.customer_id != customer_id {
            return Err(CoreError::Forbidden(format!("ticket {} belongs to another customer", ticket_id)));
        }

        if ticket.leg.departure_at >= now {
            return Err(CoreError::TooEarly {
                departure: ticket.leg.departure_at,
            });
        }

        Ok(ticket)
    }

    /// Records the customer's rating. One rating per ticket.
    pub async fn submit_rating(
        &self,
        ticket_id: Uuid,
        customer_id: &str,
        score: u8,
        comment: Option<String>,
        now: DateTime<Utc>,
    ) -> CoreResult<Rating> {
        if !(MIN_SCORE..=MAX_SCORE).contains(&score) {
            return Err(CoreError::ValidationError(format!(
                "rating must be between {} and {}, got {}",
                MIN_SCORE, MAX_SCORE, score
            )));
        }

        let ticket = self.check_rating_eligibility(ticket_id, customer_id, now).await?;

        let rating = Rating {
            id: Uuid::new_v4(),
            ticket_id,
            customer_id: ticket.customer_id,
            leg: ticket.leg,
            score,
            comment: comment.filter(|c| !c.trim().is_empty()),
            created_at: now,
        };

        match self.ratings.insert_rating(&rating).await {
            Ok(_) => {}
            Err(StoreError::Duplicate(_)) => return Err(CoreError::AlreadyRated(ticket_id)),
            Err(other) => return Err(other.into()),
        }

        info!("Rating {} recorded for {} by {}", rating.score, rating.leg, rating.customer_id);
        Ok(rating)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::test_support::{airplane, flight, sample_ticket};
    use crate::memory::InMemoryStore;
    use crate::repository::FlightRepository;
    use chrono::Duration;

    async fn ticket_departing(store: &InMemoryStore, departure_at: DateTime<Utc>) -> Ticket {
        store.create_airplane(&airplane("Skyline", "N1", 12)).await.unwrap();
        let leg = flight("Skyline", "SK9", "N1", departure_at);
        store.create_flight_leg(&leg).await.unwrap();
        let ticket = sample_ticket("ada@example.com", &leg.key, "2A");
        store.seed_ticket(ticket.clone());
        ticket
    }

    fn gate(store: &Arc<InMemoryStore>) -> RatingGate {
        RatingGate::new(store.clone(), store.clone())
    }

    #[tokio::test]
    async fn test_future_flight_is_too_early_until_it_departs() {
        let store = Arc::new(InMemoryStore::new());
        let now = Utc::now();
        let ticket = ticket_departing(&store, now + Duration::days(1)).await;
        let gate = gate(&store);

        let early = gate.check_rating_eligibility(ticket.id, "ada@example.com", now).await;
        assert!(matches!(early, Err(CoreError::TooEarly { .. })));

        // Exactly at departure is still too early
        let at_departure = gate
            .check_rating_eligibility(ticket.id, "ada@example.com", ticket.leg.departure_at)
            .await;
        assert!(matches!(at_departure, Err(CoreError::TooEarly { .. })));

        let later = now + Duration::days(2);
        let eligible = gate.check_rating_eligibility(ticket.id, "ada@example.com", later).await.unwrap();
        assert_eq!(eligible.id, ticket.id);
    }

    #[tokio::test]
    async fn test_other_customer_is_forbidden() {
        let store = Arc::new(InMemoryStore::new());
        let ticket = ticket_departing(&store, Utc::now() - Duration::days(3)).await;

        let result = gate(&store).check_rating_eligibility(ticket.id, "bob@example.com", Utc::now()).await;
        assert!(matches!(result, Err(CoreError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_unknown_ticket() {
        let store = Arc::new(InMemoryStore::new());
        let result = gate(&store).check_rating_eligibility(Uuid::new_v4(), "ada@example.com", Utc::now()).await;
        assert!(matches!(result, Err(CoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_one_rating_per_ticket() {
        let store = Arc::new(InMemoryStore::new());
        let ticket = ticket_departing(&store, Utc::now() - Duration::hours(6)).await;
        let gate = gate(&store);

        let rating = gate
            .submit_rating(ticket.id, "ada@example.com", 4, Some("Smooth landing".to_string()), Utc::now())
            .await
            .unwrap();
        assert_eq!(rating.leg, ticket.leg);
        assert_eq!(rating.customer_id, "ada@example.com");

        let again = gate.submit_rating(ticket.id, "ada@example.com", 2, None, Utc::now()).await;
        assert!(matches!(again, Err(CoreError::AlreadyRated(id)) if id == ticket.id));
        assert_eq!(store.find_rating_for_ticket(ticket.id).await.unwrap().unwrap().score, 4);
    }

    #[tokio::test]
    async fn test_score_range() {
        let store = Arc::new(InMemoryStore::new());
        let ticket = ticket_departing(&store, Utc::now() - Duration::hours(6)).await;
        let gate = gate(&store);

        for score in [0, 6, 200] {
            let result = gate.submit_rating(ticket.id, "ada@example.com", score, None, Utc::now()).await;
            assert!(matches!(result, Err(CoreError::ValidationError(_))));
        }
        assert!(store.find_rating_for_ticket(ticket.id).await.unwrap().is_none());
    }
}
