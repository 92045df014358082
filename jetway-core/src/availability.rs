use std::sync::Arc;
use tracing::debug;

use crate::models::{validate_capacity, FlightLeg, LegKey};
use crate::repository::{FlightRepository, TicketStore};
use crate::seat_map::{seat_map, SeatLabel};
use crate::{CoreError, CoreResult};

/// Looks up a leg and the seat capacity of the airplane flying it.
pub(crate) async fn resolve_leg(flights: &dyn FlightRepository, leg: &LegKey) -> CoreResult<(FlightLeg, u32)> {
    let flight = flights
        .get_flight_leg(leg)
        .await?
        .ok_or_else(|| CoreError::NotFound(format!("flight {}", leg)))?;

    let capacity = flights
        .get_airplane_capacity(&flight.key.airline_name, &flight.airplane_id)
        .await?
        .ok_or_else(|| {
            CoreError::NotFound(format!("airplane {} of {}", flight.airplane_id, flight.key.airline_name))
        })?;

    let capacity = validate_capacity(capacity)?;
    Ok((flight, capacity))
}

/// Read-only view of which seats on a leg are still free.
///
/// Results are for display; the booking engine makes the binding decision.
pub struct AvailabilityResolver {
    flights: Arc<dyn FlightRepository>,
    tickets: Arc<dyn TicketStore>,
}

impl AvailabilityResolver {
    pub fn new(flights: Arc<dyn FlightRepository>, tickets: Arc<dyn TicketStore>) -> Self {
        Self { flights, tickets }
    }

    /// Free seats on `leg`, in seat-map order.
    pub async fn compute_availability(&self, leg: &LegKey) -> CoreResult<Vec<SeatLabel>> {
        leg.validate()?;
        let (_, capacity) = resolve_leg(self.flights.as_ref(), leg).await?;
        let occupied = self.tickets.list_occupied_seats(leg).await?;

        let free: Vec<SeatLabel> = seat_map(capacity)
            .into_iter()
            .filter(|seat| !occupied.contains(seat))
            .collect();

        debug!("{} has {} of {} seats free", leg, free.len(), capacity);
        Ok(free)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStore;
    use crate::memory::test_support::{airplane, flight, sample_ticket};
    use chrono::{Duration, Utc};
    use std::collections::HashSet;

    async fn setup(capacity: i32) -> (Arc<InMemoryStore>, AvailabilityResolver, LegKey) {
        let store = Arc::new(InMemoryStore::new());
        store.create_airplane(&airplane("Skyline", "N100", capacity)).await.unwrap();
        let leg = flight("Skyline", "SK1", "N100", Utc::now() + Duration::days(3));
        store.create_flight_leg(&leg).await.unwrap();
        let resolver = AvailabilityResolver::new(store.clone(), store.clone());
        (store, resolver, leg.key)
    }

    #[tokio::test]
    async fn test_excludes_occupied_seats_in_order() {
        let (store, resolver, leg) = setup(13).await;
        store.seed_ticket(sample_ticket("a@example.com", &leg, "1A"));
        store.seed_ticket(sample_ticket("b@example.com", &leg, "2C"));

        let free: Vec<String> = resolver
            .compute_availability(&leg)
            .await
            .unwrap()
            .iter()
            .map(|s| s.to_string())
            .collect();

        assert_eq!(free, vec!["1B", "1C", "1D", "1E", "1F", "2A", "2B", "2D", "2E", "2F", "3A"]);
    }

    #[tokio::test]
    async fn test_is_full_map_minus_occupied() {
        let (store, resolver, leg) = setup(40).await;
        for seat in ["3B", "7F", "1A", "4D"] {
            store.seed_ticket(sample_ticket("c@example.com", &leg, seat));
        }

        let free = resolver.compute_availability(&leg).await.unwrap();
        let occupied = store.list_occupied_seats(&leg).await.unwrap();
        let full: HashSet<SeatLabel> = seat_map(40).into_iter().collect();

        assert!(occupied.is_subset(&full));
        assert_eq!(free.len(), 36);
        let free_set: HashSet<SeatLabel> = free.iter().copied().collect();
        assert_eq!(free_set, full.difference(&occupied).copied().collect());

        // Stable between calls when nothing is booked in between
        assert_eq!(free, resolver.compute_availability(&leg).await.unwrap());
    }

    #[tokio::test]
    async fn test_unknown_leg_is_not_found() {
        let (_, resolver, leg) = setup(10).await;
        let other = LegKey::new("Skyline", "SK999", leg.departure_at);
        assert!(matches!(resolver.compute_availability(&other).await, Err(CoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_leg_with_unknown_airplane_is_not_found() {
        let store = Arc::new(InMemoryStore::new());
        // Bypass the registry so the leg references an airplane that does not exist
        let leg = flight("Skyline", "SK2", "GHOST", Utc::now());
        store.seed_flight_leg(leg.clone());
        let resolver = AvailabilityResolver::new(store.clone(), store.clone());

        assert!(matches!(resolver.compute_availability(&leg.key).await, Err(CoreError::NotFound(_))));
    }
}
