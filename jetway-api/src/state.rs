use jetway_core::repository::{FlightRepository, RatingRepository, TicketStore};
use jetway_core::{AvailabilityResolver, BookingEngine, FleetRegistry, InMemoryStore, RatingGate, TicketQueries};
use jetway_store::{DbClient, PostgresFlightRepository, PostgresRatingRepository, PostgresTicketStore};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub availability: Arc<AvailabilityResolver>,
    pub booking: Arc<BookingEngine>,
    pub ratings: Arc<RatingGate>,
    pub fleet: Arc<FleetRegistry>,
    pub tickets: Arc<TicketQueries>,
}

impl AppState {
    pub fn new(
        flights: Arc<dyn FlightRepository>,
        tickets: Arc<dyn TicketStore>,
        ratings: Arc<dyn RatingRepository>,
    ) -> Self {
        Self {
            availability: Arc::new(AvailabilityResolver::new(flights.clone(), tickets.clone())),
            booking: Arc::new(BookingEngine::new(flights.clone(), tickets.clone())),
            ratings: Arc::new(RatingGate::new(tickets.clone(), ratings)),
            fleet: Arc::new(FleetRegistry::new(flights)),
            tickets: Arc::new(TicketQueries::new(tickets)),
        }
    }

    pub fn postgres(db: &DbClient) -> Self {
        Self::new(
            Arc::new(PostgresFlightRepository::new(db.pool.clone())),
            Arc::new(PostgresTicketStore::new(db.pool.clone())),
            Arc::new(PostgresRatingRepository::new(db.pool.clone())),
        )
    }

    pub fn in_memory(store: InMemoryStore) -> Self {
        let store = Arc::new(store);
        Self::new(store.clone(), store.clone(), store)
    }
}
