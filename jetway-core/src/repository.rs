use async_trait::async_trait;
use std::collections::HashSet;
use uuid::Uuid;

use crate::models::{Airplane, FlightLeg, FlightStatus, LegKey, Rating, Ticket};
use crate::seat_map::SeatLabel;

/// Failures reported by a storage backend, before translation into `CoreError`.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The (leg, seat) uniqueness constraint rejected a ticket insert.
    #[error("seat {seat} on {leg} is already assigned")]
    SeatTaken { leg: LegKey, seat: SeatLabel },
    #[error("duplicate record: {0}")]
    Duplicate(String),
    #[error("referenced record does not exist: {0}")]
    MissingReference(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Flights and the airplanes that fly them
#[async_trait]
pub trait FlightRepository: Send + Sync {
    async fn get_flight_leg(&self, leg: &LegKey) -> StoreResult<Option<FlightLeg>>;

    async fn get_airplane_capacity(&self, airline_name: &str, airplane_id: &str) -> StoreResult<Option<i32>>;

    async fn create_airplane(&self, airplane: &Airplane) -> StoreResult<()>;

    async fn create_flight_leg(&self, leg: &FlightLeg) -> StoreResult<()>;

    /// Returns false when no such leg exists.
    async fn update_flight_status(&self, leg: &LegKey, status: FlightStatus) -> StoreResult<bool>;
}

/// Issued tickets. Reads are lock-free and may be stale; every write goes
/// through a [`TicketTransaction`].
#[async_trait]
pub trait TicketStore: Send + Sync {
    async fn list_occupied_seats(&self, leg: &LegKey) -> StoreResult<HashSet<SeatLabel>>;

    async fn is_seat_taken(&self, leg: &LegKey, seat: &SeatLabel) -> StoreResult<bool>;

    async fn get_ticket(&self, id: Uuid) -> StoreResult<Option<Ticket>>;

    async fn list_customer_tickets(&self, customer_id: &str) -> StoreResult<Vec<Ticket>>;

    async fn list_leg_tickets(&self, leg: &LegKey) -> StoreResult<Vec<Ticket>>;

    async fn begin(&self) -> StoreResult<Box<dyn TicketTransaction>>;
}

/// An atomic unit of work over the ticket table.
///
/// Dropping a transaction without calling `commit` discards its inserts.
#[async_trait]
pub trait TicketTransaction: Send {
    /// Fails with [`StoreError::SeatTaken`] when the seat is already held.
    async fn insert_ticket(&mut self, ticket: &Ticket) -> StoreResult<Uuid>;

    async fn commit(self: Box<Self>) -> StoreResult<()>;

    async fn rollback(self: Box<Self>) -> StoreResult<()>;
}

#[async_trait]
pub trait RatingRepository: Send + Sync {
    /// Fails with [`StoreError::Duplicate`] when the ticket already has a rating.
    async fn insert_rating(&self, rating: &Rating) -> StoreResult<Uuid>;

    async fn find_rating_for_ticket(&self, ticket_id: Uuid) -> StoreResult<Option<Rating>>;
}
