pub mod pii;
pub mod seat_map;
pub mod models;
pub mod repository;
pub mod availability;
pub mod booking;
pub mod rating;
pub mod fleet;
pub mod tickets;
pub mod memory;

pub use availability::AvailabilityResolver;
pub use booking::{BookingEngine, BookingPhase, SeatRequest, TripSegment};
pub use fleet::FleetRegistry;
pub use memory::InMemoryStore;
pub use models::{Airplane, FlightLeg, FlightStatus, LegKey, PaymentInfo, Rating, Ticket};
pub use rating::RatingGate;
pub use seat_map::{seat_map, SeatLabel};
pub use tickets::TicketQueries;

use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Seat {seat} on {leg} is no longer available")]
    SeatConflict {
        leg: LegKey,
        seat: SeatLabel,
        segment: Option<TripSegment>,
    },
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Flight departing at {departure} has not flown yet")]
    TooEarly { departure: DateTime<Utc> },
    #[error("Ticket {0} has already been rated")]
    AlreadyRated(Uuid),
    #[error("Already exists: {0}")]
    AlreadyExists(String),
    #[error("Invalid booking transition from {from} to {to}")]
    InvalidTransition { from: BookingPhase, to: BookingPhase },
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
}

pub type CoreResult<T> = Result<T, CoreError>;

impl From<repository::StoreError> for CoreError {
    fn from(err: repository::StoreError) -> Self {
        use repository::StoreError;
        match err {
            StoreError::SeatTaken { leg, seat } => CoreError::SeatConflict { leg, seat, segment: None },
            StoreError::Duplicate(what) => CoreError::AlreadyExists(what),
            StoreError::MissingReference(what) => CoreError::NotFound(what),
            StoreError::Unavailable(msg) => CoreError::StorageUnavailable(msg),
        }
    }
}

/// Shared check for identifiers that arrive from the presentation layer.
pub(crate) fn require_non_empty(field: &str, value: &str) -> CoreResult<()> {
    if value.trim().is_empty() {
        return Err(CoreError::ValidationError(format!("{} is required", field)));
    }
    Ok(())
}
