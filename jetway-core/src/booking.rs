use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::availability::resolve_leg;
use crate::models::{LegKey, PaymentInfo, Ticket};
use crate::repository::{FlightRepository, StoreError, TicketStore, TicketTransaction};
use crate::seat_map::SeatLabel;
use crate::{require_non_empty, CoreError, CoreResult};

/// Which half of a round trip a seat belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TripSegment {
    Onward,
    Return,
}

impl fmt::Display for TripSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TripSegment::Onward => f.write_str("onward"),
            TripSegment::Return => f.write_str("return"),
        }
    }
}

/// Phase of a single booking attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingPhase {
    Validating,
    Checking,
    Reserving,
    Committed,
    RolledBack,
}

impl BookingPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingPhase::Committed | BookingPhase::RolledBack)
    }
}

impl fmt::Display for BookingPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BookingPhase::Validating => "VALIDATING",
            BookingPhase::Checking => "CHECKING",
            BookingPhase::Reserving => "RESERVING",
            BookingPhase::Committed => "COMMITTED",
            BookingPhase::RolledBack => "ROLLED_BACK",
        };
        f.write_str(name)
    }
}

/// Validating → Checking → Reserving → {Committed | RolledBack}.
///
/// Any non-terminal phase may end in RolledBack; nothing leaves a terminal phase.
#[derive(Debug)]
pub struct BookingAttempt {
    id: Uuid,
    phase: BookingPhase,
}

impl BookingAttempt {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            phase: BookingPhase::Validating,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn phase(&self) -> BookingPhase {
        self.phase
    }

    pub fn advance(&mut self, next: BookingPhase) -> CoreResult<()> {
        use BookingPhase::*;

        let allowed = matches!(
            (self.phase, next),
            (Validating, Checking) | (Checking, Reserving) | (Reserving, Committed)
        ) || (next == RolledBack && !self.phase.is_terminal());

        if !allowed {
            return Err(CoreError::InvalidTransition { from: self.phase, to: next });
        }

        debug!("booking attempt {}: {} -> {}", self.id, self.phase, next);
        self.phase = next;
        Ok(())
    }

    /// Moves a failed attempt to RolledBack unless it already finished.
    fn abandon(&mut self) {
        if !self.phase.is_terminal() {
            self.phase = BookingPhase::RolledBack;
            debug!("booking attempt {}: rolled back", self.id);
        }
    }
}

impl Default for BookingAttempt {
    fn default() -> Self {
        Self::new()
    }
}

/// One requested seat on one leg.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatRequest {
    #[serde(flatten)]
    pub leg: LegKey,
    pub seat: String,
}

impl SeatRequest {
    pub fn new(leg: LegKey, seat: impl Into<String>) -> Self {
        Self { leg, seat: seat.into() }
    }

    fn validate(&self) -> CoreResult<SeatLabel> {
        self.leg.validate()?;
        self.seat
            .parse::<SeatLabel>()
            .map_err(|e| CoreError::ValidationError(e.to_string()))
    }
}

/// The only writer of tickets.
///
/// Seat uniqueness is decided by the store's constraint at insert time; the
/// availability check before it only gives callers an early answer.
pub struct BookingEngine {
    flights: Arc<dyn FlightRepository>,
    tickets: Arc<dyn TicketStore>,
}

impl BookingEngine {
    pub fn new(flights: Arc<dyn FlightRepository>, tickets: Arc<dyn TicketStore>) -> Self {
        Self { flights, tickets }
    }

    /// Buy one seat on one leg. Returns the new ticket id.
    pub async fn book_single_seat(
        &self,
        customer_id: &str,
        leg: &LegKey,
        seat: &str,
        payment: &PaymentInfo,
    ) -> CoreResult<Uuid> {
        let mut attempt = BookingAttempt::new();
        let request = SeatRequest::new(leg.clone(), seat);

        let result = self.run_single(&mut attempt, customer_id, &request, payment).await;
        if result.is_err() {
            attempt.abandon();
        }
        result
    }

    /// Buy an onward and a return seat together. Either both tickets are
    /// issued or neither is.
    pub async fn book_round_trip(
        &self,
        customer_id: &str,
        onward: &SeatRequest,
        ret: &SeatRequest,
        payment: &PaymentInfo,
    ) -> CoreResult<(Uuid, Uuid)> {
        let mut attempt = BookingAttempt::new();

        let result = self.run_round_trip(&mut attempt, customer_id, onward, ret, payment).await;
        if result.is_err() {
            attempt.abandon();
        }
        result
    }

    async fn run_single(
        &self,
        attempt: &mut BookingAttempt,
        customer_id: &str,
        request: &SeatRequest,
        payment: &PaymentInfo,
    ) -> CoreResult<Uuid> {
        require_non_empty("customer_id", customer_id)?;
        payment.validate()?;
        let seat = request.validate()?;
        attempt.advance(BookingPhase::Checking)?;

        let ticket = self.check_seat(customer_id, &request.leg, seat, payment, None).await?;
        attempt.advance(BookingPhase::Reserving)?;

        let mut tx = self.tickets.begin().await?;
        let inserted = tx.insert_ticket(&ticket).await;
        if let Err(err) = inserted {
            return Err(abort(tx, err, None).await);
        }
        tx.commit().await.map_err(|err| reservation_error(err, None))?;
        attempt.advance(BookingPhase::Committed)?;

        info!(
            "Ticket {} issued to {} for seat {} on {}",
            ticket.id, ticket.customer_id, ticket.seat, ticket.leg
        );
        Ok(ticket.id)
    }

    async fn run_round_trip(
        &self,
        attempt: &mut BookingAttempt,
        customer_id: &str,
        onward: &SeatRequest,
        ret: &SeatRequest,
        payment: &PaymentInfo,
    ) -> CoreResult<(Uuid, Uuid)> {
        require_non_empty("customer_id", customer_id)?;
        payment.validate()?;
        let onward_seat = onward.validate()?;
        let return_seat = ret.validate()?;
        if onward.leg == ret.leg {
            return Err(CoreError::ValidationError(
                "onward and return must be different flights".to_string(),
            ));
        }
        attempt.advance(BookingPhase::Checking)?;

        let onward_ticket = self
            .check_seat(customer_id, &onward.leg, onward_seat, payment, Some(TripSegment::Onward))
            .await?;
        let return_ticket = self
            .check_seat(customer_id, &ret.leg, return_seat, payment, Some(TripSegment::Return))
            .await?;
        attempt.advance(BookingPhase::Reserving)?;

        // Every transaction claims seats in (leg, seat) order, so two round
        // trips over the same pair of seats cannot wait on each other
        let mut claims = [
            (TripSegment::Onward, &onward_ticket),
            (TripSegment::Return, &return_ticket),
        ];
        claims.sort_by(|a, b| (&a.1.leg, a.1.seat).cmp(&(&b.1.leg, b.1.seat)));

        let mut tx = self.tickets.begin().await?;
        for (segment, ticket) in claims {
            let inserted = tx.insert_ticket(ticket).await;
            if let Err(err) = inserted {
                return Err(abort(tx, err, Some(segment)).await);
            }
        }
        tx.commit().await.map_err(|err| reservation_error(err, None))?;
        attempt.advance(BookingPhase::Committed)?;

        info!(
            "Round trip issued to {}: {} seat {} / {} seat {}",
            customer_id, onward_ticket.leg, onward_ticket.seat, return_ticket.leg, return_ticket.seat
        );
        Ok((onward_ticket.id, return_ticket.id))
    }

    /// Resolves the leg, makes sure the seat exists on it and is not already
    /// sold, and builds the ticket that would be inserted.
    async fn check_seat(
        &self,
        customer_id: &str,
        leg: &LegKey,
        seat: SeatLabel,
        payment: &PaymentInfo,
        segment: Option<TripSegment>,
    ) -> CoreResult<Ticket> {
        let (_, capacity) = resolve_leg(self.flights.as_ref(), leg).await?;
        if !seat.fits(capacity) {
            return Err(CoreError::ValidationError(format!(
                "seat {} does not exist on {} ({} seats)",
                seat, leg, capacity
            )));
        }

        if self.tickets.is_seat_taken(leg, &seat).await? {
            warn!("Seat {} on {} already taken", seat, leg);
            return Err(CoreError::SeatConflict {
                leg: leg.clone(),
                seat,
                segment,
            });
        }

        Ok(Ticket {
            id: Uuid::new_v4(),
            customer_id: customer_id.to_string(),
            leg: leg.clone(),
            seat,
            payment: payment.clone(),
            purchase_date: Utc::now().date_naive(),
        })
    }
}

fn reservation_error(err: StoreError, segment: Option<TripSegment>) -> CoreError {
    match err {
        StoreError::SeatTaken { leg, seat } => CoreError::SeatConflict { leg, seat, segment },
        other => other.into(),
    }
}

/// Rolls back after a failed insert and reports the insert's error.
async fn abort(tx: Box<dyn TicketTransaction>, err: StoreError, segment: Option<TripSegment>) -> CoreError {
    match &err {
        StoreError::SeatTaken { leg, seat } => warn!("Lost the race for seat {} on {}, rolling back", seat, leg),
        other => error!("Ticket insert failed, rolling back: {}", other),
    }
    if let Err(rollback_err) = tx.rollback().await {
        // The store discards an unfinished transaction on its own
        error!("Rollback failed: {}", rollback_err);
    }
    reservation_error(err, segment)
}
