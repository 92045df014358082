use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use jetway_core::models::{LegKey, PaymentInfo, Ticket};
use jetway_core::pii::Masked;
use jetway_core::repository::{StoreError, StoreResult, TicketStore, TicketTransaction};
use jetway_core::seat_map::SeatLabel;
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::HashSet;
use tracing::warn;
use uuid::Uuid;

use crate::database::{corrupt, is_lock_conflict, store_error};

/// Name of the unique constraint that guarantees one ticket per seat per leg.
pub const LEG_SEAT_CONSTRAINT: &str = "tickets_leg_seat_key";

pub struct PostgresTicketStore {
    pool: PgPool,
}

impl PostgresTicketStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct TicketRow {
    id: Uuid,
    customer_id: String,
    airline_name: String,
    flight_number: String,
    departure_at: DateTime<Utc>,
    seat_label: String,
    purchase_date: NaiveDate,
    card_type: String,
    card_number: String,
    card_expiration: NaiveDate,
    name_on_card: String,
}

impl TryFrom<TicketRow> for Ticket {
    type Error = StoreError;

    fn try_from(row: TicketRow) -> Result<Self, Self::Error> {
        let seat: SeatLabel = row.seat_label.parse().map_err(|_| corrupt("seat label", &row.seat_label))?;
        Ok(Ticket {
            id: row.id,
            customer_id: row.customer_id,
            leg: LegKey::new(row.airline_name, row.flight_number, row.departure_at),
            seat,
            payment: PaymentInfo {
                card_type: row.card_type,
                card_number: Masked::new(row.card_number),
                card_expiration: row.card_expiration,
                name_on_card: row.name_on_card,
            },
            purchase_date: row.purchase_date,
        })
    }
}

const TICKET_COLUMNS: &str = "id, customer_id, airline_name, flight_number, departure_at, seat_label, \
     purchase_date, card_type, card_number, card_expiration, name_on_card";

fn into_tickets(rows: Vec<TicketRow>) -> StoreResult<Vec<Ticket>> {
    rows.into_iter().map(Ticket::try_from).collect()
}

#[async_trait]
impl TicketStore for PostgresTicketStore {
    async fn list_occupied_seats(&self, leg: &LegKey) -> StoreResult<HashSet<SeatLabel>> {
        let labels: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT seat_label FROM tickets
            WHERE airline_name = $1 AND flight_number = $2 AND departure_at = $3
            "#,
        )
        .bind(&leg.airline_name)
        .bind(&leg.flight_number)
        .bind(leg.departure_at)
        .fetch_all(&self.pool)
        .await
        .map_err(store_error)?;

        labels
            .iter()
            .map(|label| label.parse::<SeatLabel>().map_err(|_| corrupt("seat label", label)))
            .collect()
    }

    async fn is_seat_taken(&self, leg: &LegKey, seat: &SeatLabel) -> StoreResult<bool> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM tickets
                WHERE airline_name = $1 AND flight_number = $2 AND departure_at = $3 AND seat_label = $4
            )
            "#,
        )
        .bind(&leg.airline_name)
        .bind(&leg.flight_number)
        .bind(leg.departure_at)
        .bind(seat.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(store_error)
    }

    async fn get_ticket(&self, id: Uuid) -> StoreResult<Option<Ticket>> {
        let row = sqlx::query_as::<_, TicketRow>(&format!("SELECT {} FROM tickets WHERE id = $1", TICKET_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?;

        row.map(Ticket::try_from).transpose()
    }

    async fn list_customer_tickets(&self, customer_id: &str) -> StoreResult<Vec<Ticket>> {
        let rows = sqlx::query_as::<_, TicketRow>(&format!(
            "SELECT {} FROM tickets WHERE customer_id = $1 ORDER BY departure_at",
            TICKET_COLUMNS
        ))
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await
        .map_err(store_error)?;

        into_tickets(rows)
    }

    async fn list_leg_tickets(&self, leg: &LegKey) -> StoreResult<Vec<Ticket>> {
        let rows = sqlx::query_as::<_, TicketRow>(&format!(
            "SELECT {} FROM tickets WHERE airline_name = $1 AND flight_number = $2 AND departure_at = $3",
            TICKET_COLUMNS
        ))
        .bind(&leg.airline_name)
        .bind(&leg.flight_number)
        .bind(leg.departure_at)
        .fetch_all(&self.pool)
        .await
        .map_err(store_error)?;

        into_tickets(rows)
    }

    async fn begin(&self) -> StoreResult<Box<dyn TicketTransaction>> {
        let tx = self.pool.begin().await.map_err(store_error)?;
        Ok(Box::new(PostgresTicketTransaction { tx }))
    }
}

/// Holds one pooled connection for the life of the transaction. sqlx rolls
/// back and returns the connection if this is dropped uncommitted.
pub struct PostgresTicketTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl TicketTransaction for PostgresTicketTransaction {
    async fn insert_ticket(&mut self, ticket: &Ticket) -> StoreResult<Uuid> {
        let result = sqlx::query(
            r#"
            INSERT INTO tickets (id, customer_id, airline_name, flight_number, departure_at, seat_label,
                                 purchase_date, card_type, card_number, card_expiration, name_on_card)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(ticket.id)
        .bind(&ticket.customer_id)
        .bind(&ticket.leg.airline_name)
        .bind(&ticket.leg.flight_number)
        .bind(ticket.leg.departure_at)
        .bind(ticket.seat.to_string())
        .bind(ticket.purchase_date)
        .bind(&ticket.payment.card_type)
        .bind(ticket.payment.card_number.expose())
        .bind(ticket.payment.card_expiration)
        .bind(&ticket.payment.name_on_card)
        .execute(&mut *self.tx)
        .await;

        match result {
            Ok(_) => Ok(ticket.id),
            Err(err) if is_lock_conflict(&err) => {
                warn!("Lock conflict on seat {} on {}: {}", ticket.seat, ticket.leg, err);
                Err(StoreError::SeatTaken {
                    leg: ticket.leg.clone(),
                    seat: ticket.seat,
                })
            }
            Err(err) => match store_error(err) {
                StoreError::Duplicate(constraint) if constraint == LEG_SEAT_CONSTRAINT => {
                    warn!("Unique constraint rejected seat {} on {}", ticket.seat, ticket.leg);
                    Err(StoreError::SeatTaken {
                        leg: ticket.leg.clone(),
                        seat: ticket.seat,
                    })
                }
                other => Err(other),
            },
        }
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.tx.commit().await.map_err(store_error)
    }

    async fn rollback(self: Box<Self>) -> StoreResult<()> {
        self.tx.rollback().await.map_err(store_error)
    }
}
