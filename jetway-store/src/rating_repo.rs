use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jetway_core::models::{LegKey, Rating};
use jetway_core::repository::{RatingRepository, StoreError, StoreResult};
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::{corrupt, store_error};

pub struct PostgresRatingRepository {
    pool: PgPool,
}

impl PostgresRatingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct RatingRow {
    id: Uuid,
    ticket_id: Uuid,
    customer_id: String,
    airline_name: String,
    flight_number: String,
    departure_at: DateTime<Utc>,
    score: i16,
    comment: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<RatingRow> for Rating {
    type Error = StoreError;

    fn try_from(row: RatingRow) -> Result<Self, Self::Error> {
        let score = u8::try_from(row.score).map_err(|_| corrupt("rating score", &row.score.to_string()))?;
        Ok(Rating {
            id: row.id,
            ticket_id: row.ticket_id,
            customer_id: row.customer_id,
            leg: LegKey::new(row.airline_name, row.flight_number, row.departure_at),
            score,
            comment: row.comment,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl RatingRepository for PostgresRatingRepository {
    async fn insert_rating(&self, rating: &Rating) -> StoreResult<Uuid> {
        sqlx::query(
            r#"
            INSERT INTO ratings (id, ticket_id, customer_id, airline_name, flight_number, departure_at,
                                 score, comment, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(rating.id)
        .bind(rating.ticket_id)
        .bind(&rating.customer_id)
        .bind(&rating.leg.airline_name)
        .bind(&rating.leg.flight_number)
        .bind(rating.leg.departure_at)
        .bind(rating.score as i16)
        .bind(&rating.comment)
        .bind(rating.created_at)
        .execute(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(rating.id)
    }

    async fn find_rating_for_ticket(&self, ticket_id: Uuid) -> StoreResult<Option<Rating>> {
        let row = sqlx::query_as::<_, RatingRow>(
            r#"
            SELECT id, ticket_id, customer_id, airline_name, flight_number, departure_at,
                   score, comment, created_at
            FROM ratings WHERE ticket_id = $1
            "#,
        )
        .bind(ticket_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?;

        row.map(Rating::try_from).transpose()
    }
}
