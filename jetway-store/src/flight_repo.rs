use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jetway_core::models::{Airplane, FlightLeg, FlightStatus, LegKey};
use jetway_core::repository::{FlightRepository, StoreResult};
use sqlx::PgPool;

use crate::database::{corrupt, store_error};

pub struct PostgresFlightRepository {
    pool: PgPool,
}

impl PostgresFlightRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct FlightRow {
    airline_name: String,
    flight_number: String,
    departure_at: DateTime<Utc>,
    departure_airport: String,
    arrival_airport: String,
    arrival_at: DateTime<Utc>,
    base_price: i64,
    airplane_id: String,
    status: String,
}

impl TryFrom<FlightRow> for FlightLeg {
    type Error = jetway_core::repository::StoreError;

    fn try_from(row: FlightRow) -> Result<Self, Self::Error> {
        let status: FlightStatus = row.status.parse().map_err(|_| corrupt("flight status", &row.status))?;
        Ok(FlightLeg {
            key: LegKey::new(row.airline_name, row.flight_number, row.departure_at),
            departure_airport: row.departure_airport,
            arrival_airport: row.arrival_airport,
            arrival_at: row.arrival_at,
            base_price: row.base_price,
            airplane_id: row.airplane_id,
            status,
        })
    }
}

#[async_trait]
impl FlightRepository for PostgresFlightRepository {
    async fn get_flight_leg(&self, leg: &LegKey) -> StoreResult<Option<FlightLeg>> {
        let row = sqlx::query_as::<_, FlightRow>(
            r#"
            SELECT airline_name, flight_number, departure_at, departure_airport, arrival_airport,
                   arrival_at, base_price, airplane_id, status
            FROM flights
            WHERE airline_name = $1 AND flight_number = $2 AND departure_at = $3
            "#,
        )
        .bind(&leg.airline_name)
        .bind(&leg.flight_number)
        .bind(leg.departure_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?;

        row.map(FlightLeg::try_from).transpose()
    }

    async fn get_airplane_capacity(&self, airline_name: &str, airplane_id: &str) -> StoreResult<Option<i32>> {
        sqlx::query_scalar::<_, i32>(
            "SELECT num_seats FROM airplanes WHERE airline_name = $1 AND airplane_id = $2",
        )
        .bind(airline_name)
        .bind(airplane_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)
    }

    async fn create_airplane(&self, airplane: &Airplane) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO airplanes (airline_name, airplane_id, num_seats, manufacturer, age)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&airplane.airline_name)
        .bind(&airplane.airplane_id)
        .bind(airplane.capacity)
        .bind(&airplane.manufacturer)
        .bind(airplane.age)
        .execute(&self.pool)
        .await
        .map_err(store_error)?;
        Ok(())
    }

    async fn create_flight_leg(&self, leg: &FlightLeg) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO flights (airline_name, flight_number, departure_at, departure_airport, arrival_airport,
                                 arrival_at, base_price, airplane_id, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(&leg.key.airline_name)
        .bind(&leg.key.flight_number)
        .bind(leg.key.departure_at)
        .bind(&leg.departure_airport)
        .bind(&leg.arrival_airport)
        .bind(leg.arrival_at)
        .bind(leg.base_price)
        .bind(&leg.airplane_id)
        .bind(leg.status.as_str())
        .execute(&self.pool)
        .await
        .map_err(store_error)?;
        Ok(())
    }

    async fn update_flight_status(&self, leg: &LegKey, status: FlightStatus) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE flights SET status = $1
            WHERE airline_name = $2 AND flight_number = $3 AND departure_at = $4
            "#,
        )
        .bind(status.as_str())
        .bind(&leg.airline_name)
        .bind(&leg.flight_number)
        .bind(leg.departure_at)
        .execute(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(result.rows_affected() > 0)
    }
}
