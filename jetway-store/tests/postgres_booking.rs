//! Runs the booking engine against a real Postgres.
//!
//! `DATABASE_URL=postgres://... cargo test -p jetway-store -- --ignored`

use chrono::{Duration, NaiveDate, Timelike, Utc};
use jetway_core::models::{Airplane, FlightLeg, FlightStatus, LegKey, PaymentInfo};
use jetway_core::pii::Masked;
use jetway_core::repository::TicketStore;
use jetway_core::{AvailabilityResolver, BookingEngine, CoreError, FleetRegistry, SeatRequest, TripSegment};
use jetway_store::app_config::DatabaseConfig;
use jetway_store::{DbClient, PostgresFlightRepository, PostgresTicketStore};
use std::sync::Arc;
use uuid::Uuid;

struct Harness {
    engine: Arc<BookingEngine>,
    availability: AvailabilityResolver,
    tickets: Arc<PostgresTicketStore>,
    onward: LegKey,
    ret: LegKey,
}

fn payment() -> PaymentInfo {
    PaymentInfo {
        card_type: "debit".to_string(),
        card_number: Masked::new("5555444433331111".to_string()),
        card_expiration: NaiveDate::from_ymd_opt(2031, 6, 30).unwrap(),
        name_on_card: "Grace Hopper".to_string(),
    }
}

async fn harness() -> Harness {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let db = DbClient::new(&DatabaseConfig {
        url,
        max_connections: 20,
        acquire_timeout_seconds: 10,
        run_migrations: true,
    })
    .await
    .unwrap();
    db.migrate().await.unwrap();

    let flights = Arc::new(PostgresFlightRepository::new(db.pool.clone()));
    let tickets = Arc::new(PostgresTicketStore::new(db.pool.clone()));
    let fleet = FleetRegistry::new(flights.clone());

    // Unique names so repeated runs do not collide
    let airline = format!("Test Air {}", Uuid::new_v4().simple());
    fleet
        .register_airplane(&Airplane {
            airline_name: airline.clone(),
            airplane_id: "T1".to_string(),
            capacity: 13,
            manufacturer: "Boeing".to_string(),
            age: 2,
        })
        .await
        .unwrap();

    // timestamptz keeps microseconds only
    let departure = (Utc::now() + Duration::days(30)).with_nanosecond(0).unwrap();
    let mut legs = Vec::new();
    for (number, offset) in [("T100", 0), ("T101", 5)] {
        let leg = FlightLeg {
            key: LegKey::new(airline.clone(), number, departure + Duration::days(offset)),
            departure_airport: "SFO".to_string(),
            arrival_airport: "NRT".to_string(),
            arrival_at: departure + Duration::days(offset) + Duration::hours(11),
            base_price: 80_000,
            airplane_id: "T1".to_string(),
            status: FlightStatus::OnTime,
        };
        fleet.schedule_flight(&leg).await.unwrap();
        legs.push(leg.key);
    }

    Harness {
        engine: Arc::new(BookingEngine::new(flights.clone(), tickets.clone())),
        availability: AvailabilityResolver::new(flights, tickets.clone()),
        tickets,
        ret: legs.pop().unwrap(),
        onward: legs.pop().unwrap(),
    }
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_parallel_bookings_get_one_seat() {
    let h = harness().await;

    let handles: Vec<_> = (0..20)
        .map(|i| {
            let engine = h.engine.clone();
            let leg = h.onward.clone();
            tokio::spawn(async move {
                engine.book_single_seat(&format!("p{}@example.com", i), &leg, "2D", &payment()).await
            })
        })
        .collect();

    let mut ok = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => ok += 1,
            Err(CoreError::SeatConflict { .. }) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(ok, 1);
    assert_eq!(h.tickets.list_leg_tickets(&h.onward).await.unwrap().len(), 1);
    let free = h.availability.compute_availability(&h.onward).await.unwrap();
    assert_eq!(free.len(), 12);
    assert!(!free.iter().any(|s| s.to_string() == "2D"));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_round_trip_is_all_or_nothing() {
    let h = harness().await;
    h.engine.book_single_seat("first@example.com", &h.ret, "1A", &payment()).await.unwrap();

    let result = h
        .engine
        .book_round_trip(
            "second@example.com",
            &SeatRequest::new(h.onward.clone(), "1A"),
            &SeatRequest::new(h.ret.clone(), "1A"),
            &payment(),
        )
        .await;

    assert!(matches!(
        result,
        Err(CoreError::SeatConflict { segment: Some(TripSegment::Return), .. })
    ));
    assert!(h.tickets.list_leg_tickets(&h.onward).await.unwrap().is_empty());

    let (a, b) = h
        .engine
        .book_round_trip(
            "second@example.com",
            &SeatRequest::new(h.onward.clone(), "1A"),
            &SeatRequest::new(h.ret.clone(), "1B"),
            &payment(),
        )
        .await
        .unwrap();
    assert_eq!(h.tickets.get_ticket(a).await.unwrap().unwrap().leg, h.onward);
    assert_eq!(h.tickets.get_ticket(b).await.unwrap().unwrap().leg, h.ret);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "requires DATABASE_URL"]
async fn test_crossed_round_trips_conflict_instead_of_failing() {
    let h = harness().await;

    // Each pair books the same seat on both legs, travelling in opposite directions
    let seats = ["1A", "1B", "1C", "1D", "1E", "1F", "2A", "2B", "2C", "2D"];
    let mut handles = Vec::new();
    for (i, seat) in seats.into_iter().enumerate() {
        for (j, (out, back)) in [(h.onward.clone(), h.ret.clone()), (h.ret.clone(), h.onward.clone())]
            .into_iter()
            .enumerate()
        {
            let engine = h.engine.clone();
            handles.push(tokio::spawn(async move {
                engine
                    .book_round_trip(
                        &format!("cross{}-{}@example.com", i, j),
                        &SeatRequest::new(out, seat),
                        &SeatRequest::new(back, seat),
                        &payment(),
                    )
                    .await
            }));
        }
    }

    let mut ok = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => ok += 1,
            Err(CoreError::SeatConflict { segment: Some(_), .. }) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(ok, seats.len());
    assert_eq!(h.tickets.list_leg_tickets(&h.onward).await.unwrap().len(), seats.len());
    assert_eq!(h.tickets.list_leg_tickets(&h.ret).await.unwrap().len(), seats.len());
}
