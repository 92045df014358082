use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::OwnedMutexGuard;
use uuid::Uuid;

use crate::models::{Airplane, FlightLeg, FlightStatus, LegKey, Rating, Ticket};
use crate::repository::{
    FlightRepository, RatingRepository, StoreError, StoreResult, TicketStore, TicketTransaction,
};
use crate::seat_map::SeatLabel;

#[derive(Default)]
struct Tables {
    airplanes: HashMap<(String, String), Airplane>,
    flights: HashMap<LegKey, FlightLeg>,
    tickets: Vec<Ticket>,
    // (leg, seat) -> ticket id; plays the role of the unique index
    seat_index: HashMap<(LegKey, SeatLabel), Uuid>,
    ratings: HashMap<Uuid, Rating>,
}

/// Process-local store with the same guarantees as the Postgres schema.
///
/// Ticket transactions are serialized behind one async lock, which gives
/// them serializable isolation; reads only take the short table lock.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
    writer: Arc<tokio::sync::Mutex<()>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl FlightRepository for InMemoryStore {
    async fn get_flight_leg(&self, leg: &LegKey) -> StoreResult<Option<FlightLeg>> {
        Ok(self.tables().flights.get(leg).cloned())
    }

    async fn get_airplane_capacity(&self, airline_name: &str, airplane_id: &str) -> StoreResult<Option<i32>> {
        let key = (airline_name.to_string(), airplane_id.to_string());
        Ok(self.tables().airplanes.get(&key).map(|a| a.capacity))
    }

    async fn create_airplane(&self, airplane: &Airplane) -> StoreResult<()> {
        let mut tables = self.tables();
        let key = (airplane.airline_name.clone(), airplane.airplane_id.clone());
        if tables.airplanes.contains_key(&key) {
            return Err(StoreError::Duplicate(format!(
                "airplane {} of {}",
                airplane.airplane_id, airplane.airline_name
            )));
        }
        tables.airplanes.insert(key, airplane.clone());
        Ok(())
    }

    async fn create_flight_leg(&self, leg: &FlightLeg) -> StoreResult<()> {
        let mut tables = self.tables();
        let plane = (leg.key.airline_name.clone(), leg.airplane_id.clone());
        if !tables.airplanes.contains_key(&plane) {
            return Err(StoreError::MissingReference(format!(
                "airplane {} of {}",
                leg.airplane_id, leg.key.airline_name
            )));
        }
        if tables.flights.contains_key(&leg.key) {
            return Err(StoreError::Duplicate(format!("flight {}", leg.key)));
        }
        tables.flights.insert(leg.key.clone(), leg.clone());
        Ok(())
    }

    async fn update_flight_status(&self, leg: &LegKey, status: FlightStatus) -> StoreResult<bool> {
        match self.tables().flights.get_mut(leg) {
            Some(flight) => {
                flight.status = status;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl TicketStore for InMemoryStore {
    async fn list_occupied_seats(&self, leg: &LegKey) -> StoreResult<HashSet<SeatLabel>> {
        Ok(self
            .tables()
            .tickets
            .iter()
            .filter(|t| &t.leg == leg)
            .map(|t| t.seat)
            .collect())
    }

    async fn is_seat_taken(&self, leg: &LegKey, seat: &SeatLabel) -> StoreResult<bool> {
        Ok(self.tables().seat_index.contains_key(&(leg.clone(), *seat)))
    }

    async fn get_ticket(&self, id: Uuid) -> StoreResult<Option<Ticket>> {
        Ok(self.tables().tickets.iter().find(|t| t.id == id).cloned())
    }

    async fn list_customer_tickets(&self, customer_id: &str) -> StoreResult<Vec<Ticket>> {
        Ok(self
            .tables()
            .tickets
            .iter()
            .filter(|t| t.customer_id == customer_id)
            .cloned()
            .collect())
    }

    async fn list_leg_tickets(&self, leg: &LegKey) -> StoreResult<Vec<Ticket>> {
        Ok(self.tables().tickets.iter().filter(|t| &t.leg == leg).cloned().collect())
    }

    async fn begin(&self) -> StoreResult<Box<dyn TicketTransaction>> {
        let gate = self.writer.clone().lock_owned().await;
        Ok(Box::new(MemoryTransaction {
            store: self.clone(),
            staged: Vec::new(),
            _gate: gate,
        }))
    }
}

struct MemoryTransaction {
    store: InMemoryStore,
    staged: Vec<Ticket>,
    _gate: OwnedMutexGuard<()>,
}

#[async_trait]
impl TicketTransaction for MemoryTransaction {
    async fn insert_ticket(&mut self, ticket: &Ticket) -> StoreResult<Uuid> {
        let key = (ticket.leg.clone(), ticket.seat);
        let tables = self.store.tables();

        if !tables.flights.contains_key(&ticket.leg) {
            return Err(StoreError::MissingReference(format!("flight {}", ticket.leg)));
        }

        let staged_clash = self.staged.iter().any(|t| t.leg == ticket.leg && t.seat == ticket.seat);
        if staged_clash || tables.seat_index.contains_key(&key) {
            return Err(StoreError::SeatTaken {
                leg: ticket.leg.clone(),
                seat: ticket.seat,
            });
        }
        drop(tables);

        self.staged.push(ticket.clone());
        Ok(ticket.id)
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let MemoryTransaction { store, staged, _gate } = *self;
        let mut tables = store.tables();
        for ticket in staged {
            tables.seat_index.insert((ticket.leg.clone(), ticket.seat), ticket.id);
            tables.tickets.push(ticket);
        }
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> StoreResult<()> {
        Ok(())
    }
}

#[async_trait]
impl RatingRepository for InMemoryStore {
    async fn insert_rating(&self, rating: &Rating) -> StoreResult<Uuid> {
        let mut tables = self.tables();
        if tables.ratings.contains_key(&rating.ticket_id) {
            return Err(StoreError::Duplicate(format!("rating for ticket {}", rating.ticket_id)));
        }
        tables.ratings.insert(rating.ticket_id, rating.clone());
        Ok(rating.id)
    }

    async fn find_rating_for_ticket(&self, ticket_id: Uuid) -> StoreResult<Option<Rating>> {
        Ok(self.tables().ratings.get(&ticket_id).cloned())
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn test_dropped_transaction_writes_nothing() {
        let store = InMemoryStore::new();
        store.create_airplane(&airplane("Skyline", "N1", 12)).await.unwrap();
        let leg = flight("Skyline", "SK1", "N1", Utc::now());
        store.create_flight_leg(&leg).await.unwrap();

        {
            let mut tx = store.begin().await.unwrap();
            tx.insert_ticket(&sample_ticket("a@example.com", &leg.key, "1A")).await.unwrap();
        }

        assert!(store.list_leg_tickets(&leg.key).await.unwrap().is_empty());
        // The writer gate was released by the drop
        let tx = store.begin().await.unwrap();
        tx.rollback().await.unwrap();
    }

    #[tokio::test]
    async fn test_unique_seat_per_leg() {
        let store = InMemoryStore::new();
        store.create_airplane(&airplane("Skyline", "N1", 12)).await.unwrap();
        let leg = flight("Skyline", "SK1", "N1", Utc::now());
        store.create_flight_leg(&leg).await.unwrap();

        let mut tx = store.begin().await.unwrap();
        tx.insert_ticket(&sample_ticket("a@example.com", &leg.key, "1A")).await.unwrap();
        let clash = tx.insert_ticket(&sample_ticket("b@example.com", &leg.key, "1A")).await;
        assert!(matches!(clash, Err(StoreError::SeatTaken { .. })));
        tx.commit().await.unwrap();

        assert!(store.is_seat_taken(&leg.key, &"1A".parse().unwrap()).await.unwrap());
        assert_eq!(store.list_leg_tickets(&leg.key).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_flight_requires_airplane() {
        let store = InMemoryStore::new();
        let leg = flight("Skyline", "SK1", "N404", Utc::now());
        assert!(matches!(
            store.create_flight_leg(&leg).await,
            Err(StoreError::MissingReference(_))
        ));
    }
}
