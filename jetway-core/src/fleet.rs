use std::sync::Arc;
use tracing::info;

use crate::models::{Airplane, FlightLeg, FlightStatus, LegKey};
use crate::repository::FlightRepository;
use crate::{require_non_empty, CoreError, CoreResult};

/// Staff operations on airplanes and scheduled legs
pub struct FleetRegistry {
    flights: Arc<dyn FlightRepository>,
}

impl FleetRegistry {
    pub fn new(flights: Arc<dyn FlightRepository>) -> Self {
        Self { flights }
    }

    pub async fn register_airplane(&self, airplane: &Airplane) -> CoreResult<()> {
        airplane.validate()?;
        self.flights.create_airplane(airplane).await?;
        info!(
            "Airplane {} registered for {} with {} seats",
            airplane.airplane_id, airplane.airline_name, airplane.capacity
        );
        Ok(())
    }

    /// New legs always start out On-Time.
    pub async fn schedule_flight(&self, leg: &FlightLeg) -> CoreResult<FlightLeg> {
        leg.key.validate()?;
        require_non_empty("departure_airport", &leg.departure_airport)?;
        require_non_empty("arrival_airport", &leg.arrival_airport)?;
        require_non_empty("airplane_id", &leg.airplane_id)?;
        if leg.arrival_at <= leg.key.departure_at {
            return Err(CoreError::ValidationError("arrival must be after departure".to_string()));
        }
        if leg.base_price < 0 {
            return Err(CoreError::ValidationError("base_price must not be negative".to_string()));
        }

        let scheduled = FlightLeg {
            status: FlightStatus::OnTime,
            ..leg.clone()
        };
        self.flights.create_flight_leg(&scheduled).await?;
        info!("Flight {} scheduled on airplane {}", scheduled.key, scheduled.airplane_id);
        Ok(scheduled)
    }

    pub async fn change_status(&self, leg: &LegKey, status: FlightStatus) -> CoreResult<()> {
        leg.validate()?;
        if !self.flights.update_flight_status(leg, status).await? {
            return Err(CoreError::NotFound(format!("flight {}", leg)));
        }
        info!("Flight {} is now {}", leg, status);
        Ok(())
    }
}
