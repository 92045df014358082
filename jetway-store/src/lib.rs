pub mod app_config;
pub mod database;
pub mod flight_repo;
pub mod ticket_repo;
pub mod rating_repo;

pub use database::DbClient;
pub use flight_repo::PostgresFlightRepository;
pub use rating_repo::PostgresRatingRepository;
pub use ticket_repo::PostgresTicketStore;
