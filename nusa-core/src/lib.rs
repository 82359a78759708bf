pub mod currency;
pub mod flight;
pub mod request;
pub mod response;
pub mod timezone;

pub use flight::{Airline, Baggage, Flight, FlightDuration, Layover, Location, Price};
pub use request::{SearchFilters, SearchRequest};
pub use response::{ErrorResponse, RoundTripResponse, SearchCriteria, SearchMetadata, SearchResponse};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("origin is required")]
    MissingOrigin,
    #[error("destination is required")]
    MissingDestination,
    #[error("departure_date is required")]
    MissingDepartureDate,
    #[error("unable to parse time string '{0}'")]
    TimeParse(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
