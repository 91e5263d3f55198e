//! Travel Data Sources
//!
//! Abstraction over where weather, fares and sights come from. The worker
//! ships a deterministic mock; a live source would wrap the public APIs.

mod mock;

pub use mock::MockTravelData;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

use crate::error::Result;

/// Current conditions for a city
#[derive(Clone, Debug, PartialEq)]
pub struct Weather {
    pub city: String,
    pub temperature_c: Decimal,
    pub condition: String,
}

/// Cheapest one-way offer for a route and day
#[derive(Clone, Debug, PartialEq)]
pub struct FlightOffer {
    pub carrier: String,
    pub origin: String,
    pub destination: String,
    pub price_inr: Decimal,
    pub departure: NaiveDateTime,
    pub arrival: NaiveDateTime,
}

/// Travel data source (Strategy pattern)
#[async_trait]
pub trait TravelData: Send + Sync {
    /// Current weather for a city
    async fn weather(&self, city: &str) -> Result<Weather>;

    /// Best flight offer for origin/destination IATA codes on a day
    async fn flight(&self, origin: &str, destination: &str, date: NaiveDate) -> Result<FlightOffer>;

    /// Notable sights in a city, most popular first
    async fn attractions(&self, city: &str) -> Result<Vec<String>>;

    /// Source name
    fn name(&self) -> &str;
}
