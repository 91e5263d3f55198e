//! Mock Travel Data
//!
//! For demos and tests. Static tables, so every answer is reproducible.

use async_trait::async_trait;
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::{FlightOffer, TravelData, Weather};
use crate::error::{Result, WorkerError};

const CARRIERS: [&str; 5] = ["AI", "6E", "UK", "EK", "LH"];

/// Mock travel source with static weather, airports and sights
#[derive(Debug, Default)]
pub struct MockTravelData;

impl MockTravelData {
    pub const fn new() -> Self {
        Self
    }

    /// (temperature °C, condition)
    fn climate(city: &str) -> Option<(Decimal, &'static str)> {
        match city.to_lowercase().as_str() {
            "paris" => Some((dec!(14.2), "light rain")),
            "rome" => Some((dec!(21.5), "clear sky")),
            "london" => Some((dec!(11.8), "overcast clouds")),
            "tokyo" => Some((dec!(18.3), "few clouds")),
            "new york" => Some((dec!(16.0), "broken clouds")),
            "dubai" => Some((dec!(34.7), "clear sky")),
            "delhi" | "new delhi" => Some((dec!(31.4), "haze")),
            "mumbai" => Some((dec!(29.9), "scattered clouds")),
            "bangalore" | "bengaluru" => Some((dec!(24.1), "light rain")),
            "goa" => Some((dec!(30.2), "clear sky")),
            "singapore" => Some((dec!(28.6), "thunderstorm")),
            _ => None,
        }
    }

    /// IATA code to (city, zone). Zone distance drives fare and duration.
    fn airport(code: &str) -> Option<(&'static str, i64)> {
        match code.to_uppercase().as_str() {
            "DEL" => Some(("Delhi", 0)),
            "BOM" => Some(("Mumbai", 0)),
            "BLR" => Some(("Bangalore", 0)),
            "GOI" => Some(("Goa", 0)),
            "DXB" => Some(("Dubai", 1)),
            "SIN" => Some(("Singapore", 2)),
            "CDG" => Some(("Paris", 3)),
            "FCO" => Some(("Rome", 3)),
            "LHR" => Some(("London", 3)),
            "NRT" | "HND" => Some(("Tokyo", 3)),
            "JFK" => Some(("New York", 5)),
            _ => None,
        }
    }

    fn sights(city: &str) -> &'static [&'static str] {
        match city.to_lowercase().as_str() {
            "paris" => &["Eiffel Tower", "Louvre Museum", "Musée d'Orsay", "Montmartre", "Sainte-Chapelle"],
            "rome" => &["Colosseum", "Roman Forum", "Pantheon", "Trevi Fountain", "Vatican Museums"],
            "london" => &["British Museum", "Tower of London", "Westminster Abbey", "Tate Modern"],
            "tokyo" => &["Senso-ji", "Meiji Shrine", "Shibuya Crossing", "Ueno Park"],
            "delhi" | "new delhi" => &["Red Fort", "Qutub Minar", "Humayun's Tomb", "India Gate"],
            "goa" => &["Basilica of Bom Jesus", "Fort Aguada", "Anjuna Beach"],
            _ => &[],
        }
    }

    fn fare(origin_zone: i64, destination_zone: i64, date: NaiveDate) -> Decimal {
        let hops = Decimal::from((origin_zone - destination_zone).abs());
        let base = dec!(3500) + hops * dec!(9250);
        let fare = match date.weekday() {
            Weekday::Fri | Weekday::Sat | Weekday::Sun => base * dec!(1.15),
            _ => base,
        };
        fare.round_dp(2)
    }

    fn seed(origin: &str, destination: &str, date: NaiveDate) -> usize {
        let letters: usize = origin.bytes().chain(destination.bytes()).map(usize::from).sum();
        letters + date.ordinal() as usize
    }
}

#[async_trait]
impl TravelData for MockTravelData {
    async fn weather(&self, city: &str) -> Result<Weather> {
        let (temperature_c, condition) =
            Self::climate(city).ok_or_else(|| WorkerError::UnknownCity(city.to_string()))?;

        Ok(Weather {
            city: city.to_string(),
            temperature_c,
            condition: condition.to_string(),
        })
    }

    async fn flight(&self, origin: &str, destination: &str, date: NaiveDate) -> Result<FlightOffer> {
        let origin = origin.to_uppercase();
        let destination = destination.to_uppercase();

        let (_, origin_zone) = Self::airport(&origin)
            .ok_or_else(|| WorkerError::invalid("origin", format!("unknown airport code '{origin}'")))?;
        let (_, destination_zone) = Self::airport(&destination)
            .ok_or_else(|| WorkerError::invalid("destination", format!("unknown airport code '{destination}'")))?;

        if origin == destination {
            return Err(WorkerError::NoFlights {
                origin,
                destination,
                date: date.to_string(),
            });
        }

        let seed = Self::seed(&origin, &destination, date);
        let hops = (origin_zone - destination_zone).abs();
        let departure = date
            .and_hms_opt(6 + (seed % 14) as u32, 5 * (seed % 12) as u32, 0)
            .ok_or_else(|| WorkerError::invalid("date", "out of range"))?;
        let arrival = departure + Duration::minutes(95 + hops * 110);

        Ok(FlightOffer {
            carrier: CARRIERS[seed % CARRIERS.len()].to_string(),
            price_inr: Self::fare(origin_zone, destination_zone, date),
            origin,
            destination,
            departure,
            arrival,
        })
    }

    async fn attractions(&self, city: &str) -> Result<Vec<String>> {
        Ok(Self::sights(city).iter().map(ToString::to_string).collect())
    }

    fn name(&self) -> &str {
        "mock"
    }
}
