//! Flight Details Tool
//!
//! Looks up the best one-way offer for a route. Fares are in INR.

use std::sync::Arc;

use agent_core::tool::{ToolArguments, ToolDescriptor, ToolOutput};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::json;

use crate::data::TravelData;
use crate::error::{Result, WorkerError};
use crate::tool::{string_arg, Tool};

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

pub struct FlightDetailsTool {
    data: Arc<dyn TravelData>,
}

impl FlightDetailsTool {
    pub fn new(data: Arc<dyn TravelData>) -> Self {
        Self { data }
    }
}

#[async_trait]
impl Tool for FlightDetailsTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(
            "get_flight_details",
            "Fetch flight details between two airports on a date",
            json!({
                "type": "object",
                "properties": {
                    "origin": {"type": "string", "description": "Origin IATA code, e.g. 'DEL'"},
                    "destination": {"type": "string", "description": "Destination IATA code, e.g. 'CDG'"},
                    "date": {"type": "string", "description": "Departure date, YYYY-MM-DD"}
                },
                "required": ["origin", "destination", "date"]
            }),
        )
    }

    async fn execute(&self, arguments: &ToolArguments) -> Result<ToolOutput> {
        let origin = string_arg(arguments, "origin")?;
        let destination = string_arg(arguments, "destination")?;
        let date_text = string_arg(arguments, "date")?;
        let date = NaiveDate::parse_from_str(date_text, DATE_FORMAT)
            .map_err(|_| WorkerError::invalid("date", format!("expected YYYY-MM-DD, got '{date_text}'")))?;

        let offer = self.data.flight(origin, destination, date).await?;

        Ok(ToolOutput::text(format!(
            "Flight with {} from {} to {} on {}, Price: {:.2} INR, Departure: {}, Arrival: {}",
            offer.carrier,
            offer.origin,
            offer.destination,
            date.format(DATE_FORMAT),
            offer.price_inr,
            offer.departure.format(TIMESTAMP_FORMAT),
            offer.arrival.format(TIMESTAMP_FORMAT),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::MockTravelData;

    fn tool() -> FlightDetailsTool {
        FlightDetailsTool::new(Arc::new(MockTravelData::new()))
    }

    fn args(value: serde_json::Value) -> ToolArguments {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_flight_text() {
        let output = tool()
            .execute(&args(json!({"origin": "DEL", "destination": "CDG", "date": "2025-03-12"})))
            .await
            .unwrap();

        let text = output.to_text();
        assert!(text.starts_with("Flight with "));
        assert!(text.contains("from DEL to CDG on 2025-03-12, Price: 31250.00 INR, Departure: 2025-03-12T"));
    }

    #[tokio::test]
    async fn test_bad_date() {
        let err = tool()
            .execute(&args(json!({"origin": "DEL", "destination": "CDG", "date": "12/03/2025"})))
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid argument 'date': expected YYYY-MM-DD, got '12/03/2025'"
        );
    }
}
