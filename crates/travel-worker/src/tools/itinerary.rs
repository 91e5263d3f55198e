//! Itinerary Tool
//!
//! Builds a day-by-day plan from the city's sights and any requested
//! activities. Sights are spread round-robin across the days.

use std::sync::Arc;

use agent_core::tool::{ToolArguments, ToolDescriptor, ToolOutput};
use async_trait::async_trait;
use serde_json::{json, Value};

use crate::data::TravelData;
use crate::error::{Result, WorkerError};
use crate::tool::{string_arg, Tool};

const DEFAULT_DAYS: u64 = 3;
const MAX_DAYS: u64 = 14;

pub struct ItineraryTool {
    data: Arc<dyn TravelData>,
}

impl ItineraryTool {
    pub fn new(data: Arc<dyn TravelData>) -> Self {
        Self { data }
    }

    fn days(arguments: &ToolArguments) -> Result<u64> {
        let days = match arguments.get("days") {
            None | Some(Value::Null) => DEFAULT_DAYS,
            Some(Value::Number(n)) => n
                .as_u64()
                .ok_or_else(|| WorkerError::invalid("days", "expected a whole number"))?,
            Some(Value::String(s)) => s
                .trim()
                .parse()
                .map_err(|_| WorkerError::invalid("days", format!("expected a whole number, got '{s}'")))?,
            Some(_) => return Err(WorkerError::invalid("days", "expected a whole number")),
        };

        if !(1..=MAX_DAYS).contains(&days) {
            return Err(WorkerError::invalid("days", format!("must be between 1 and {MAX_DAYS}")));
        }
        Ok(days)
    }

    /// Accepts a list of strings or one comma-separated string
    fn activities(arguments: &ToolArguments) -> Result<Vec<String>> {
        let items = match arguments.get("activities") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::String(s)) => s.split(',').map(|a| a.trim().to_string()).collect(),
            Some(Value::Array(values)) => values
                .iter()
                .map(|v| {
                    v.as_str()
                        .map(|a| a.trim().to_string())
                        .ok_or_else(|| WorkerError::invalid("activities", "expected a list of strings"))
                })
                .collect::<Result<_>>()?,
            Some(_) => return Err(WorkerError::invalid("activities", "expected a list of strings")),
        };

        Ok(items.into_iter().filter(|a| !a.is_empty()).collect())
    }

    fn render(city: &str, days: u64, stops: &[String]) -> String {
        let mut out = format!("Itinerary for {city} ({days} days)");
        let days = usize::try_from(days).unwrap_or(1);

        for day in 0..days {
            out.push_str(&format!("\nDay {}:", day + 1));
            let mut planned = stops.iter().skip(day).step_by(days).peekable();
            if planned.peek().is_none() {
                out.push_str(&format!("\n- Free time to explore {city}"));
            }
            for stop in planned {
                out.push_str("\n- ");
                out.push_str(stop);
            }
        }
        out
    }
}

#[async_trait]
impl Tool for ItineraryTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(
            "generate_itinerary",
            "Generate a day-by-day itinerary for a city",
            json!({
                "type": "object",
                "properties": {
                    "city": {"type": "string"},
                    "days": {"type": "integer", "minimum": 1, "maximum": MAX_DAYS, "default": DEFAULT_DAYS},
                    "activities": {"type": "array", "items": {"type": "string"}}
                },
                "required": ["city"]
            }),
        )
    }

    async fn execute(&self, arguments: &ToolArguments) -> Result<ToolOutput> {
        let city = string_arg(arguments, "city")?;
        let days = Self::days(arguments)?;

        let mut stops = self.data.attractions(city).await?;
        stops.extend(Self::activities(arguments)?);

        Ok(ToolOutput::text(Self::render(city, days, &stops)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::MockTravelData;

    fn tool() -> ItineraryTool {
        ItineraryTool::new(Arc::new(MockTravelData::new()))
    }

    fn args(value: Value) -> ToolArguments {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_round_robin_days() {
        let output = tool()
            .execute(&args(json!({"city": "Goa", "days": 2, "activities": ["Spice farm tour"]})))
            .await
            .unwrap();

        assert_eq!(
            output.to_text(),
            "Itinerary for Goa (2 days)\n\
             Day 1:\n- Basilica of Bom Jesus\n- Anjuna Beach\n\
             Day 2:\n- Fort Aguada\n- Spice farm tour"
        );
    }

    #[tokio::test]
    async fn test_unknown_city_gets_free_days() {
        let output = tool()
            .execute(&args(json!({"city": "Hampi", "days": "1"})))
            .await
            .unwrap();
        assert_eq!(output.to_text(), "Itinerary for Hampi (1 days)\nDay 1:\n- Free time to explore Hampi");
    }

    #[test]
    fn test_days_bounds() {
        assert_eq!(ItineraryTool::days(&ToolArguments::new()).unwrap(), 3);
        assert!(ItineraryTool::days(&args(json!({"days": 0}))).is_err());
        assert!(ItineraryTool::days(&args(json!({"days": 15}))).is_err());
        assert!(ItineraryTool::days(&args(json!({"days": 2.5}))).is_err());
    }

    #[test]
    fn test_activities_from_string() {
        let activities = ItineraryTool::activities(&args(json!({"activities": "museums, food tour,"}))).unwrap();
        assert_eq!(activities, ["museums", "food tour"]);
    }
}
