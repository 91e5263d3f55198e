//! Travel Tools
//!
//! The three tools the worker serves, all backed by a `TravelData` source.

mod flights;
mod itinerary;
mod weather;

pub use flights::FlightDetailsTool;
pub use itinerary::ItineraryTool;
pub use weather::WeatherTool;

use std::sync::Arc;

use crate::data::TravelData;
use crate::tool::ToolRegistry;

/// Registry with every travel tool, in advertised order
pub fn travel_registry(data: Arc<dyn TravelData>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(WeatherTool::new(data.clone()));
    registry.register(FlightDetailsTool::new(data.clone()));
    registry.register(ItineraryTool::new(data));
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::MockTravelData;

    #[test]
    fn test_registry_order() {
        let registry = travel_registry(Arc::new(MockTravelData::new()));
        let names: Vec<_> = registry.descriptors().into_iter().map(|d| d.name).collect();
        assert_eq!(names, ["get_weather", "get_flight_details", "generate_itinerary"]);
    }
}
