//! Weather Tool

use std::sync::Arc;

use agent_core::tool::{ToolArguments, ToolDescriptor, ToolOutput};
use async_trait::async_trait;
use serde_json::json;

use crate::data::TravelData;
use crate::error::Result;
use crate::tool::{string_arg, Tool};

/// Current weather for a city
pub struct WeatherTool {
    data: Arc<dyn TravelData>,
}

impl WeatherTool {
    pub fn new(data: Arc<dyn TravelData>) -> Self {
        Self { data }
    }
}

#[async_trait]
impl Tool for WeatherTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(
            "get_weather",
            "Get weather details for a city",
            json!({
                "type": "object",
                "properties": {
                    "city": {"type": "string", "description": "City name, e.g. 'Paris'"}
                },
                "required": ["city"]
            }),
        )
    }

    async fn execute(&self, arguments: &ToolArguments) -> Result<ToolOutput> {
        let city = string_arg(arguments, "city")?;
        let weather = self.data.weather(city).await?;

        tracing::debug!(city, source = self.data.name(), "Weather lookup");
        Ok(ToolOutput::text(format!(
            "Weather in {}: {}°C, {}",
            weather.city, weather.temperature_c, weather.condition
        )))
    }
}
