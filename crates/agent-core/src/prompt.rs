//! Plan Prompt Builder
//!
//! Renders the catalog, the session memory and the user's query into the
//! single instruction text sent to the LLM.

use crate::catalog::ToolCatalog;
use crate::memory::MemoryStore;

pub const DEFAULT_PREAMBLE: &str =
    "You are an autonomous planning agent. The user will ask questions and you answer them by calling tools.";

const RESPONSE_CONTRACT: &str = r#"Decide which tool(s) to call and in what order, and provide the arguments for each call.
Respond ONLY with a JSON object of exactly this shape, with no other text before or after it:
{"plan": [{"tool": "<tool_name>", "arguments": {...}}]}
Use only tool names from the list above. If no tool applies, respond with {"plan": []}."#;

#[derive(Clone, Debug)]
pub struct PlanPromptBuilder {
    preamble: String,
}

impl Default for PlanPromptBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_PREAMBLE)
    }
}

impl PlanPromptBuilder {
    pub fn new(preamble: impl Into<String>) -> Self {
        Self {
            preamble: preamble.into(),
        }
    }

    pub fn build(&self, query: &str, catalog: &ToolCatalog, memory: &MemoryStore) -> String {
        let mut prompt = String::with_capacity(1024);

        prompt.push_str(&self.preamble);
        prompt.push_str("\n\nHere is your memory of past actions:\n");
        prompt.push_str(&memory.render());

        prompt.push_str("\n\nYou have the following tools available:\n");
        for tool in catalog.iter() {
            prompt.push_str(&format!(
                "- {}({}) → {}\n",
                tool.name, tool.input_schema, tool.description
            ));
        }

        prompt.push('\n');
        prompt.push_str(RESPONSE_CONTRACT);
        prompt.push_str("\n\nUser query: ");
        prompt.push_str(query.trim());
        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::EMPTY_MEMORY_SENTINEL;
    use crate::testing::travel_tools;
    use serde_json::json;

    #[test]
    fn test_prompt_sections() {
        let catalog = ToolCatalog::from_tools(travel_tools());
        let prompt = PlanPromptBuilder::default().build("Weather in Paris?", &catalog, &MemoryStore::new());

        assert!(prompt.starts_with(DEFAULT_PREAMBLE));
        assert!(prompt.contains(EMPTY_MEMORY_SENTINEL));
        assert!(prompt.contains(r#"{"plan": [{"tool": "<tool_name>", "arguments": {...}}]}"#));
        assert!(prompt.ends_with("User query: Weather in Paris?"));

        let weather = prompt.find("- get_weather(").unwrap();
        let flights = prompt.find("- get_flight_details(").unwrap();
        assert!(weather < flights);
        assert!(prompt.contains("→ Get weather details for a city"));
        assert!(prompt.contains(r#""city""#));
    }

    #[test]
    fn test_prompt_includes_memory() {
        let catalog = ToolCatalog::from_tools(travel_tools());
        let mut memory = MemoryStore::new();
        memory.record("get_weather", json!({"city": "Paris"}).as_object().cloned().unwrap());

        let prompt = PlanPromptBuilder::new("You are a travel assistant.").build("and tomorrow?", &catalog, &memory);

        assert!(prompt.starts_with("You are a travel assistant."));
        assert!(prompt.contains(r#"{"get_weather":{"city":"Paris"}}"#));
        assert!(!prompt.contains(EMPTY_MEMORY_SENTINEL));
    }
}
