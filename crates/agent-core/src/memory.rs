//! Memory Store
//!
//! Per-session record of the last arguments submitted to each tool. Entries
//! keep the order in which tools were first used; a later call to the same
//! tool overwrites the arguments in place.

use indexmap::IndexMap;

use crate::tool::ToolArguments;

/// Rendered in the prompt when nothing has been remembered yet
pub const EMPTY_MEMORY_SENTINEL: &str = "No past memory.";

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MemoryStore {
    entries: IndexMap<String, ToolArguments>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember the arguments last submitted for `tool`
    pub fn record(&mut self, tool: impl Into<String>, arguments: ToolArguments) {
        self.entries.insert(tool.into(), arguments);
    }

    pub fn get(&self, tool: &str) -> Option<&ToolArguments> {
        self.entries.get(tool)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ToolArguments)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render for the planning prompt.
    ///
    /// Compact JSON object in first-use order, or the sentinel when empty so
    /// "no memory" never looks like an empty plan.
    pub fn render(&self) -> String {
        if self.entries.is_empty() {
            return EMPTY_MEMORY_SENTINEL.to_string();
        }

        serde_json::to_string(&self.entries).unwrap_or_else(|_| EMPTY_MEMORY_SENTINEL.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(value: serde_json::Value) -> ToolArguments {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_empty_renders_sentinel() {
        assert_eq!(MemoryStore::new().render(), EMPTY_MEMORY_SENTINEL);
    }

    #[test]
    fn test_record_overwrites_in_place() {
        let mut memory = MemoryStore::new();
        memory.record("get_weather", args(json!({"city": "Paris"})));
        memory.record("get_flight_details", args(json!({"origin": "DEL"})));
        memory.record("get_weather", args(json!({"city": "Rome"})));

        assert_eq!(memory.len(), 2);
        assert_eq!(memory.get("get_weather").unwrap()["city"], "Rome");
        assert_eq!(
            memory.render(),
            r#"{"get_weather":{"city":"Rome"},"get_flight_details":{"origin":"DEL"}}"#
        );
    }

    #[test]
    fn test_repeated_write_is_stable() {
        let mut memory = MemoryStore::new();
        memory.record("get_weather", args(json!({"city": "Paris"})));
        let before = memory.clone();
        memory.record("get_weather", args(json!({"city": "Paris"})));

        assert_eq!(memory, before);
    }
}
