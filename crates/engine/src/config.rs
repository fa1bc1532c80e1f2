//! Configuration for the Xiangqi engine.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // Search constants
    pub search_depth: u32,
    pub time_budget_ms: Option<u64>,

    // Repetition tracking
    pub position_history_capacity: usize,
    /// Consecutive repeated AI turns before a session forces a loop break.
    pub force_break_after: u32,

    // Draw offers
    pub draw_accept_margin: i32,
    pub draw_accept_probability: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            search_depth: 3,
            time_budget_ms: None,
            position_history_capacity: 12,
            force_break_after: 3,
            draw_accept_margin: 500,
            draw_accept_probability: 0.7,
        }
    }
}

impl EngineConfig {
    /// Reads a JSON document; missing keys keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn with_depth(mut self, depth: u32) -> Self {
        self.search_depth = depth;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = EngineConfig::from_json(r#"{ "search_depth": 2 }"#).unwrap();
        assert_eq!(config.search_depth, 2);
        assert_eq!(config.position_history_capacity, 12);
        assert_eq!(config.draw_accept_margin, 500);
    }

    #[test]
    fn test_unknown_json_is_rejected_as_malformed() {
        assert!(EngineConfig::from_json("{ not json").is_err());
    }
}
