//! Full game state of a run at a point in time.

use serde::{Deserialize, Serialize};

use crate::entities::{Choice, EvidenceItem};
use crate::value_objects::RunConfig;

/// Sanity is always clamped to this range.
pub const SANITY_MIN: i32 = 0;
pub const SANITY_MAX: i32 = 100;

/// The authoritative state embedded in a turn's "after" and surfaced as the
/// run's current state.
///
/// Invariants: sanity in [0,100]; `rules` has set semantics (no duplicates,
/// insertion order preserved) and only grows; inventory shrinks only via an
/// explicit consumed-item id. All of these are enforced by the transition
/// function, never trusted from the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunState {
    pub sanity: i32,
    pub location: String,
    pub narrative: String,
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub image_prompt: Option<String>,
    #[serde(default)]
    pub rules: Vec<String>,
    #[serde(default)]
    pub inventory: Vec<EvidenceItem>,
    #[serde(default)]
    pub is_game_over: bool,
    #[serde(default)]
    pub is_victory: bool,
}

impl RunState {
    /// The fixed opening state every run begins from.
    pub fn initial(config: &RunConfig) -> Self {
        Self {
            sanity: config.initial_sanity.clamp(SANITY_MIN, SANITY_MAX),
            location: "entrance".to_string(),
            narrative: String::new(),
            choices: Vec::new(),
            image_prompt: None,
            rules: Vec::new(),
            inventory: Vec::new(),
            is_game_over: false,
            is_victory: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_state_clamps_configured_sanity() {
        let config = RunConfig {
            initial_sanity: 250,
            ..RunConfig::default()
        };
        let state = RunState::initial(&config);
        assert_eq!(state.sanity, SANITY_MAX);
    }

    #[test]
    fn initial_state_is_not_terminal() {
        let state = RunState::initial(&RunConfig::default());
        assert!(!state.is_game_over);
        assert!(!state.is_victory);
        assert!(state.rules.is_empty());
        assert!(state.inventory.is_empty());
    }
}
