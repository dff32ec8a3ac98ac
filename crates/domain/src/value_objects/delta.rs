//! The narrative provider's structured proposal for one turn.

use serde::{Deserialize, Serialize};

use crate::entities::{Choice, EvidenceItem};

/// What the provider proposes should happen next.
///
/// This is an unvalidated delta proposal, never the next state itself: field
/// presence and value ranges are not trusted, and the transition function
/// applies its own clamping and defaulting unconditionally.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NarrativeDelta {
    pub narrative: String,
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub image_prompt: Option<String>,
    #[serde(default)]
    pub sanity_change: i32,
    #[serde(default)]
    pub new_rules: Vec<String>,
    #[serde(default)]
    pub new_items: Vec<EvidenceItem>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub is_game_over: bool,
    #[serde(default)]
    pub is_victory: Option<bool>,
    #[serde(default)]
    pub consumed_item_id: Option<String>,
}
