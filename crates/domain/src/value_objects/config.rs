//! Per-run configuration snapshot.

use serde::{Deserialize, Serialize};

/// Provider and game-balance parameters a run plays under.
///
/// Captured on the run when it starts and refreshed on every accepted turn,
/// so the stored run always reflects the configuration that actually drove
/// its latest transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Narrative provider name (informational, e.g. "ollama").
    pub provider: String,
    /// Model identifier passed to the provider.
    pub model: String,
    pub temperature: f32,
    /// Sanity every run starts with.
    pub initial_sanity: i32,
    /// How many prior turns the history digest carries to the provider.
    pub max_history_turns: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            model: "llama3.2".to_string(),
            temperature: 0.8,
            initial_sanity: 100,
            max_history_turns: 10,
        }
    }
}
