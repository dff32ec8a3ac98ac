//! Narrative provider port.

use async_trait::async_trait;

use vigil_domain::{ChosenAction, EvidenceItem, NarrativeDelta};

use super::error::ProviderError;

/// One prior turn, condensed for the provider's context window.
#[derive(Debug, Clone)]
pub struct TurnDigestEntry {
    pub turn: u32,
    pub action: String,
    pub narrative: String,
}

/// Everything the provider needs to write the next scene.
#[derive(Debug, Clone)]
pub struct NarrativeRequest {
    /// Ordered digest of prior turns, oldest first.
    pub history: Vec<TurnDigestEntry>,
    pub action: ChosenAction,
    pub known_rules: Vec<String>,
    pub inventory: Vec<EvidenceItem>,
    pub sanity: i32,
    pub location: String,
    /// Turn number about to be played; lets the provider pace the story.
    pub turn: u32,
    pub temperature: f32,
}

/// The provider's answer: the parsed delta plus the raw payload verbatim.
#[derive(Debug, Clone)]
pub struct NarrativeOutcome {
    pub delta: NarrativeDelta,
    pub raw: serde_json::Value,
}

/// External generative narrative source.
///
/// Implementations must validate the response shape: a payload missing any
/// required field is a provider failure, never a half-usable delta.
#[async_trait]
pub trait NarrativePort: Send + Sync {
    async fn next_scene(&self, request: NarrativeRequest) -> Result<NarrativeOutcome, ProviderError>;
}
