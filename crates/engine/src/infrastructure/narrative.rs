//! Narrative provider client (OpenAI-compatible API).
//!
//! Asks the model for the next scene as a strict JSON object and parses it
//! into a [`NarrativeDelta`]. The delta is still only a proposal - every
//! invariant is re-applied by the domain transition function.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use vigil_domain::{Choice, EvidenceItem, NarrativeDelta};

use crate::infrastructure::ports::{
    NarrativeOutcome, NarrativePort, NarrativeRequest, ProviderError,
};

/// Client for an OpenAI-compatible chat completion API.
#[derive(Clone)]
pub struct NarrativeClient {
    client: Client,
    base_url: String,
    model: String,
}

/// Default provider base URL.
pub const DEFAULT_PROVIDER_BASE_URL: &str = "http://localhost:11434";

/// Default model.
pub const DEFAULT_PROVIDER_MODEL: &str = "llama3.2";

/// Per-request timeout. Narrative generations are slow but bounded.
const REQUEST_TIMEOUT_SECS: u64 = 60;

impl NarrativeClient {
    pub fn new(base_url: &str, model: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl NarrativePort for NarrativeClient {
    async fn next_scene(
        &self,
        request: NarrativeRequest,
    ) -> Result<NarrativeOutcome, ProviderError> {
        let api_request = OpenAIChatRequest {
            model: self.model.clone(),
            messages: vec![
                OpenAIMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                OpenAIMessage {
                    role: "user".to_string(),
                    content: build_user_prompt(&request),
                },
            ],
            temperature: Some(request.temperature),
            response_format: Some(ResponseFormat {
                r#type: "json_object".to_string(),
            }),
        };

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .json(&api_request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(REQUEST_TIMEOUT_SECS * 1000)
                } else {
                    ProviderError::RequestFailed(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let error_text = response
                .text()
                .await
                .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;
            return Err(ProviderError::RequestFailed(error_text));
        }

        let api_response: OpenAIChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        let content = api_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| {
                ProviderError::InvalidResponse("no choices in provider response".to_string())
            })?;

        parse_delta(&content)
    }
}

/// Parse the model's reply into a validated delta plus the raw payload.
///
/// Tolerates markdown code fences around the JSON body; anything else that
/// fails to parse, or that lacks a required field, is a provider failure.
pub fn parse_delta(content: &str) -> Result<NarrativeOutcome, ProviderError> {
    let json = strip_code_fences(content);

    let raw: serde_json::Value = serde_json::from_str(json)
        .map_err(|e| ProviderError::InvalidResponse(format!("not valid JSON: {e}")))?;

    let payload: DeltaPayload = serde_json::from_value(raw.clone())
        .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

    Ok(NarrativeOutcome {
        delta: NarrativeDelta {
            narrative: payload.narrative,
            choices: payload.choices,
            image_prompt: Some(payload.image_prompt),
            sanity_change: payload.sanity_change,
            new_rules: payload.new_rules,
            new_items: payload.new_items,
            location: Some(payload.location),
            is_game_over: payload.is_game_over,
            is_victory: payload.is_victory,
            consumed_item_id: payload.consumed_item_id,
        },
        raw,
    })
}

fn strip_code_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let without_open = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    without_open
        .strip_suffix("```")
        .unwrap_or(without_open)
        .trim()
}

fn build_user_prompt(request: &NarrativeRequest) -> String {
    let mut prompt = String::new();

    if !request.history.is_empty() {
        prompt.push_str("Story so far:\n");
        for entry in &request.history {
            prompt.push_str(&format!(
                "Turn {}: player chose \"{}\". {}\n",
                entry.turn, entry.action, entry.narrative
            ));
        }
        prompt.push('\n');
    }

    if !request.known_rules.is_empty() {
        prompt.push_str("Rules discovered so far:\n");
        for rule in &request.known_rules {
            prompt.push_str(&format!("- {rule}\n"));
        }
        prompt.push('\n');
    }

    if !request.inventory.is_empty() {
        prompt.push_str("Inventory:\n");
        for item in &request.inventory {
            prompt.push_str(&format!("- {} ({})\n", item.name, item.id));
        }
        prompt.push('\n');
    }

    prompt.push_str(&format!(
        "Current location: {}\nCurrent sanity: {}\nTurn about to play: {}\n",
        request.location, request.sanity, request.turn
    ));
    prompt.push_str(&format!(
        "Player action ({}): {}\n",
        request.action.action_type, request.action.text
    ));
    prompt.push_str("Write the next scene.");

    prompt
}

const SYSTEM_PROMPT: &str = "You are the game master of a rule-based horror \
story. Reply with a single JSON object and nothing else, using exactly these \
fields: narrative (string), choices (array of 3-4 objects with id, text, \
action_type one of move|investigate|use_item|talk|wait), image_prompt \
(English string), sanity_change (integer), location (string), is_game_over \
(boolean), and optionally new_rules (array of strings), new_items (array of \
objects with id, name, description, kind), is_victory (boolean), \
consumed_item_id (string).";

/// Wire shape of the model's JSON reply.
///
/// Required fields have no defaults on purpose: a payload missing any of
/// them must fail deserialization (provider failure), not limp through.
#[derive(Debug, Deserialize)]
struct DeltaPayload {
    narrative: String,
    choices: Vec<Choice>,
    image_prompt: String,
    sanity_change: i32,
    location: String,
    is_game_over: bool,
    #[serde(default)]
    new_rules: Vec<String>,
    #[serde(default)]
    new_items: Vec<EvidenceItem>,
    #[serde(default)]
    is_victory: Option<bool>,
    #[serde(default)]
    consumed_item_id: Option<String>,
}

// =============================================================================
// OpenAI API types
// =============================================================================

#[derive(Debug, Serialize)]
struct OpenAIChatRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    r#type: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct OpenAIMessage {
    role: String,
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIChatResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Deserialize, Default)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
}

#[derive(Debug, Deserialize, Default)]
struct OpenAIResponseMessage {
    #[serde(default)]
    content: Option<String>,
}
