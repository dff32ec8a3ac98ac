//! Request DTOs for the REST surface.

use serde::{Deserialize, Serialize};

use vigil_domain::{ActionType, ActorKind};

/// Body of `POST /api/runs`.
///
/// The actor identity arrives already verified by the upstream gateway; the
/// engine treats it as opaque.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartRunRequest {
    pub actor: String,
    #[serde(default = "default_actor_kind")]
    pub actor_kind: ActorKind,
}

fn default_actor_kind() -> ActorKind {
    ActorKind::Human
}

/// Body of `POST /api/runs/{id}/turns`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitTurnRequest {
    pub choice_id: String,
    pub choice_text: String,
    pub action_type: ActionType,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actor_kind_defaults_to_human() {
        let req: StartRunRequest =
            serde_json::from_str(r#"{"actor":"0xabc"}"#).expect("valid request json");
        assert_eq!(req.actor_kind, ActorKind::Human);
    }

    #[test]
    fn agent_kind_is_accepted() {
        let req: StartRunRequest =
            serde_json::from_str(r#"{"actor":"bot-3","actor_kind":"agent"}"#)
                .expect("valid request json");
        assert_eq!(req.actor_kind, ActorKind::Agent);
    }
}
