//! Run aggregate - one playthrough from start to terminal outcome.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::ids::{ActorId, RunId};
use crate::value_objects::RunConfig;

/// One player's or agent's playthrough instance.
///
/// Mutated once per accepted turn; immutable once terminal. The config
/// snapshot is captured at start and refreshed on every accepted turn so a
/// completed run records the balance parameters it actually played under.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    pub id: RunId,
    pub actor: ActorId,
    pub actor_kind: ActorKind,
    pub status: RunStatus,
    /// Number of the last accepted turn; 0 before the first turn.
    pub current_turn: u32,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    /// Tri-state: None while the outcome is unknown (active or abandoned).
    pub victory: Option<bool>,
    pub config: RunConfig,
}

impl Run {
    pub fn new(actor: ActorId, actor_kind: ActorKind, config: RunConfig, now: DateTime<Utc>) -> Self {
        Self {
            id: RunId::new(),
            actor,
            actor_kind,
            status: RunStatus::Active,
            current_turn: 0,
            started_at: now,
            ended_at: None,
            victory: None,
            config,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == RunStatus::Active
    }

    /// Move the run to a terminal status.
    ///
    /// Status transitions only go `Active -> {Completed, Failed, Abandoned}`;
    /// anything else is rejected.
    pub fn finish(
        &mut self,
        status: RunStatus,
        victory: Option<bool>,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        if self.status != RunStatus::Active || status == RunStatus::Active {
            return Err(DomainError::InvalidStatusTransition {
                from: self.status,
                to: status,
            });
        }
        self.status = status;
        self.victory = victory;
        self.ended_at = Some(now);
        Ok(())
    }
}

/// Who is playing the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorKind {
    Human,
    Agent,
}

impl std::fmt::Display for ActorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Human => write!(f, "human"),
            Self::Agent => write!(f, "agent"),
        }
    }
}

impl std::str::FromStr for ActorKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "agent" => Ok(Self::Agent),
            _ => Ok(Self::Human),
        }
    }
}

/// Lifecycle status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Active,
    Completed,
    Failed,
    Abandoned,
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Active)
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
            Self::Abandoned => write!(f, "abandoned"),
        }
    }
}

impl std::str::FromStr for RunStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "abandoned" => Ok(Self::Abandoned),
            _ => Err(()),
        }
    }
}
