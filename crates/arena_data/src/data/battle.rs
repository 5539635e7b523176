use crate::data::creature::{Creature, CreatureId};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Account address of the player behind a request.
pub type PlayerId = String;

/// Owner address given to generated opponents.
pub const SYNTHETIC_OWNER: &str = "0x0000000000000000000000000000000000000000";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Waiting,
    Matched,
    Expired,
}

/// A player's request to fight with one of their creatures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleRequest {
    pub id: Uuid,
    pub player: PlayerId,
    pub creature_id: CreatureId,
    /// Epoch seconds.
    pub enqueued_at: i64,
    pub status: RequestStatus,
}

impl BattleRequest {
    pub fn new(player: impl Into<PlayerId>, creature_id: CreatureId, enqueued_at: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            player: player.into(),
            creature_id,
            enqueued_at,
            status: RequestStatus::Waiting,
        }
    }
}

/// Lifecycle of a single encounter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BattleStatus {
    Pending,
    Active,
    ResolvedWin,
    ResolvedLoss,
    Fled,
}

impl BattleStatus {
    pub fn can_transition_to(&self, to: &BattleStatus) -> bool {
        matches!(
            (self, to),
            (BattleStatus::Pending, BattleStatus::Active)
                | (BattleStatus::Active, BattleStatus::ResolvedWin)
                | (BattleStatus::Active, BattleStatus::ResolvedLoss)
                | (BattleStatus::Active, BattleStatus::Fled)
        )
    }

    pub fn valid_next_states(&self) -> Vec<BattleStatus> {
        match self {
            BattleStatus::Pending => vec![BattleStatus::Active],
            BattleStatus::Active => vec![
                BattleStatus::ResolvedWin,
                BattleStatus::ResolvedLoss,
                BattleStatus::Fled,
            ],
            BattleStatus::ResolvedWin | BattleStatus::ResolvedLoss | BattleStatus::Fled => vec![],
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.valid_next_states().is_empty()
    }
}

impl fmt::Display for BattleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BattleStatus::Pending => "pending",
            BattleStatus::Active => "active",
            BattleStatus::ResolvedWin => "resolved-win",
            BattleStatus::ResolvedLoss => "resolved-loss",
            BattleStatus::Fled => "fled",
        };
        f.write_str(s)
    }
}

/// One side of a battle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Combatant {
    pub player: PlayerId,
    pub creature_id: CreatureId,
    /// Filled in once the chain has been asked for the creature's details.
    pub creature: Option<Creature>,
    pub is_synthetic: bool,
    /// Win counter captured when the battle became active.
    pub initial_wins: u32,
}

impl Combatant {
    #[must_use]
    pub fn display_name(&self) -> String {
        match &self.creature {
            Some(c) => c.name.clone(),
            None => format!("Zombie #{}", self.creature_id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Battle {
    pub id: Uuid,
    /// The acting side; attacks are always submitted on its behalf.
    pub combatant1: Combatant,
    pub combatant2: Combatant,
    pub round: u32,
    pub max_rounds: u32,
    pub status: BattleStatus,
    pub log: Vec<String>,
    pub started_at: i64,
    pub ended_at: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states_have_no_exits() {
        for s in [
            BattleStatus::ResolvedWin,
            BattleStatus::ResolvedLoss,
            BattleStatus::Fled,
        ] {
            assert!(s.is_terminal());
            assert!(!s.can_transition_to(&BattleStatus::Active));
        }
        assert!(!BattleStatus::Active.is_terminal());
    }

    #[test]
    fn test_pending_cannot_flee() {
        assert!(!BattleStatus::Pending.can_transition_to(&BattleStatus::Fled));
        assert!(BattleStatus::Active.can_transition_to(&BattleStatus::Fled));
    }

    #[test]
    fn test_status_serializes_kebab_case() {
        let json = serde_json::to_string(&BattleStatus::ResolvedWin).unwrap();
        assert_eq!(json, "\"resolved-win\"");
    }
}
