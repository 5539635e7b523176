use crate::data::genome::{Genome, TraitSet};
use serde::{Deserialize, Serialize};

/// Ledger-assigned creature identifier.
pub type CreatureId = u64;

/// A creature as reported by the chain. The engine only ever reads these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Creature {
    pub id: CreatureId,
    /// Owning account address.
    pub owner: String,
    pub name: String,
    pub genome: Genome,
    pub level: u32,
    pub win_count: u32,
    pub loss_count: u32,
    /// Epoch seconds; combat is blocked while `now < ready_time`.
    pub ready_time: i64,
}

impl Creature {
    #[must_use]
    pub fn is_ready(&self, now: i64) -> bool {
        now >= self.ready_time
    }
}

/// Result of a breeding pass, not yet accepted by the chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offspring {
    pub parents: (CreatureId, CreatureId),
    pub genome: Genome,
    pub traits: TraitSet,
    pub is_mutated: bool,
    pub created_at: i64,
}

/// The slice of a creature the ranking pipeline consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatureSnapshot {
    pub id: CreatureId,
    pub owner: String,
    pub level: u32,
    pub win_count: u32,
    pub loss_count: u32,
}

impl From<&Creature> for CreatureSnapshot {
    fn from(c: &Creature) -> Self {
        Self {
            id: c.id,
            owner: c.owner.clone(),
            level: c.level,
            win_count: c.win_count,
            loss_count: c.loss_count,
        }
    }
}
