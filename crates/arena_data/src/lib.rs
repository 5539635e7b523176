//! Core data structures for the zombie arena engine.
//!
//! Everything in this crate is plain, serialisable state. Behaviour that derives
//! new values (trait expression, inheritance, ranking) lives in `arena_core`.

pub mod data;

pub use data::battle::{
    Battle, BattleRequest, BattleStatus, Combatant, PlayerId, RequestStatus, SYNTHETIC_OWNER,
};
pub use data::creature::{Creature, CreatureId, CreatureSnapshot, Offspring};
pub use data::genome::{Genome, GenomeError, Rarity, Trait, TraitSet, GENOME_LENGTH};
pub use data::leaderboard::{CreatureEntry, Leaderboard, LeaderboardStats, PlayerEntry};
