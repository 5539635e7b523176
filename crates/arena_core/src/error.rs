//! Error taxonomy for the arena engine.
//!
//! Every failure is local: it is returned to the caller and never leaves shared
//! state (other queue entries, other battles) half-modified.

use crate::chain::ChainError;
use arena_data::{BattleStatus, CreatureId, GenomeError};
use thiserror::Error;
use uuid::Uuid;

/// Broad category of an [`ArenaError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input, rejected before any side effect.
    Validation,
    /// A business rule was violated, rejected before any side effect.
    State,
    /// The chain call failed or reverted.
    Collaborator,
    /// Unknown creature, request or battle id.
    NotFound,
}

/// Why a creature may not breed right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ineligibility {
    LevelTooLow { level: u32, required: u32 },
    CooldownActive { remaining_secs: i64 },
}

impl std::fmt::Display for Ineligibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Ineligibility::LevelTooLow { level, required } => {
                write!(f, "level {} is below the required level {}", level, required)
            }
            Ineligibility::CooldownActive { remaining_secs } => {
                write!(
                    f,
                    "breeding cooldown active, {} remaining",
                    crate::breeding::format_cooldown(*remaining_secs)
                )
            }
        }
    }
}

#[derive(Error, Debug)]
pub enum ArenaError {
    #[error("Invalid genome: {0}")]
    InvalidGenome(#[from] GenomeError),

    #[error("Parents must be two different creatures (both are #{0})")]
    IdenticalParents(CreatureId),

    #[error("Missing selection: {0}")]
    MissingSelection(String),

    #[error("Creature #{id} is not eligible to breed: {reason}")]
    IneligibleParent {
        id: CreatureId,
        reason: Ineligibility,
    },

    #[error("Creature #{0} is already a parent in a breeding awaiting the chain")]
    BreedPending(CreatureId),

    #[error("Player {0} already has a waiting battle request")]
    DuplicateRequest(String),

    #[error("Matchmaking request {0} was cancelled before a pairing was made")]
    MatchCancelled(Uuid),

    #[error("Battle {id} is {status}; cannot {action}")]
    InvalidTransition {
        id: Uuid,
        status: BattleStatus,
        action: &'static str,
    },

    #[error("Battle {id} has used all {max_rounds} rounds")]
    RoundLimit { id: Uuid, max_rounds: u32 },

    #[error("Battle {0} already has an attack awaiting the chain")]
    AttackPending(Uuid),

    #[error("Battle {0} is against a synthetic opponent the ledger cannot resolve")]
    SyntheticOpponent(Uuid),

    #[error(
        "Creature #{id} is not ready to fight, {} remaining",
        crate::breeding::format_cooldown(*.remaining_secs)
    )]
    NotReady { id: CreatureId, remaining_secs: i64 },

    #[error("Chain call failed: {0}")]
    Collaborator(#[from] ChainError),

    #[error("Not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, ArenaError>;

impl ArenaError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            ArenaError::InvalidGenome(_)
            | ArenaError::IdenticalParents(_)
            | ArenaError::MissingSelection(_) => ErrorKind::Validation,
            ArenaError::IneligibleParent { .. }
            | ArenaError::DuplicateRequest(_)
            | ArenaError::MatchCancelled(_)
            | ArenaError::InvalidTransition { .. }
            | ArenaError::BreedPending(_)
            | ArenaError::RoundLimit { .. }
            | ArenaError::AttackPending(_)
            | ArenaError::SyntheticOpponent(_)
            | ArenaError::NotReady { .. } => ErrorKind::State,
            ArenaError::Collaborator(ChainError::UnknownCreature(_)) | ArenaError::NotFound(_) => {
                ErrorKind::NotFound
            }
            ArenaError::Collaborator(_) => ErrorKind::Collaborator,
        }
    }

    #[must_use]
    pub fn not_found<S: Into<String>>(what: S) -> Self {
        Self::NotFound(what.into())
    }
}
