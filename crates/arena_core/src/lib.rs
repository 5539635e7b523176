//! # Arena Core
//!
//! The simulation and ranking engine behind the zombie arena.
//!
//! This crate contains the deterministic game logic:
//! - Genome expression and encoding
//! - Breeding with per-trait dominance and a single mutation roll
//! - FIFO matchmaking with a timer-driven synthetic-opponent fallback
//! - The battle state machine around chain-resolved attacks
//! - Stable, gap-free player and creature leaderboards
//!
//! All randomness comes from an injected generator, so every outcome can be
//! reproduced from a seed.
//!
//! ## Example
//!
//! ```
//! use arena_core::genetics::GenomeLogic;
//! use arena_data::{Genome, Trait};
//!
//! let genome = Genome::parse("1234567890123456").unwrap();
//! assert_eq!(genome.trait_of(Trait::Strength), 60);
//! assert_eq!(genome.trait_of(Trait::Resilience), 30);
//! ```

/// Battle state machine and capped battle history
pub mod battle;
/// Breeding eligibility, inheritance and mutation
pub mod breeding;
/// Chain collaborator trait and in-memory ledger
pub mod chain;
/// Configuration management for engine tunables
pub mod config;
/// Error taxonomy
pub mod error;
/// Genome expression, encoding and decoding
pub mod genetics;
/// FIFO matchmaking with synthetic fallback
pub mod matchmaking;
/// Counters and logging setup
pub mod metrics;
/// Leaderboard aggregation and snapshot construction
pub mod ranking;

pub use error::{ArenaError, ErrorKind, Result};
