//! Core data structures for the arena simulation.

pub mod battle;
pub mod creature;
pub mod genome;
pub mod leaderboard;
