use crate::data::creature::CreatureId;
use crate::data::genome::Rarity;
use serde::{Deserialize, Serialize};

/// Aggregated, recomputed-per-pass view of one owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerEntry {
    pub address: String,
    pub name: String,
    pub level: u64,
    pub total_zombies: u32,
    pub total_battles: u64,
    pub wins: u64,
    pub losses: u64,
    /// `wins / total_battles`, 0 when no battles were fought.
    pub win_rate: f64,
    pub rank: usize,
    pub is_current_user: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatureEntry {
    pub id: CreatureId,
    pub owner: String,
    /// Optional display overlay chosen by the owner.
    pub name: Option<String>,
    pub level: u32,
    pub win_count: u32,
    pub loss_count: u32,
    pub power_level: i64,
    pub rarity: Rarity,
    pub rank: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct LeaderboardStats {
    pub total_players: usize,
    pub total_zombies: usize,
    pub total_battles: u64,
    pub average_level: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Leaderboard {
    pub players: Vec<PlayerEntry>,
    pub creatures: Vec<CreatureEntry>,
    pub stats: LeaderboardStats,
}

impl Leaderboard {
    /// 1-based rank of `address`, compared case-insensitively.
    #[must_use]
    pub fn player_rank(&self, address: &str) -> Option<usize> {
        self.players
            .iter()
            .find(|p| p.address.eq_ignore_ascii_case(address))
            .map(|p| p.rank)
    }

    #[must_use]
    pub fn creature_rank(&self, id: CreatureId) -> Option<usize> {
        self.creatures.iter().find(|c| c.id == id).map(|c| c.rank)
    }

    #[must_use]
    pub fn top_players(&self, n: usize) -> &[PlayerEntry] {
        &self.players[..n.min(self.players.len())]
    }

    #[must_use]
    pub fn top_creatures(&self, n: usize) -> &[CreatureEntry] {
        &self.creatures[..n.min(self.creatures.len())]
    }

    #[must_use]
    pub fn current_user(&self) -> Option<&PlayerEntry> {
        self.players.iter().find(|p| p.is_current_user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(address: &str, rank: usize) -> PlayerEntry {
        PlayerEntry {
            address: address.to_string(),
            name: address.to_string(),
            level: 1,
            total_zombies: 1,
            total_battles: 0,
            wins: 0,
            losses: 0,
            win_rate: 0.0,
            rank,
            is_current_user: rank == 2,
        }
    }

    #[test]
    fn test_lookups() {
        let board = Leaderboard {
            players: vec![player("0xaa", 1), player("0xbb", 2)],
            ..Default::default()
        };
        assert_eq!(board.player_rank("0xBB"), Some(2));
        assert_eq!(board.player_rank("0xcc"), None);
        assert_eq!(board.creature_rank(1), None);
        assert_eq!(board.top_players(1).len(), 1);
        assert_eq!(board.top_players(10).len(), 2);
        assert_eq!(board.current_user().map(|p| p.rank), Some(2));
    }
}
