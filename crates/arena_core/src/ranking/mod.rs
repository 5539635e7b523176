//! Leaderboard aggregation.
//!
//! [`RankingAggregator::aggregate`] is a pure function of its snapshot: owners
//! are grouped in first-appearance order and both sorts are stable, so equal
//! keys keep that order and the same input always produces the same ranks.

pub mod snapshot;

use crate::config::{PlayerLevelSource, RankingConfig};
use arena_data::{
    CreatureEntry, CreatureId, CreatureSnapshot, Leaderboard, LeaderboardStats, PlayerEntry,
    Rarity,
};
use std::cmp::Reverse;
use std::collections::HashMap;

pub use snapshot::SnapshotBuilder;

/// Viewer-specific decorations applied on top of the ranking.
#[derive(Debug, Clone, Default)]
pub struct RankingOverlay {
    /// The viewing account; its entry is named "You".
    pub viewer: Option<String>,
    /// `customDisplayName:<id>` values.
    pub custom_names: HashMap<CreatureId, String>,
}

#[derive(Debug, Clone, Default)]
pub struct RankingAggregator {
    config: RankingConfig,
}

#[derive(Default)]
struct OwnerTotals {
    address: String,
    creatures: u32,
    // Summed in u64 so no snapshot can overflow a player's totals.
    wins: u64,
    losses: u64,
    max_level: u32,
}

impl RankingAggregator {
    pub fn new(config: RankingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RankingConfig {
        &self.config
    }

    pub fn aggregate(&self, snapshot: &[CreatureSnapshot], overlay: &RankingOverlay) -> Leaderboard {
        let viewer = overlay.viewer.as_deref().map(str::to_lowercase);

        let mut owners: Vec<OwnerTotals> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        for c in snapshot {
            let address = c.owner.to_lowercase();
            let slot = *index.entry(address.clone()).or_insert_with(|| {
                owners.push(OwnerTotals {
                    address,
                    ..Default::default()
                });
                owners.len() - 1
            });
            let totals = &mut owners[slot];
            totals.creatures = totals.creatures.saturating_add(1);
            totals.wins = totals.wins.saturating_add(u64::from(c.win_count));
            totals.losses = totals.losses.saturating_add(u64::from(c.loss_count));
            totals.max_level = totals.max_level.max(c.level);
        }

        let mut players: Vec<PlayerEntry> = owners
            .into_iter()
            .map(|o| {
                let total_battles = o.wins.saturating_add(o.losses);
                let is_current_user = viewer.as_deref() == Some(o.address.as_str());
                PlayerEntry {
                    name: display_name(&o.address, is_current_user),
                    level: match self.config.player_level {
                        PlayerLevelSource::WinDerived => o.wins / 5 + 1,
                        PlayerLevelSource::OnChainMax => u64::from(o.max_level),
                    },
                    total_zombies: o.creatures,
                    total_battles,
                    wins: o.wins,
                    losses: o.losses,
                    win_rate: if total_battles > 0 {
                        o.wins as f64 / total_battles as f64
                    } else {
                        0.0
                    },
                    rank: 0,
                    is_current_user,
                    address: o.address,
                }
            })
            .collect();
        players.sort_by_key(|p| (Reverse(p.wins), Reverse(p.total_zombies), Reverse(p.level)));
        for (i, p) in players.iter_mut().enumerate() {
            p.rank = i + 1;
        }

        let mut creatures: Vec<CreatureEntry> = snapshot
            .iter()
            .map(|c| CreatureEntry {
                id: c.id,
                owner: c.owner.to_lowercase(),
                name: overlay.custom_names.get(&c.id).cloned(),
                level: c.level,
                win_count: c.win_count,
                loss_count: c.loss_count,
                power_level: power_level(c),
                rarity: rarity_for_level(c.level),
                rank: 0,
            })
            .collect();
        creatures.sort_by_key(|c| Reverse(c.power_level));
        for (i, c) in creatures.iter_mut().enumerate() {
            c.rank = i + 1;
        }

        let stats = LeaderboardStats {
            total_players: players.len(),
            total_zombies: creatures.len(),
            total_battles: players
                .iter()
                .fold(0u64, |acc, p| acc.saturating_add(p.total_battles)),
            average_level: if creatures.is_empty() {
                0.0
            } else {
                creatures.iter().map(|c| f64::from(c.level)).sum::<f64>() / creatures.len() as f64
            },
        };

        tracing::debug!(
            players = stats.total_players,
            creatures = stats.total_zombies,
            "Leaderboard aggregated"
        );
        Leaderboard {
            players,
            creatures,
            stats,
        }
    }
}

/// `level + wins - losses`; may be negative.
#[must_use]
pub fn power_level(c: &CreatureSnapshot) -> i64 {
    i64::from(c.level) + i64::from(c.win_count) - i64::from(c.loss_count)
}

#[must_use]
pub fn rarity_for_level(level: u32) -> Rarity {
    match level {
        25.. => Rarity::Legendary,
        15..=24 => Rarity::Epic,
        10..=14 => Rarity::Rare,
        5..=9 => Rarity::Uncommon,
        _ => Rarity::Common,
    }
}

/// `"You"` for the viewer, otherwise the address shortened to `0x1234...abcd`.
#[must_use]
pub fn display_name(address: &str, is_current_user: bool) -> String {
    if is_current_user {
        return "You".to_string();
    }
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 38 {
        return address.to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[38..].iter().collect();
    format!("{}...{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(id: CreatureId, owner: &str, level: u32, wins: u32, losses: u32) -> CreatureSnapshot {
        CreatureSnapshot {
            id,
            owner: owner.to_string(),
            level,
            win_count: wins,
            loss_count: losses,
        }
    }

    #[test]
    fn test_more_creatures_break_win_ties() {
        let mut snapshot = vec![snap(0, "0xA", 1, 10, 0), snap(1, "0xA", 1, 0, 0), snap(2, "0xA", 1, 0, 0)];
        snapshot.extend((3..8).map(|i| snap(i, "0xB", 1, if i == 3 { 10 } else { 0 }, 0)));

        let board = RankingAggregator::default().aggregate(&snapshot, &RankingOverlay::default());
        assert_eq!(board.players[0].address, "0xb");
        assert_eq!(board.players[0].total_zombies, 5);
        assert_eq!(board.player_rank("0xA"), Some(2));
    }

    #[test]
    fn test_full_ties_keep_input_order() {
        let snapshot = vec![
            snap(0, "0xc", 2, 3, 1),
            snap(1, "0xa", 2, 3, 1),
            snap(2, "0xb", 2, 3, 1),
        ];
        let board = RankingAggregator::default().aggregate(&snapshot, &RankingOverlay::default());
        let order: Vec<&str> = board.players.iter().map(|p| p.address.as_str()).collect();
        assert_eq!(order, ["0xc", "0xa", "0xb"]);
        let ranks: Vec<usize> = board.creatures.iter().map(|c| c.rank).collect();
        assert_eq!(ranks, [1, 2, 3]);
        assert_eq!(board.creatures[0].id, 0);
    }

    #[test]
    fn test_owner_grouping_is_case_insensitive() {
        let snapshot = vec![snap(0, "0xAbC", 1, 1, 1), snap(1, "0xabc", 1, 2, 0)];
        let board = RankingAggregator::default().aggregate(&snapshot, &RankingOverlay::default());
        assert_eq!(board.players.len(), 1);
        let p = &board.players[0];
        assert_eq!((p.wins, p.losses, p.total_battles), (3, 1, 4));
        assert_eq!(p.win_rate, 0.75);
    }

    #[test]
    fn test_player_without_battles_has_zero_win_rate() {
        let board = RankingAggregator::default()
            .aggregate(&[snap(0, "0xa", 7, 0, 0)], &RankingOverlay::default());
        assert_eq!(board.players[0].win_rate, 0.0);
        assert_eq!(board.players[0].level, 1);
    }

    #[test]
    fn test_counters_near_u32_max_do_not_overflow() {
        let big = u32::MAX / 2 + 1;
        let snapshot = vec![
            snap(0, "0xa", u32::MAX, big, u32::MAX),
            snap(1, "0xa", 1, big, u32::MAX),
            snap(2, "0xb", 1, 3, 0),
        ];
        let board = RankingAggregator::default().aggregate(&snapshot, &RankingOverlay::default());

        let top = &board.players[0];
        assert_eq!(top.address, "0xa");
        assert_eq!(top.wins, u64::from(big) * 2);
        assert_eq!(top.losses, u64::from(u32::MAX) * 2);
        assert_eq!(top.total_battles, top.wins + top.losses);
        assert_eq!(top.level, u64::from(big) * 2 / 5 + 1);
        assert!(top.win_rate > 0.0 && top.win_rate < 1.0);
        assert_eq!(board.player_rank("0xb"), Some(2));
        assert_eq!(board.stats.total_battles, top.total_battles + 3);
        assert_eq!(board.creatures[0].power_level, i64::from(u32::MAX) + i64::from(big) - i64::from(u32::MAX));
    }

    #[test]
    fn test_player_level_source() {
        let snapshot = vec![snap(0, "0xa", 7, 12, 0), snap(1, "0xa", 3, 0, 0)];
        let derived = RankingAggregator::default().aggregate(&snapshot, &RankingOverlay::default());
        assert_eq!(derived.players[0].level, 3);

        let on_chain = RankingAggregator::new(RankingConfig {
            player_level: PlayerLevelSource::OnChainMax,
            ..Default::default()
        })
        .aggregate(&snapshot, &RankingOverlay::default());
        assert_eq!(on_chain.players[0].level, 7);
    }

    #[test]
    fn test_creature_power_and_rarity() {
        let snapshot = vec![snap(0, "0xa", 2, 0, 9), snap(1, "0xa", 25, 3, 1)];
        let board = RankingAggregator::default().aggregate(&snapshot, &RankingOverlay::default());
        assert_eq!(board.creatures[0].id, 1);
        assert_eq!(board.creatures[0].power_level, 27);
        assert_eq!(board.creatures[0].rarity, Rarity::Legendary);
        assert_eq!(board.creatures[1].power_level, -7);
        assert_eq!(board.creature_rank(0), Some(2));
    }

    #[test]
    fn test_overlay_names_viewer_and_custom_names() {
        let viewer = "0x1234567890123456789012345678901234567890";
        let other = "0xabcdefabcdefabcdefabcdefabcdefabcdef0001";
        let overlay = RankingOverlay {
            viewer: Some(viewer.to_uppercase().replace("0X", "0x")),
            custom_names: HashMap::from([(1, "Brainz".to_string())]),
        };
        let board = RankingAggregator::default()
            .aggregate(&[snap(0, viewer, 1, 5, 0), snap(1, other, 1, 0, 0)], &overlay);

        let me = board.current_user().unwrap();
        assert_eq!(me.name, "You");
        assert_eq!(board.players[1].name, "0xabcd...0001");
        assert_eq!(board.creatures[1].name.as_deref(), Some("Brainz"));
        assert_eq!(board.creatures[0].name, None);
    }

    #[test]
    fn test_stats() {
        let snapshot = vec![snap(0, "0xa", 2, 3, 1), snap(1, "0xb", 4, 0, 2)];
        let board = RankingAggregator::default().aggregate(&snapshot, &RankingOverlay::default());
        assert_eq!(board.stats.total_players, 2);
        assert_eq!(board.stats.total_zombies, 2);
        assert_eq!(board.stats.total_battles, 6);
        assert_eq!(board.stats.average_level, 3.0);

        let empty = RankingAggregator::default().aggregate(&[], &RankingOverlay::default());
        assert_eq!(empty, Leaderboard::default());
    }

    #[test]
    fn test_rarity_for_level_boundaries() {
        assert_eq!(rarity_for_level(4), Rarity::Common);
        assert_eq!(rarity_for_level(5), Rarity::Uncommon);
        assert_eq!(rarity_for_level(10), Rarity::Rare);
        assert_eq!(rarity_for_level(15), Rarity::Epic);
        assert_eq!(rarity_for_level(24), Rarity::Epic);
        assert_eq!(rarity_for_level(25), Rarity::Legendary);
    }

    #[test]
    fn test_short_address_is_not_truncated() {
        assert_eq!(display_name("0xshort", false), "0xshort");
    }
}
