use crate::model::chain::ChainClient;
use crate::model::config::RankingConfig;
use crate::model::error::ArenaError;
use crate::model::metrics::ArenaMetrics;
use crate::model::persistence::{CachedSnapshot, LocalState};
use crate::model::ranking::{RankingAggregator, RankingOverlay, SnapshotBuilder};
use crate::model::state::{CreatureSnapshot, Leaderboard};
use anyhow::Result;
use std::sync::Arc;

/// Where the creature list for a ranking pass comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotSource {
    /// Every creature ever created.
    FullScan,
    /// Only these owners' creatures.
    Owners(Vec<String>),
    /// The last snapshot taken, without touching the chain.
    Cached,
}

pub struct LeaderboardService {
    aggregator: RankingAggregator,
    builder: SnapshotBuilder,
    state: LocalState,
}

impl LeaderboardService {
    pub fn new(
        chain: Arc<dyn ChainClient>,
        config: &RankingConfig,
        metrics: Arc<ArenaMetrics>,
        state: LocalState,
    ) -> Self {
        Self {
            aggregator: RankingAggregator::new(config.clone()),
            builder: SnapshotBuilder::new(chain, config.scan_concurrency, metrics),
            state,
        }
    }

    pub async fn snapshot(&self, source: &SnapshotSource, now: i64) -> Result<Vec<CreatureSnapshot>> {
        let creatures = match source {
            SnapshotSource::FullScan => self.builder.full_scan().await?,
            SnapshotSource::Owners(owners) => self.builder.owner_scan(owners).await,
            SnapshotSource::Cached => {
                return self
                    .state
                    .leaderboard_snapshot()?
                    .map(|cached| cached.creatures)
                    .ok_or_else(|| ArenaError::not_found("cached leaderboard snapshot").into());
            }
        };
        self.state.save_leaderboard_snapshot(&CachedSnapshot {
            taken_at: now,
            creatures: creatures.clone(),
        })?;
        Ok(creatures)
    }

    /// Ranks `creatures` for `viewer`, applying stored display names.
    pub fn rank(&self, creatures: &[CreatureSnapshot], viewer: Option<&str>) -> Result<Leaderboard> {
        let overlay = RankingOverlay {
            viewer: viewer.map(str::to_string),
            custom_names: self
                .state
                .custom_display_names(creatures.iter().map(|c| c.id))?,
        };
        Ok(self.aggregator.aggregate(creatures, &overlay))
    }

    pub async fn refresh(
        &self,
        source: &SnapshotSource,
        viewer: Option<&str>,
        now: i64,
    ) -> Result<Leaderboard> {
        let creatures = self.snapshot(source, now).await?;
        let board = self.rank(&creatures, viewer)?;
        tracing::info!(
            players = board.stats.total_players,
            creatures = board.stats.total_zombies,
            "Leaderboard refreshed"
        );
        Ok(board)
    }
}
