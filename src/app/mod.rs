//! Application layer: engine components bound to a chain and persisted state.

pub mod battles;
pub mod breeding;
pub mod leaderboard;

use crate::model::chain::ChainClient;
use crate::model::config::ArenaConfig;
use crate::model::matchmaking::{EnqueueOutcome, MatchmakingQueue};
use crate::model::metrics::ArenaMetrics;
use crate::model::persistence::{KeyValueStore, LocalState};
use crate::model::state::{BattleRequest, CreatureId};
use anyhow::Result;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;
use uuid::Uuid;

pub use battles::BattleService;
pub use breeding::{BreedOutcome, BreedingService};
pub use leaderboard::{LeaderboardService, SnapshotSource};

/// Current time as epoch seconds.
#[must_use]
pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

pub struct Arena {
    config: ArenaConfig,
    metrics: Arc<ArenaMetrics>,
    state: LocalState,
    pub breeding: BreedingService,
    pub matchmaking: MatchmakingQueue,
    pub battles: BattleService,
    pub leaderboard: LeaderboardService,
}

impl Arena {
    /// Validates `config`, restores persisted battle history and wires every component.
    ///
    /// Each component draws from its own generator, seeded in turn from the
    /// configured seed, so one component's draws never shift another's.
    pub fn new(
        config: ArenaConfig,
        chain: Arc<dyn ChainClient>,
        store: Arc<dyn KeyValueStore>,
    ) -> Result<Self> {
        config.validate()?;
        let metrics = Arc::new(ArenaMetrics::new());
        let state = LocalState::new(store);
        let mut master = config.make_rng();

        let breeding = BreedingService::new(
            &config,
            Arc::clone(&chain),
            state.clone(),
            Arc::clone(&metrics),
            ChaCha8Rng::seed_from_u64(master.gen()),
        );
        let matchmaking = MatchmakingQueue::new(
            config.matchmaking.clone(),
            ChaCha8Rng::seed_from_u64(master.gen()),
            Arc::clone(&metrics),
        );
        let battles = BattleService::new(
            Arc::clone(&chain),
            &config.battle,
            Arc::clone(&metrics),
            state.clone(),
        )?;
        let leaderboard =
            LeaderboardService::new(chain, &config.ranking, Arc::clone(&metrics), state.clone());

        tracing::info!(
            fingerprint = %config.fingerprint(),
            seed = ?config.seed,
            "Arena ready"
        );
        Ok(Self {
            config,
            metrics,
            state,
            breeding,
            matchmaking,
            battles,
            leaderboard,
        })
    }

    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    pub fn metrics(&self) -> &Arc<ArenaMetrics> {
        &self.metrics
    }

    pub fn state(&self) -> &LocalState {
        &self.state
    }

    /// Queues `creature_id` for `player`, waits for an opponent and opens the battle.
    pub async fn find_battle(&self, player: &str, creature_id: CreatureId, now: i64) -> Result<Uuid> {
        let pairing = match self
            .matchmaking
            .enqueue(BattleRequest::new(player, creature_id, now))?
        {
            EnqueueOutcome::Matched(pairing) => pairing,
            EnqueueOutcome::Waiting(pending) => pending.wait().await?,
        };
        self.battles.start(pairing, now).await
    }
}
