use crate::model::battle::{BattleHistory, BattleLifecycle};
use crate::model::chain::ChainClient;
use crate::model::config::BattleConfig;
use crate::model::matchmaking::Pairing;
use crate::model::metrics::ArenaMetrics;
use crate::model::persistence::LocalState;
use crate::model::state::{Battle, BattleStatus};
use anyhow::Result;
use std::sync::{Arc, Mutex, PoisonError};
use uuid::Uuid;

/// The battle lifecycle with its history mirrored to `battleHistory`.
pub struct BattleService {
    lifecycle: BattleLifecycle,
    state: LocalState,
    // Orders history writes so an older snapshot never lands last.
    persisting: Mutex<()>,
}

impl BattleService {
    pub fn new(
        chain: Arc<dyn ChainClient>,
        config: &BattleConfig,
        metrics: Arc<ArenaMetrics>,
        state: LocalState,
    ) -> Result<Self> {
        let restored = BattleHistory::from_entries(config.history_capacity, state.battle_history()?);
        tracing::debug!(entries = restored.len(), "Battle history restored");
        let lifecycle = BattleLifecycle::new(chain, config.clone(), metrics).with_history(restored);
        Ok(Self {
            lifecycle,
            state,
            persisting: Mutex::new(()),
        })
    }

    pub async fn start(&self, pairing: Pairing, now: i64) -> Result<Uuid> {
        Ok(self.lifecycle.start(pairing, now).await?)
    }

    pub async fn attack(&self, id: Uuid, now: i64) -> Result<BattleStatus> {
        let status = self.lifecycle.attack(id, now).await?;
        self.persist()?;
        Ok(status)
    }

    pub async fn flee(&self, id: Uuid, now: i64) -> Result<()> {
        self.lifecycle.flee(id, now)?;
        self.persist()
    }

    pub async fn active_battles(&self) -> Vec<Battle> {
        self.lifecycle.active_battles()
    }

    pub async fn battle(&self, id: Uuid) -> Option<Battle> {
        self.lifecycle.battle(id)
    }

    /// Finished battles, newest first.
    pub async fn history(&self) -> Vec<Battle> {
        self.lifecycle.history().to_vec()
    }

    fn persist(&self) -> Result<()> {
        let _order = self.persisting.lock().unwrap_or_else(PoisonError::into_inner);
        self.state.save_battle_history(&self.lifecycle.history().to_vec())?;
        Ok(())
    }
}
