use crate::model::breeding::{
    offspring_name, BreedingEngine, BreedingParent, BreedingRecord, BreedingStats,
    ParentSelection,
};
use crate::model::chain::ChainClient;
use crate::model::config::ArenaConfig;
use crate::model::error::ArenaError;
use crate::model::metrics::ArenaMetrics;
use crate::model::persistence::LocalState;
use crate::model::state::{Creature, CreatureId, Offspring};
use anyhow::Result;
use rand_chacha::ChaCha8Rng;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

/// A breeding accepted by the chain.
#[derive(Debug, Clone)]
pub struct BreedOutcome {
    pub name: String,
    pub offspring: Offspring,
    /// The owner's creatures after the breed, newest last.
    pub owned: Vec<Creature>,
}

/// Runs breeding against the chain and keeps local cooldowns in step with it.
pub struct BreedingService {
    engine: BreedingEngine,
    chain: Arc<dyn ChainClient>,
    state: LocalState,
    metrics: Arc<ArenaMetrics>,
    rng: Mutex<ChaCha8Rng>,
    // Parents of breedings still awaiting the chain.
    in_flight: Mutex<HashSet<CreatureId>>,
}

/// Holds both parents out of other breedings until dropped.
struct ParentReservation<'a> {
    in_flight: &'a Mutex<HashSet<CreatureId>>,
    parents: [CreatureId; 2],
}

impl Drop for ParentReservation<'_> {
    fn drop(&mut self) {
        let mut held = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        for id in &self.parents {
            held.remove(id);
        }
    }
}

impl BreedingService {
    pub fn new(
        config: &ArenaConfig,
        chain: Arc<dyn ChainClient>,
        state: LocalState,
        metrics: Arc<ArenaMetrics>,
        rng: ChaCha8Rng,
    ) -> Self {
        Self {
            engine: BreedingEngine::new(config),
            chain,
            state,
            metrics,
            rng: Mutex::new(rng),
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub fn engine(&self) -> &BreedingEngine {
        &self.engine
    }

    /// The creature from the chain plus its locally tracked last-bred time.
    pub async fn parent(&self, id: CreatureId) -> Result<BreedingParent> {
        let creature = self
            .chain
            .fetch_creature(id)
            .await
            .map_err(ArenaError::from)?;
        let last_bred_at = self.state.breeding_cooldown(id)?;
        Ok(BreedingParent::new(creature, last_bred_at))
    }

    /// Seconds until `id` may breed again.
    pub fn cooldown_remaining(&self, id: CreatureId, now: i64) -> Result<i64> {
        let last_bred_at = self.state.breeding_cooldown(id)?;
        Ok(self.engine.cooldown_remaining(last_bred_at, now))
    }

    /// Breeds the selected pair and submits the offspring.
    ///
    /// Cooldowns and the breeding history are written only after the chain
    /// accepted the offspring; a failed submission changes nothing locally.
    /// While a breed is in progress its parents are refused by any other.
    pub async fn breed(&self, selection: &ParentSelection, now: i64) -> Result<BreedOutcome> {
        let (a, b) = selection.pair()?;
        let _reservation = self.reserve(a, b)?;
        let parent_a = self.parent(a).await?;
        let parent_b = self.parent(b).await?;

        let (offspring, name) = {
            let mut rng = self
                .rng
                .lock()
                .map_err(|_| anyhow::anyhow!("breeding generator poisoned"))?;
            let offspring = self.engine.breed(&parent_a, &parent_b, now, &mut *rng)?;
            (offspring, offspring_name(&mut *rng))
        };

        let owned = self
            .chain
            .submit_breed(a, offspring.genome, &name)
            .await
            .map_err(|e| {
                tracing::warn!(parent_a = a, parent_b = b, error = %e, "Breed submission failed");
                ArenaError::from(e)
            })?;

        self.state.set_breeding_cooldown(a, now)?;
        self.state.set_breeding_cooldown(b, now)?;
        self.state.append_breeding_record(BreedingRecord {
            name: name.clone(),
            offspring: offspring.clone(),
            recorded_at: now,
        })?;
        self.metrics.record_breeding(offspring.is_mutated);
        tracing::info!(
            %name,
            genome = %offspring.genome,
            is_mutated = offspring.is_mutated,
            "Offspring born"
        );

        Ok(BreedOutcome {
            name,
            offspring,
            owned,
        })
    }

    fn reserve(&self, a: CreatureId, b: CreatureId) -> Result<ParentReservation<'_>, ArenaError> {
        let mut held = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(&busy) = [a, b].iter().find(|id| held.contains(*id)) {
            return Err(ArenaError::BreedPending(busy));
        }
        held.insert(a);
        held.insert(b);
        Ok(ParentReservation {
            in_flight: &self.in_flight,
            parents: [a, b],
        })
    }

    pub fn stats(&self) -> Result<BreedingStats> {
        Ok(BreedingStats::from_history(&self.state.breeding_history()?))
    }
}
