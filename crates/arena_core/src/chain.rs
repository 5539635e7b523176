//! The authoritative ledger, seen from the engine.
//!
//! Every state-changing call is submitted exactly once; the engine never retries.

use arena_data::{Creature, CreatureId, Genome};
use async_trait::async_trait;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    #[error("transaction reverted: {0}")]
    Reverted(String),
    #[error("chain unavailable: {0}")]
    Unavailable(String),
    #[error("unknown creature #{0}")]
    UnknownCreature(CreatureId),
}

/// Both creatures as the ledger reports them after an attack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackOutcome {
    pub attacker: Creature,
    pub target: Creature,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreationEvent {
    pub creature_id: CreatureId,
    pub owner: String,
}

#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn fetch_owned_creatures(&self, owner: &str) -> Result<Vec<Creature>, ChainError>;

    async fn fetch_creature(&self, id: CreatureId) -> Result<Creature, ChainError>;

    /// The ledger decides the outcome; the returned counters are authoritative.
    async fn submit_attack(
        &self,
        attacker: CreatureId,
        target: CreatureId,
    ) -> Result<AttackOutcome, ChainError>;

    /// Returns the owner's full creature list, newest last.
    async fn submit_breed(
        &self,
        parent: CreatureId,
        genome: Genome,
        offspring_name: &str,
    ) -> Result<Vec<Creature>, ChainError>;

    async fn query_creation_events(&self) -> Result<Vec<CreationEvent>, ChainError>;
}

/// Attacker victory probability used by the deployed contract.
pub const ATTACK_VICTORY_PROBABILITY: f64 = 0.7;

struct Ledger {
    creatures: BTreeMap<CreatureId, Creature>,
    next_id: CreatureId,
    rng: ChaCha8Rng,
    failing_fetches: HashSet<CreatureId>,
    fail_next_attack: Option<String>,
    fail_next_breed: Option<String>,
    submitted_attacks: usize,
}

/// In-memory ledger for the CLI and tests.
///
/// Attacks are resolved with a seeded generator. Failures can be injected per
/// creature for `fetch_creature`, or for the next attack or breed submission.
pub struct LocalChain {
    ledger: Mutex<Ledger>,
}

impl LocalChain {
    pub fn new(seed: u64) -> Self {
        Self {
            ledger: Mutex::new(Ledger {
                creatures: BTreeMap::new(),
                next_id: 0,
                rng: ChaCha8Rng::seed_from_u64(seed),
                failing_fetches: HashSet::new(),
                fail_next_attack: None,
                fail_next_breed: None,
                submitted_attacks: 0,
            }),
        }
    }

    fn ledger(&self) -> Result<MutexGuard<'_, Ledger>, ChainError> {
        self.ledger
            .lock()
            .map_err(|_| ChainError::Unavailable("ledger lock poisoned".into()))
    }

    /// Mints a creature directly, bypassing breeding. Returns the new id.
    pub fn mint(
        &self,
        owner: &str,
        name: &str,
        genome: Genome,
        level: u32,
        wins: u32,
        losses: u32,
    ) -> Result<CreatureId, ChainError> {
        let mut ledger = self.ledger()?;
        let id = ledger.next_id;
        ledger.next_id += 1;
        ledger.creatures.insert(
            id,
            Creature {
                id,
                owner: owner.to_string(),
                name: name.to_string(),
                genome,
                level,
                win_count: wins,
                loss_count: losses,
                ready_time: 0,
            },
        );
        Ok(id)
    }

    /// Sets the epoch second from which `id` may fight again.
    pub fn set_ready_time(&self, id: CreatureId, ready_time: i64) -> Result<(), ChainError> {
        let mut ledger = self.ledger()?;
        let creature = ledger
            .creatures
            .get_mut(&id)
            .ok_or(ChainError::UnknownCreature(id))?;
        creature.ready_time = ready_time;
        Ok(())
    }

    pub fn fail_fetch_of(&self, id: CreatureId) -> Result<(), ChainError> {
        self.ledger()?.failing_fetches.insert(id);
        Ok(())
    }

    pub fn fail_next_attack(&self, reason: &str) -> Result<(), ChainError> {
        self.ledger()?.fail_next_attack = Some(reason.to_string());
        Ok(())
    }

    pub fn fail_next_breed(&self, reason: &str) -> Result<(), ChainError> {
        self.ledger()?.fail_next_breed = Some(reason.to_string());
        Ok(())
    }

    /// Attacks that reached the ledger, successful or not.
    pub fn submitted_attacks(&self) -> usize {
        self.ledger().map(|l| l.submitted_attacks).unwrap_or(0)
    }

    pub fn creature_count(&self) -> usize {
        self.ledger().map(|l| l.creatures.len()).unwrap_or(0)
    }
}

impl Ledger {
    fn get(&self, id: CreatureId) -> Result<&Creature, ChainError> {
        self.creatures
            .get(&id)
            .ok_or(ChainError::UnknownCreature(id))
    }

    fn owned_by(&self, owner: &str) -> Vec<Creature> {
        self.creatures
            .values()
            .filter(|c| c.owner.eq_ignore_ascii_case(owner))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ChainClient for LocalChain {
    async fn fetch_owned_creatures(&self, owner: &str) -> Result<Vec<Creature>, ChainError> {
        Ok(self.ledger()?.owned_by(owner))
    }

    async fn fetch_creature(&self, id: CreatureId) -> Result<Creature, ChainError> {
        let ledger = self.ledger()?;
        if ledger.failing_fetches.contains(&id) {
            return Err(ChainError::Unavailable(format!("lookup of #{} timed out", id)));
        }
        let creature = ledger.get(id)?.clone();
        Ok(creature)
    }

    async fn submit_attack(
        &self,
        attacker: CreatureId,
        target: CreatureId,
    ) -> Result<AttackOutcome, ChainError> {
        let mut ledger = self.ledger()?;
        ledger.submitted_attacks += 1;
        if let Some(reason) = ledger.fail_next_attack.take() {
            return Err(ChainError::Reverted(reason));
        }
        if attacker == target {
            return Err(ChainError::Reverted("a zombie cannot attack itself".into()));
        }
        ledger.get(attacker)?;
        ledger.get(target)?;

        let attacker_won = ledger.rng.gen_bool(ATTACK_VICTORY_PROBABILITY);
        let (winner, loser) = if attacker_won {
            (attacker, target)
        } else {
            (target, attacker)
        };
        if let Some(c) = ledger.creatures.get_mut(&winner) {
            c.win_count += 1;
            if winner == attacker {
                c.level += 1;
            }
        }
        if let Some(c) = ledger.creatures.get_mut(&loser) {
            c.loss_count += 1;
        }

        let outcome = AttackOutcome {
            attacker: ledger.get(attacker)?.clone(),
            target: ledger.get(target)?.clone(),
        };
        Ok(outcome)
    }

    async fn submit_breed(
        &self,
        parent: CreatureId,
        genome: Genome,
        offspring_name: &str,
    ) -> Result<Vec<Creature>, ChainError> {
        let mut ledger = self.ledger()?;
        if let Some(reason) = ledger.fail_next_breed.take() {
            return Err(ChainError::Reverted(reason));
        }
        let owner = ledger.get(parent)?.owner.clone();
        let id = ledger.next_id;
        ledger.next_id += 1;
        ledger.creatures.insert(
            id,
            Creature {
                id,
                owner: owner.clone(),
                name: offspring_name.to_string(),
                genome,
                level: 1,
                win_count: 0,
                loss_count: 0,
                ready_time: 0,
            },
        );
        Ok(ledger.owned_by(&owner))
    }

    async fn query_creation_events(&self) -> Result<Vec<CreationEvent>, ChainError> {
        Ok(self
            .ledger()?
            .creatures
            .values()
            .map(|c| CreationEvent {
                creature_id: c.id,
                owner: c.owner.clone(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn genome() -> Genome {
        Genome::parse("1234567890123456").unwrap()
    }

    #[tokio::test]
    async fn test_attack_moves_counters_on_exactly_one_side() {
        let chain = LocalChain::new(3);
        let a = chain.mint("0xa", "A", genome(), 2, 0, 0).unwrap();
        let b = chain.mint("0xb", "B", genome(), 2, 0, 0).unwrap();

        for _ in 0..20 {
            let before_a = chain.fetch_creature(a).await.unwrap();
            let outcome = chain.submit_attack(a, b).await.unwrap();
            let won = outcome.attacker.win_count > before_a.win_count;
            if won {
                assert_eq!(outcome.attacker.level, before_a.level + 1);
                assert_eq!(outcome.attacker.loss_count, before_a.loss_count);
            } else {
                assert_eq!(outcome.attacker.loss_count, before_a.loss_count + 1);
            }
        }
        assert_eq!(chain.submitted_attacks(), 20);
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let chain = LocalChain::new(1);
        let a = chain.mint("0xa", "A", genome(), 1, 0, 0).unwrap();
        let b = chain.mint("0xb", "B", genome(), 1, 0, 0).unwrap();

        chain.fail_fetch_of(a).unwrap();
        assert!(matches!(
            chain.fetch_creature(a).await,
            Err(ChainError::Unavailable(_))
        ));

        chain.fail_next_attack("out of gas").unwrap();
        assert_eq!(
            chain.submit_attack(a, b).await,
            Err(ChainError::Reverted("out of gas".into()))
        );
        assert!(chain.submit_attack(a, b).await.is_ok());
        assert_eq!(
            chain.fetch_creature(99).await,
            Err(ChainError::UnknownCreature(99))
        );
    }

    #[tokio::test]
    async fn test_breed_appends_newest_last() {
        let chain = LocalChain::new(1);
        let parent = chain.mint("0xAbc", "P", genome(), 3, 0, 0).unwrap();
        chain.mint("0xother", "X", genome(), 3, 0, 0).unwrap();

        let owned = chain
            .submit_breed(parent, genome(), "Feral Heir 7")
            .await
            .unwrap();
        assert_eq!(owned.len(), 2);
        let child = owned.last().unwrap();
        assert_eq!(child.name, "Feral Heir 7");
        assert_eq!(child.owner, "0xAbc");
        assert_eq!(child.level, 1);

        let events = chain.query_creation_events().await.unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(events[2].creature_id, child.id);
    }

    #[tokio::test]
    async fn test_set_ready_time() {
        let chain = LocalChain::new(2);
        let a = chain.mint("0xa", "A", genome(), 1, 0, 0).unwrap();
        chain.set_ready_time(a, 500).unwrap();
        assert_eq!(chain.fetch_creature(a).await.unwrap().ready_time, 500);
        assert_eq!(
            chain.set_ready_time(99, 500),
            Err(ChainError::UnknownCreature(99))
        );
    }
}
