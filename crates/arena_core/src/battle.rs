//! Battle state machine: `pending → active → {resolved-win, resolved-loss, fled}`.
//!
//! Combat itself is resolved by the chain. This module only counts rounds, keeps
//! the human-readable log and classifies the returned counters.

use crate::chain::ChainClient;
use crate::config::BattleConfig;
use crate::error::{ArenaError, Result};
use crate::matchmaking::{Opponent, Pairing};
use crate::metrics::ArenaMetrics;
use arena_data::{Battle, BattleStatus, Combatant, CreatureId};
use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

/// Finished battles, newest first, never longer than its capacity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BattleHistory {
    capacity: usize,
    entries: VecDeque<Battle>,
}

impl BattleHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    /// Restores persisted entries (already newest first), dropping any past the cap.
    pub fn from_entries(capacity: usize, entries: Vec<Battle>) -> Self {
        let mut entries = VecDeque::from(entries);
        entries.truncate(capacity);
        Self { capacity, entries }
    }

    pub fn push(&mut self, battle: Battle) {
        self.entries.push_front(battle);
        self.entries.truncate(self.capacity);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn latest(&self) -> Option<&Battle> {
        self.entries.front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Battle> {
        self.entries.iter()
    }

    pub fn to_vec(&self) -> Vec<Battle> {
        self.entries.iter().cloned().collect()
    }
}

#[derive(Debug)]
struct BattleBook {
    active: Vec<Battle>,
    // Battles whose attack is awaiting the chain.
    attacking: HashSet<Uuid>,
    history: BattleHistory,
}

impl BattleBook {
    fn index_of(&self, id: Uuid) -> Result<usize> {
        self.active
            .iter()
            .position(|b| b.id == id)
            .ok_or_else(|| ArenaError::not_found(format!("battle {}", id)))
    }

    fn archive(&mut self, idx: usize, now: i64, fled: bool, metrics: &ArenaMetrics) {
        let mut battle = self.active.remove(idx);
        battle.ended_at = Some(now);
        metrics.record_battle_end(fled);
        self.history.push(battle);
    }
}

fn lock(book: &Mutex<BattleBook>) -> MutexGuard<'_, BattleBook> {
    book.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Clears the in-flight mark even when the attack future is dropped mid-call.
struct PendingAttack<'a> {
    book: &'a Mutex<BattleBook>,
    id: Uuid,
}

impl Drop for PendingAttack<'_> {
    fn drop(&mut self) {
        lock(self.book).attacking.remove(&self.id);
    }
}

/// Active battles and their history.
///
/// The book is locked only for synchronous steps; chain calls are awaited with
/// no lock held, so a slow submission never stalls other battles.
pub struct BattleLifecycle {
    chain: Arc<dyn ChainClient>,
    config: BattleConfig,
    metrics: Arc<ArenaMetrics>,
    book: Mutex<BattleBook>,
}

impl BattleLifecycle {
    pub fn new(chain: Arc<dyn ChainClient>, config: BattleConfig, metrics: Arc<ArenaMetrics>) -> Self {
        let history = BattleHistory::new(config.history_capacity);
        Self {
            chain,
            config,
            metrics,
            book: Mutex::new(BattleBook {
                active: Vec::new(),
                attacking: HashSet::new(),
                history,
            }),
        }
    }

    #[must_use]
    pub fn with_history(mut self, history: BattleHistory) -> Self {
        self.book
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .history = history;
        self
    }

    pub fn active_battles(&self) -> Vec<Battle> {
        lock(&self.book).active.clone()
    }

    pub fn battle(&self, id: Uuid) -> Option<Battle> {
        lock(&self.book).active.iter().find(|b| b.id == id).cloned()
    }

    pub fn history(&self) -> BattleHistory {
        lock(&self.book).history.clone()
    }

    /// Opens a battle for a delivered pairing and makes it active.
    ///
    /// Human combatants are looked up on the chain first; if a lookup fails the
    /// battle is discarded and the error returned.
    pub async fn start(&self, pairing: Pairing, now: i64) -> Result<Uuid> {
        let Pairing { request, opponent } = pairing;
        let combatant2 = match opponent {
            Opponent::Human(other) => Combatant {
                player: other.player,
                creature_id: other.creature_id,
                creature: None,
                is_synthetic: false,
                initial_wins: 0,
            },
            Opponent::Synthetic(creature) => Combatant {
                player: creature.owner.clone(),
                creature_id: creature.id,
                creature: Some(creature),
                is_synthetic: true,
                initial_wins: 0,
            },
        };
        let mut battle = Battle {
            id: Uuid::new_v4(),
            combatant1: Combatant {
                player: request.player,
                creature_id: request.creature_id,
                creature: None,
                is_synthetic: false,
                initial_wins: 0,
            },
            combatant2,
            round: 1,
            max_rounds: self.config.max_rounds,
            status: BattleStatus::Pending,
            log: Vec::new(),
            started_at: now,
            ended_at: None,
        };

        for side in [&mut battle.combatant1, &mut battle.combatant2] {
            let creature = match side.creature.take() {
                Some(c) => c,
                None => self.chain.fetch_creature(side.creature_id).await.map_err(|e| {
                    tracing::warn!(battle = %battle.id, creature = side.creature_id, error = %e, "Creature lookup failed, battle discarded");
                    e
                })?,
            };
            side.initial_wins = creature.win_count;
            side.creature = Some(creature);
        }

        advance(&mut battle, BattleStatus::Active, "start")?;
        battle.log.push("Battle started! Choose your action.".to_string());
        tracing::info!(
            battle = %battle.id,
            attacker = %battle.combatant1.display_name(),
            defender = %battle.combatant2.display_name(),
            synthetic = battle.combatant2.is_synthetic,
            "Battle started"
        );

        let id = battle.id;
        lock(&self.book).active.push(battle);
        Ok(id)
    }

    /// Submits one attack for `combatant1` and resolves the battle from the
    /// returned win counter. A failed submission leaves the battle active.
    ///
    /// Rejected before reaching the chain when the attacker is still recovering
    /// (`now < ready_time`), when the defender is synthetic, or when another
    /// attack on the same battle is still pending.
    pub async fn attack(&self, id: Uuid, now: i64) -> Result<BattleStatus> {
        let (attacker_id, target_id) = self.prepare_attack(id, now)?;
        let pending = PendingAttack { book: &self.book, id };
        tracing::debug!(battle = %id, "Submitting attack");

        let result = self.chain.submit_attack(attacker_id, target_id).await;
        drop(pending);

        let mut book = lock(&self.book);
        let Ok(idx) = book.index_of(id) else {
            tracing::warn!(battle = %id, "Battle ended while its attack was pending");
            return Err(ArenaError::not_found(format!("battle {}", id)));
        };
        let battle = &mut book.active[idx];
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                battle.log.push(format!("Attack failed: {}", e));
                tracing::warn!(battle = %id, error = %e, "Attack failed");
                return Err(e.into());
            }
        };

        let won = outcome.attacker.win_count > battle.combatant1.initial_wins;
        battle.combatant1.creature = Some(outcome.attacker);
        battle.combatant2.creature = Some(outcome.target);
        let status = if won {
            let line = format!("VICTORY! {} wins!", battle.combatant1.display_name());
            battle.log.push(line);
            BattleStatus::ResolvedWin
        } else {
            let line = format!("DEFEAT! {} wins!", battle.combatant2.display_name());
            battle.log.push(line);
            BattleStatus::ResolvedLoss
        };
        advance(battle, status, "resolve")?;
        tracing::info!(battle = %id, %status, "Battle resolved");

        book.archive(idx, now, false, &self.metrics);
        Ok(status)
    }

    fn prepare_attack(&self, id: Uuid, now: i64) -> Result<(CreatureId, CreatureId)> {
        let mut book = lock(&self.book);
        let idx = book.index_of(id)?;
        if book.attacking.contains(&id) {
            return Err(ArenaError::AttackPending(id));
        }
        let battle = &mut book.active[idx];
        if !battle.status.can_transition_to(&BattleStatus::ResolvedWin) {
            return Err(ArenaError::InvalidTransition {
                id,
                status: battle.status,
                action: "attack",
            });
        }
        if battle.round > battle.max_rounds {
            return Err(ArenaError::RoundLimit {
                id,
                max_rounds: battle.max_rounds,
            });
        }
        if battle.combatant2.is_synthetic {
            return Err(ArenaError::SyntheticOpponent(id));
        }
        if let Some(attacker) = battle.combatant1.creature.as_ref().filter(|c| !c.is_ready(now)) {
            return Err(ArenaError::NotReady {
                id: attacker.id,
                remaining_secs: attacker.ready_time - now,
            });
        }

        let line = format!(
            "Round {}: {} attacks {}!",
            battle.round,
            battle.combatant1.display_name(),
            battle.combatant2.display_name()
        );
        battle.log.push(line);
        battle.round += 1;
        let ids = (battle.combatant1.creature_id, battle.combatant2.creature_id);
        book.attacking.insert(id);
        Ok(ids)
    }

    /// Abandons an active battle without contacting the chain.
    pub fn flee(&self, id: Uuid, now: i64) -> Result<()> {
        let mut book = lock(&self.book);
        let idx = book.index_of(id)?;
        let battle = &mut book.active[idx];
        advance(battle, BattleStatus::Fled, "flee")?;
        let line = format!("{} fled the battle!", battle.combatant1.display_name());
        battle.log.push(line);
        tracing::info!(battle = %id, "Battle fled");

        book.archive(idx, now, true, &self.metrics);
        Ok(())
    }
}

fn advance(battle: &mut Battle, to: BattleStatus, action: &'static str) -> Result<()> {
    if !battle.status.can_transition_to(&to) {
        return Err(ArenaError::InvalidTransition {
            id: battle.id,
            status: battle.status,
            action,
        });
    }
    battle.status = to;
    Ok(())
}
