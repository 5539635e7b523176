//! FIFO matchmaking with a cancellable synthetic-opponent fallback.
//!
//! A request that finds no human opponent waits on a oneshot channel while a
//! spawned timer sleeps for a random delay. Whichever side removes the entry
//! from the waiting list under the lock owns the pairing: a human arrival
//! aborts the timer, and a timer that wakes to find its entry gone does nothing.

use crate::config::MatchmakingConfig;
use crate::error::{ArenaError, Result};
use crate::genetics::random_genome;
use crate::metrics::ArenaMetrics;
use arena_data::{BattleRequest, Creature, CreatureId, PlayerId, RequestStatus, SYNTHETIC_OWNER};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Opponent {
    Human(BattleRequest),
    Synthetic(Creature),
}

impl Opponent {
    #[must_use]
    pub fn is_synthetic(&self) -> bool {
        matches!(self, Opponent::Synthetic(_))
    }

    #[must_use]
    pub fn player(&self) -> &str {
        match self {
            Opponent::Human(request) => &request.player,
            Opponent::Synthetic(creature) => &creature.owner,
        }
    }

    #[must_use]
    pub fn creature_id(&self) -> CreatureId {
        match self {
            Opponent::Human(request) => request.creature_id,
            Opponent::Synthetic(creature) => creature.id,
        }
    }
}

/// A matched request and who it was matched against. Both sides are `Matched`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pairing {
    pub request: BattleRequest,
    pub opponent: Opponent,
}

/// Handle to a request still waiting for an opponent.
#[derive(Debug)]
pub struct PendingMatch {
    request_id: Uuid,
    receiver: oneshot::Receiver<Pairing>,
}

impl PendingMatch {
    #[must_use]
    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// Resolves with the pairing, or `MatchCancelled` if the request was cancelled.
    pub async fn wait(self) -> Result<Pairing> {
        self.receiver
            .await
            .map_err(|_| ArenaError::MatchCancelled(self.request_id))
    }
}

#[derive(Debug)]
pub enum EnqueueOutcome {
    /// Paired with an already-waiting human.
    Matched(Pairing),
    Waiting(PendingMatch),
}

/// Display row for a queued request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedRequest {
    pub request_id: Uuid,
    pub player: PlayerId,
    pub creature_id: CreatureId,
    pub enqueued_at: i64,
}

struct WaitingEntry {
    request: BattleRequest,
    reply: oneshot::Sender<Pairing>,
    fallback: Option<JoinHandle<()>>,
}

impl WaitingEntry {
    fn abort_fallback(&mut self) {
        if let Some(handle) = self.fallback.take() {
            handle.abort();
        }
    }
}

struct QueueState<R> {
    waiting: Vec<WaitingEntry>,
    rng: R,
}

fn lock<R>(state: &Mutex<QueueState<R>>) -> MutexGuard<'_, QueueState<R>> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct MatchmakingQueue<R = ChaCha8Rng> {
    state: Arc<Mutex<QueueState<R>>>,
    config: MatchmakingConfig,
    metrics: Arc<ArenaMetrics>,
}

impl<R> MatchmakingQueue<R>
where
    R: Rng + Send + 'static,
{
    pub fn new(config: MatchmakingConfig, rng: R, metrics: Arc<ArenaMetrics>) -> Self {
        Self {
            state: Arc::new(Mutex::new(QueueState {
                waiting: Vec::new(),
                rng,
            })),
            config,
            metrics,
        }
    }

    /// Pairs `request` with the oldest waiting request from another player, or
    /// queues it and arms the fallback timer.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn enqueue(&self, mut request: BattleRequest) -> Result<EnqueueOutcome> {
        let mut state = lock(&self.state);

        // Requests whose waiter has gone away can never be delivered.
        state.waiting.retain_mut(|entry| {
            let open = !entry.reply.is_closed();
            if !open {
                entry.abort_fallback();
            }
            open
        });

        if state
            .waiting
            .iter()
            .any(|e| e.request.player.eq_ignore_ascii_case(&request.player))
        {
            return Err(ArenaError::DuplicateRequest(request.player));
        }

        if let Some(pos) = state
            .waiting
            .iter()
            .position(|e| !e.request.player.eq_ignore_ascii_case(&request.player))
        {
            let mut entry = state.waiting.remove(pos);
            drop(state);
            entry.abort_fallback();

            let mut waiting_request = entry.request;
            waiting_request.status = RequestStatus::Matched;
            request.status = RequestStatus::Matched;
            tracing::info!(
                request = %request.id,
                opponent = %waiting_request.id,
                "Paired with waiting player"
            );
            self.metrics.record_pairing(false);

            // Send may only fail if the waiter dropped its handle after the prune above.
            let _ = entry.reply.send(Pairing {
                request: waiting_request.clone(),
                opponent: Opponent::Human(request.clone()),
            });
            return Ok(EnqueueOutcome::Matched(Pairing {
                request,
                opponent: Opponent::Human(waiting_request),
            }));
        }

        request.status = RequestStatus::Waiting;
        let delay_ms = state
            .rng
            .gen_range(self.config.fallback_min_ms..=self.config.fallback_max_ms);
        let (reply, receiver) = oneshot::channel();
        let fallback = tokio::spawn(fire_fallback(
            Arc::clone(&self.state),
            request.id,
            Duration::from_millis(delay_ms),
            self.config.clone(),
            Arc::clone(&self.metrics),
        ));
        tracing::debug!(request = %request.id, delay_ms, "Waiting for opponent");

        let request_id = request.id;
        state.waiting.push(WaitingEntry {
            request,
            reply,
            fallback: Some(fallback),
        });
        Ok(EnqueueOutcome::Waiting(PendingMatch {
            request_id,
            receiver,
        }))
    }

    /// Removes a waiting request and disarms its timer. Returns the request marked
    /// `Expired`, or `None` when it was already matched or never queued.
    pub fn cancel(&self, request_id: Uuid) -> Option<BattleRequest> {
        let mut state = lock(&self.state);
        let pos = state
            .waiting
            .iter()
            .position(|e| e.request.id == request_id)?;
        let mut entry = state.waiting.remove(pos);
        drop(state);

        entry.abort_fallback();
        let mut request = entry.request;
        request.status = RequestStatus::Expired;
        tracing::info!(request = %request_id, "Matchmaking request cancelled");
        Some(request)
    }

    /// Requests currently waiting, oldest first.
    pub fn waiting(&self) -> Vec<QueuedRequest> {
        lock(&self.state)
            .waiting
            .iter()
            .map(|e| QueuedRequest {
                request_id: e.request.id,
                player: e.request.player.clone(),
                creature_id: e.request.creature_id,
                enqueued_at: e.request.enqueued_at,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        lock(&self.state).waiting.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

async fn fire_fallback<R: Rng>(
    state: Arc<Mutex<QueueState<R>>>,
    request_id: Uuid,
    delay: Duration,
    config: MatchmakingConfig,
    metrics: Arc<ArenaMetrics>,
) {
    tokio::time::sleep(delay).await;

    let (entry, opponent) = {
        let mut guard = lock(&state);
        let Some(pos) = guard.waiting.iter().position(|e| e.request.id == request_id) else {
            return;
        };
        let entry = guard.waiting.remove(pos);
        let opponent = synthetic_opponent(&mut guard.rng, &config);
        (entry, opponent)
    };

    let mut request = entry.request;
    request.status = RequestStatus::Matched;
    tracing::info!(
        request = %request.id,
        opponent = %opponent.name,
        level = opponent.level,
        "No human opponent, paired with synthetic opponent"
    );
    metrics.record_pairing(true);
    let _ = entry.reply.send(Pairing {
        request,
        opponent: Opponent::Synthetic(opponent),
    });
}

/// A stand-in opponent owned by [`SYNTHETIC_OWNER`].
pub fn synthetic_opponent<R: Rng>(rng: &mut R, config: &MatchmakingConfig) -> Creature {
    Creature {
        id: rng.gen_range(0..1000),
        owner: SYNTHETIC_OWNER.to_string(),
        name: format!("AI Zombie {}", rng.gen_range(0..100)),
        genome: random_genome(rng),
        level: rng.gen_range(config.synthetic_level_min..=config.synthetic_level_max),
        win_count: rng.gen_range(0..config.synthetic_max_wins),
        loss_count: rng.gen_range(0..config.synthetic_max_losses),
        ready_time: 0,
    }
}
