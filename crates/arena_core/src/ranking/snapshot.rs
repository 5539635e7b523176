//! Builds the flat creature snapshot the aggregator ranks.

use crate::chain::ChainClient;
use crate::error::Result;
use crate::metrics::ArenaMetrics;
use arena_data::CreatureSnapshot;
use futures::stream::{self, StreamExt};
use std::sync::Arc;

pub struct SnapshotBuilder {
    chain: Arc<dyn ChainClient>,
    concurrency: usize,
    metrics: Arc<ArenaMetrics>,
}

impl SnapshotBuilder {
    pub fn new(chain: Arc<dyn ChainClient>, concurrency: usize, metrics: Arc<ArenaMetrics>) -> Self {
        Self {
            chain,
            concurrency: concurrency.max(1),
            metrics,
        }
    }

    /// Every creature ever created, in creation order.
    ///
    /// Lookups run `concurrency` at a time. A creature whose lookup fails is
    /// logged and left out; only a failed event query aborts the scan.
    pub async fn full_scan(&self) -> Result<Vec<CreatureSnapshot>> {
        let events = self.chain.query_creation_events().await?;
        let total = events.len();

        let results: Vec<_> = stream::iter(events)
            .map(|event| {
                let chain = Arc::clone(&self.chain);
                async move { (event.creature_id, chain.fetch_creature(event.creature_id).await) }
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut snapshot = Vec::with_capacity(total);
        for (id, result) in results {
            match result {
                Ok(creature) => snapshot.push(CreatureSnapshot::from(&creature)),
                Err(e) => {
                    tracing::warn!(creature = id, error = %e, "Skipping creature in snapshot");
                    self.metrics.record_snapshot_skip();
                }
            }
        }
        tracing::info!(total, kept = snapshot.len(), "Full scan complete");
        Ok(snapshot)
    }

    /// Creatures of the given owners only. An owner whose lookup fails is skipped.
    pub async fn owner_scan(&self, owners: &[String]) -> Vec<CreatureSnapshot> {
        let mut snapshot = Vec::new();
        for owner in owners {
            match self.chain.fetch_owned_creatures(owner).await {
                Ok(creatures) => snapshot.extend(creatures.iter().map(CreatureSnapshot::from)),
                Err(e) => {
                    tracing::warn!(%owner, error = %e, "Skipping owner in snapshot");
                    self.metrics.record_snapshot_skip();
                }
            }
        }
        snapshot
    }
}
