//! Typed accessors over the persisted keys.
//!
//! | key | value |
//! |-----|-------|
//! | `battleHistory` | finished battles, newest first |
//! | `breedingCooldown:<id>` | last-bred epoch seconds |
//! | `customDisplayName:<id>` | owner-chosen creature name |
//! | `breedingHistory` | accepted breedings, oldest first |
//! | `leaderboardSnapshot` | last creature snapshot used for ranking |

use crate::error::Result;
use crate::serialization::{from_json, to_json};
use crate::storage::KeyValueStore;
use arena_core::breeding::BreedingRecord;
use arena_data::{Battle, CreatureId, CreatureSnapshot};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

pub const BATTLE_HISTORY_KEY: &str = "battleHistory";
pub const BREEDING_HISTORY_KEY: &str = "breedingHistory";
pub const LEADERBOARD_SNAPSHOT_KEY: &str = "leaderboardSnapshot";

fn cooldown_key(id: CreatureId) -> String {
    format!("breedingCooldown:{}", id)
}

fn display_name_key(id: CreatureId) -> String {
    format!("customDisplayName:{}", id)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedSnapshot {
    pub taken_at: i64,
    pub creatures: Vec<CreatureSnapshot>,
}

#[derive(Clone)]
pub struct LocalState {
    store: Arc<dyn KeyValueStore>,
}

impl LocalState {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    fn read<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: for<'de> Deserialize<'de>,
    {
        match self.store.get(key)? {
            Some(raw) => from_json(&raw)
                .map(Some)
                .map_err(|e| e.with_context(format!("reading {}", key))),
            None => Ok(None),
        }
    }

    fn write<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        self.store.set(key, to_json(value)?)
    }

    pub fn battle_history(&self) -> Result<Vec<Battle>> {
        Ok(self.read(BATTLE_HISTORY_KEY)?.unwrap_or_default())
    }

    /// Stores `history` as given; capping is the caller's responsibility.
    pub fn save_battle_history(&self, history: &[Battle]) -> Result<()> {
        self.write(BATTLE_HISTORY_KEY, &history)
    }

    pub fn breeding_cooldown(&self, id: CreatureId) -> Result<Option<i64>> {
        self.read(&cooldown_key(id))
    }

    pub fn set_breeding_cooldown(&self, id: CreatureId, last_bred_at: i64) -> Result<()> {
        self.write(&cooldown_key(id), &last_bred_at)
    }

    pub fn custom_display_name(&self, id: CreatureId) -> Result<Option<String>> {
        self.read(&display_name_key(id))
    }

    /// Blank names clear the overlay.
    pub fn set_custom_display_name(&self, id: CreatureId, name: &str) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            return self.store.remove(&display_name_key(id));
        }
        self.write(&display_name_key(id), &name)
    }

    /// Overlays for every id in `ids` that has one.
    pub fn custom_display_names<I>(&self, ids: I) -> Result<HashMap<CreatureId, String>>
    where
        I: IntoIterator<Item = CreatureId>,
    {
        let mut names = HashMap::new();
        for id in ids {
            if let Some(name) = self.custom_display_name(id)? {
                names.insert(id, name);
            }
        }
        Ok(names)
    }

    pub fn breeding_history(&self) -> Result<Vec<BreedingRecord>> {
        Ok(self.read(BREEDING_HISTORY_KEY)?.unwrap_or_default())
    }

    pub fn append_breeding_record(&self, record: BreedingRecord) -> Result<()> {
        let mut history = self.breeding_history()?;
        history.push(record);
        self.write(BREEDING_HISTORY_KEY, &history)
    }

    pub fn leaderboard_snapshot(&self) -> Result<Option<CachedSnapshot>> {
        self.read(LEADERBOARD_SNAPSHOT_KEY)
    }

    pub fn save_leaderboard_snapshot(&self, snapshot: &CachedSnapshot) -> Result<()> {
        self.write(LEADERBOARD_SNAPSHOT_KEY, snapshot)
    }
}
