use std::sync::Arc;
use zombie_arena_lib::app::Arena;
use zombie_arena_lib::model::chain::{ChainClient, LocalChain};
use zombie_arena_lib::model::config::ArenaConfig;
use zombie_arena_lib::model::persistence::{KeyValueStore, MemoryStore};
use zombie_arena_lib::model::state::{CreatureId, Genome};

pub const NOW: i64 = 1_700_000_000;

#[allow(dead_code)]
pub struct ArenaBuilder {
    config: ArenaConfig,
    creatures: Vec<(String, u32, u32, u32)>,
    store: Option<Arc<MemoryStore>>,
}

#[allow(dead_code)]
impl ArenaBuilder {
    pub fn new() -> Self {
        Self {
            config: ArenaConfig {
                seed: Some(7),
                ..Default::default()
            },
            creatures: Vec::new(),
            store: None,
        }
    }

    pub fn with_config<F: FnOnce(&mut ArenaConfig)>(mut self, f: F) -> Self {
        f(&mut self.config);
        self
    }

    /// Mints a creature for `owner`; ids are assigned in call order starting at 0.
    pub fn with_creature(mut self, owner: &str, level: u32, wins: u32, losses: u32) -> Self {
        self.creatures.push((owner.to_string(), level, wins, losses));
        self
    }

    pub fn with_store(mut self, store: Arc<MemoryStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn build(self) -> (Arena, Arc<LocalChain>, Arc<MemoryStore>) {
        let chain = Arc::new(LocalChain::new(self.config.seed.unwrap_or(0)));
        for (i, (owner, level, wins, losses)) in self.creatures.iter().enumerate() {
            chain
                .mint(owner, &format!("Zombie {}", i), genome(i as u64), *level, *wins, *losses)
                .unwrap();
        }
        let store = self.store.unwrap_or_else(|| Arc::new(MemoryStore::new()));
        let arena = Arena::new(
            self.config,
            chain.clone() as Arc<dyn ChainClient>,
            store.clone() as Arc<dyn KeyValueStore>,
        )
        .expect("valid arena config");
        (arena, chain, store)
    }
}

/// A deterministic, digit-varied genome per creature.
#[allow(dead_code)]
pub fn genome(id: CreatureId) -> Genome {
    Genome::from_fn(|pos| (pos as u64 * 7 + id * 3) as u8)
}
