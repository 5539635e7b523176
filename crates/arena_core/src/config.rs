//! Configuration management for engine tunables.
//!
//! Strongly-typed sections mapping onto `config.toml`. Every default equals the
//! game's published constants, so an empty file yields the canonical rules.
//!
//! ## Example `config.toml`
//!
//! ```toml
//! seed = 42
//!
//! [genetics]
//! mutation_chance = 0.05
//!
//! [matchmaking]
//! fallback_min_ms = 3000
//! fallback_max_ms = 10000
//!
//! [ranking]
//! player_level = "win_derived"
//! ```

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Inheritance tunables.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct GeneticsConfig {
    /// Probability of the single post-inheritance mutation roll hitting.
    pub mutation_chance: f64,
    /// Offspring traits drift by a uniform draw in `[-variation, +variation]`.
    pub variation: i32,
    /// Bonus added to `special` on mutation.
    pub mutation_bonus: i32,
}

impl Default for GeneticsConfig {
    fn default() -> Self {
        Self {
            mutation_chance: crate::breeding::MUTATION_CHANCE,
            variation: 10,
            mutation_bonus: 20,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct BreedingConfig {
    pub min_level: u32,
    pub cooldown_secs: i64,
}

impl Default for BreedingConfig {
    fn default() -> Self {
        Self {
            min_level: 2,
            cooldown_secs: crate::breeding::BREEDING_COOLDOWN_SECS,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct MatchmakingConfig {
    pub fallback_min_ms: u64,
    pub fallback_max_ms: u64,
    pub synthetic_level_min: u32,
    pub synthetic_level_max: u32,
    /// Exclusive upper bound on a synthetic opponent's win counter.
    pub synthetic_max_wins: u32,
    /// Exclusive upper bound on a synthetic opponent's loss counter.
    pub synthetic_max_losses: u32,
}

impl Default for MatchmakingConfig {
    fn default() -> Self {
        Self {
            fallback_min_ms: 3_000,
            fallback_max_ms: 10_000,
            synthetic_level_min: 1,
            synthetic_level_max: 10,
            synthetic_max_wins: 20,
            synthetic_max_losses: 15,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct BattleConfig {
    pub max_rounds: u32,
    pub history_capacity: usize,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            max_rounds: 5,
            history_capacity: 50,
        }
    }
}

/// Where a player's displayed level comes from.
///
/// The two sources disagree in general; a deployment picks exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PlayerLevelSource {
    /// `floor(wins / 5) + 1`.
    #[default]
    WinDerived,
    /// Highest on-chain level among the player's creatures.
    OnChainMax,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct RankingConfig {
    pub player_level: PlayerLevelSource,
    pub top_players: usize,
    pub top_creatures: usize,
    /// Concurrent `fetch_creature` calls during a full scan.
    pub scan_concurrency: usize,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            player_level: PlayerLevelSource::WinDerived,
            top_players: 50,
            top_creatures: 20,
            scan_concurrency: 8,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct ArenaConfig {
    pub seed: Option<u64>,
    pub genetics: GeneticsConfig,
    pub breeding: BreedingConfig,
    pub matchmaking: MatchmakingConfig,
    pub battle: BattleConfig,
    pub ranking: RankingConfig,
}

impl ArenaConfig {
    /// Validates all configuration parameters.
    ///
    /// Returns `Ok(())` if all parameters are valid, or `Err` with a description
    /// of the first validation failure.
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            (0.0..=1.0).contains(&self.genetics.mutation_chance),
            "Mutation chance must be in [0.0, 1.0]"
        );
        anyhow::ensure!(
            (0..=100).contains(&self.genetics.variation),
            "Variation must be in [0, 100]"
        );
        anyhow::ensure!(
            self.genetics.mutation_bonus >= 0,
            "Mutation bonus must be non-negative"
        );

        anyhow::ensure!(
            self.breeding.min_level >= 1,
            "Minimum breeding level must be at least 1"
        );
        anyhow::ensure!(
            self.breeding.cooldown_secs >= 0,
            "Breeding cooldown must be non-negative"
        );

        let mm = &self.matchmaking;
        anyhow::ensure!(mm.fallback_min_ms > 0, "Fallback window must be positive");
        anyhow::ensure!(
            mm.fallback_min_ms <= mm.fallback_max_ms,
            "Fallback window minimum exceeds maximum"
        );
        anyhow::ensure!(
            mm.synthetic_level_min >= 1 && mm.synthetic_level_min <= mm.synthetic_level_max,
            "Synthetic level range must be non-empty and start at 1 or above"
        );
        anyhow::ensure!(
            mm.synthetic_max_wins > 0 && mm.synthetic_max_losses > 0,
            "Synthetic win/loss bounds must be positive"
        );

        anyhow::ensure!(self.battle.max_rounds > 0, "Max rounds must be positive");
        anyhow::ensure!(
            self.battle.history_capacity > 0,
            "Battle history capacity must be positive"
        );

        anyhow::ensure!(
            self.ranking.scan_concurrency > 0,
            "Scan concurrency must be positive"
        );

        Ok(())
    }

    /// Parses and validates a TOML document. Missing keys take their defaults.
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config = toml::from_str::<Self>(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `path` if it exists, otherwise returns the defaults.
    pub fn load_or_default<P: AsRef<std::path::Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Deterministic when `seed` is set, entropy-seeded otherwise.
    #[must_use]
    pub fn make_rng(&self) -> ChaCha8Rng {
        match self.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        }
    }

    #[must_use]
    pub fn fingerprint(&self) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(format!("{:?}", self.genetics).as_bytes());
        hasher.update(format!("{:?}", self.breeding).as_bytes());
        hasher.update(format!("{:?}", self.matchmaking).as_bytes());
        hasher.update(format!("{:?}", self.battle).as_bytes());
        hasher.update(format!("{:?}", self.ranking).as_bytes());
        hex::encode(hasher.finalize())
    }
}
