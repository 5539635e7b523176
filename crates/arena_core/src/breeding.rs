//! Breeding: eligibility, inheritance with dominance, and mutation.

use crate::config::{ArenaConfig, BreedingConfig, GeneticsConfig};
use crate::error::{ArenaError, Ineligibility, Result};
use crate::genetics::{self, GenomeLogic};
use arena_data::{Creature, CreatureId, Offspring, Rarity, Trait, TraitSet};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Chance of the post-inheritance mutation roll hitting.
pub const MUTATION_CHANCE: f64 = 0.05;
/// Minimum time between two breedings of the same creature (24h).
pub const BREEDING_COOLDOWN_SECS: i64 = 24 * 60 * 60;

const NAME_PREFIXES: [&str; 6] = ["Zombie", "Undead", "Rotten", "Decayed", "Feral", "Savage"];
const NAME_SUFFIXES: [&str; 5] = ["Spawn", "Offspring", "Child", "Progeny", "Heir"];

/// A creature offered for breeding together with its locally tracked cooldown.
///
/// `last_bred_at` is separate from the chain's `ready_time`, which only gates combat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreedingParent {
    pub creature: Creature,
    pub last_bred_at: Option<i64>,
}

impl BreedingParent {
    pub fn new(creature: Creature, last_bred_at: Option<i64>) -> Self {
        Self {
            creature,
            last_bred_at,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BreedingEngine {
    genetics: GeneticsConfig,
    rules: BreedingConfig,
}

impl BreedingEngine {
    pub fn new(config: &ArenaConfig) -> Self {
        Self {
            genetics: config.genetics.clone(),
            rules: config.breeding.clone(),
        }
    }

    /// Seconds until `last_bred_at` clears the cooldown; 0 when ready.
    #[must_use]
    pub fn cooldown_remaining(&self, last_bred_at: Option<i64>, now: i64) -> i64 {
        match last_bred_at {
            Some(at) => (self.rules.cooldown_secs - (now - at)).max(0),
            None => 0,
        }
    }

    pub fn check_eligibility(
        &self,
        parent: &BreedingParent,
        now: i64,
    ) -> std::result::Result<(), Ineligibility> {
        let level = parent.creature.level;
        if level < self.rules.min_level {
            return Err(Ineligibility::LevelTooLow {
                level,
                required: self.rules.min_level,
            });
        }
        let remaining_secs = self.cooldown_remaining(parent.last_bred_at, now);
        if remaining_secs > 0 {
            return Err(Ineligibility::CooldownActive { remaining_secs });
        }
        Ok(())
    }

    #[must_use]
    pub fn is_eligible(&self, parent: &BreedingParent, now: i64) -> bool {
        self.check_eligibility(parent, now).is_ok()
    }

    /// Synthesises an offspring from two eligible, distinct parents.
    ///
    /// Per trait in canonical order: take the stronger parent value with the
    /// trait's dominance probability (else the weaker), drift it by a uniform
    /// draw in `[-variation, +variation]`, clamp. One mutation roll follows.
    pub fn breed<R: Rng>(
        &self,
        parent_a: &BreedingParent,
        parent_b: &BreedingParent,
        now: i64,
        rng: &mut R,
    ) -> Result<Offspring> {
        let (a, b) = (&parent_a.creature, &parent_b.creature);
        if a.id == b.id {
            return Err(ArenaError::IdenticalParents(a.id));
        }
        for parent in [parent_a, parent_b] {
            self.check_eligibility(parent, now)
                .map_err(|reason| ArenaError::IneligibleParent {
                    id: parent.creature.id,
                    reason,
                })?;
        }

        let variation = self.genetics.variation;
        let mut traits = TraitSet::from_fn(|t| {
            let va = i32::from(a.genome.trait_of(t));
            let vb = i32::from(b.genome.trait_of(t));
            let base = if rng.gen_bool(t.dominance()) {
                va.max(vb)
            } else {
                va.min(vb)
            };
            base + rng.gen_range(-variation..=variation)
        });

        let is_mutated = rng.gen_bool(self.genetics.mutation_chance);
        if is_mutated {
            let boosted = i32::from(traits.special) + self.genetics.mutation_bonus;
            traits.set(Trait::Special, boosted);
        }

        let genome = genetics::encode(&traits, rng);
        tracing::debug!(
            parent_a = a.id,
            parent_b = b.id,
            %genome,
            is_mutated,
            "Offspring synthesised"
        );

        Ok(Offspring {
            parents: (a.id, b.id),
            genome,
            traits,
            is_mutated,
            created_at: now,
        })
    }

    /// [`breed`](Self::breed) with a fresh generator seeded from `seed`.
    pub fn breed_seeded(
        &self,
        parent_a: &BreedingParent,
        parent_b: &BreedingParent,
        now: i64,
        seed: u64,
    ) -> Result<Offspring> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        self.breed(parent_a, parent_b, now, &mut rng)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentSlot {
    First,
    Second,
}

/// The two parent slots a player fills before breeding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParentSelection {
    first: Option<CreatureId>,
    second: Option<CreatureId>,
}

impl ParentSelection {
    /// Puts `id` in the first empty slot. `None` when both slots are taken.
    pub fn select(&mut self, id: CreatureId) -> Option<ParentSlot> {
        if self.first.is_none() {
            self.first = Some(id);
            Some(ParentSlot::First)
        } else if self.second.is_none() {
            self.second = Some(id);
            Some(ParentSlot::Second)
        } else {
            None
        }
    }

    pub fn clear(&mut self, slot: ParentSlot) {
        match slot {
            ParentSlot::First => self.first = None,
            ParentSlot::Second => self.second = None,
        }
    }

    pub fn clear_all(&mut self) {
        *self = Self::default();
    }

    /// Both selected ids, or `MissingSelection` naming the empty slot.
    pub fn pair(&self) -> Result<(CreatureId, CreatureId)> {
        match (self.first, self.second) {
            (Some(a), Some(b)) => Ok((a, b)),
            (None, _) => Err(ArenaError::MissingSelection("first parent".into())),
            (_, None) => Err(ArenaError::MissingSelection("second parent".into())),
        }
    }
}

/// Bucket on the mean of all five traits: 60 / 70 / 80 / 90.
#[must_use]
pub fn rarity_of(traits: &TraitSet) -> Rarity {
    let average = traits.mean();
    if average >= 90.0 {
        Rarity::Legendary
    } else if average >= 80.0 {
        Rarity::Epic
    } else if average >= 70.0 {
        Rarity::Rare
    } else if average >= 60.0 {
        Rarity::Uncommon
    } else {
        Rarity::Common
    }
}

/// `"{h}h {m}m"`.
#[must_use]
pub fn format_cooldown(secs: i64) -> String {
    let secs = secs.max(0);
    format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
}

pub fn offspring_name<R: Rng>(rng: &mut R) -> String {
    let prefix = NAME_PREFIXES[rng.gen_range(0..NAME_PREFIXES.len())];
    let suffix = NAME_SUFFIXES[rng.gen_range(0..NAME_SUFFIXES.len())];
    format!("{} {} {}", prefix, suffix, rng.gen_range(0..1000))
}

/// A breeding accepted by the chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreedingRecord {
    pub name: String,
    pub offspring: Offspring,
    pub recorded_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct BreedingStats {
    pub total_breedings: usize,
    pub mutations: usize,
    pub average_traits: BTreeMap<Trait, f64>,
    pub rarity_distribution: BTreeMap<Rarity, usize>,
}

impl BreedingStats {
    pub fn from_history(history: &[BreedingRecord]) -> Self {
        let mut stats = Self {
            total_breedings: history.len(),
            ..Default::default()
        };
        if history.is_empty() {
            return stats;
        }

        stats.mutations = history.iter().filter(|r| r.offspring.is_mutated).count();
        for t in Trait::ALL {
            let total: u64 = history
                .iter()
                .map(|r| u64::from(r.offspring.traits.get(t)))
                .sum();
            stats
                .average_traits
                .insert(t, total as f64 / history.len() as f64);
        }
        for record in history {
            *stats
                .rarity_distribution
                .entry(rarity_of(&record.offspring.traits))
                .or_insert(0) += 1;
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use arena_data::Genome;
    use proptest::prelude::*;

    const NOW: i64 = 1_700_000_000;

    fn parent(id: u64, level: u32, genome: &str) -> BreedingParent {
        BreedingParent::new(
            Creature {
                id,
                owner: "0xowner".into(),
                name: format!("Zombie {}", id),
                genome: Genome::parse(genome).unwrap(),
                level,
                win_count: 0,
                loss_count: 0,
                ready_time: 0,
            },
            None,
        )
    }

    #[test]
    fn test_low_level_parent_is_ineligible() {
        let engine = BreedingEngine::default_rules();
        let young = parent(1, 1, "1111111111111111");
        let adult = parent(2, 2, "2222222222222222");
        assert!(!engine.is_eligible(&young, NOW));

        let err = engine.breed_seeded(&young, &adult, NOW, 1).unwrap_err();
        assert!(matches!(err, ArenaError::IneligibleParent { id: 1, .. }));
        assert_eq!(err.kind(), ErrorKind::State);
    }

    #[test]
    fn test_cooldown_blocks_breeding() {
        let engine = BreedingEngine::default_rules();
        let mut a = parent(1, 3, "1111111111111111");
        a.last_bred_at = Some(NOW - 3600);
        let b = parent(2, 3, "2222222222222222");

        assert_eq!(
            engine.cooldown_remaining(a.last_bred_at, NOW),
            BREEDING_COOLDOWN_SECS - 3600
        );
        let err = engine.breed_seeded(&a, &b, NOW, 1).unwrap_err();
        match err {
            ArenaError::IneligibleParent {
                id: 1,
                reason: Ineligibility::CooldownActive { remaining_secs },
            } => assert_eq!(remaining_secs, 23 * 3600),
            other => panic!("unexpected error: {other:?}"),
        }

        a.last_bred_at = Some(NOW - BREEDING_COOLDOWN_SECS);
        assert!(engine.is_eligible(&a, NOW));
    }

    #[test]
    fn test_identical_parents_rejected() {
        let engine = BreedingEngine::default_rules();
        let a = parent(5, 4, "1111111111111111");
        let err = engine.breed_seeded(&a, &a.clone(), NOW, 1).unwrap_err();
        assert!(matches!(err, ArenaError::IdenticalParents(5)));
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_offspring_traits_stay_in_range_and_near_parents() {
        let engine = BreedingEngine::default_rules();
        let a = parent(1, 2, "1234567890123456");
        let b = parent(2, 2, "0000000000000000");
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for _ in 0..500 {
            let child = engine.breed(&a, &b, NOW, &mut rng).unwrap();
            assert_eq!(child.parents, (1, 2));
            assert_eq!(child.created_at, NOW);
            for (t, v) in child.traits.iter() {
                assert!((1..=100).contains(&v), "{} out of range: {}", t, v);
            }
            // Resilience parents are 30 and 1: drift is at most 10, mutation never touches it.
            assert!(child.traits.resilience <= 40);
        }
    }

    #[test]
    fn test_breeding_is_reproducible_for_a_seed() {
        let engine = BreedingEngine::default_rules();
        let a = parent(1, 2, "9876543210987654");
        let b = parent(2, 2, "1234567890123456");
        let first = engine.breed_seeded(&a, &b, NOW, 77).unwrap();
        let second = engine.breed_seeded(&a, &b, NOW, 77).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_certain_mutation_boosts_special() {
        let config = ArenaConfig {
            genetics: GeneticsConfig {
                mutation_chance: 1.0,
                variation: 0,
                mutation_bonus: 20,
            },
            ..Default::default()
        };
        let engine = BreedingEngine::new(&config);
        // special windows (positions 12..15) sum to 3 and 4 -> 30 and 40.
        let a = parent(1, 2, "0000000000001110");
        let b = parent(2, 2, "0000000000002110");
        let child = engine.breed_seeded(&a, &b, NOW, 3).unwrap();
        assert!(child.is_mutated);
        assert!(child.traits.special == 50 || child.traits.special == 60);
    }

    #[test]
    fn test_rarity_thresholds() {
        assert_eq!(rarity_of(&TraitSet::from_fn(|_| 59)), Rarity::Common);
        assert_eq!(rarity_of(&TraitSet::from_fn(|_| 60)), Rarity::Uncommon);
        assert_eq!(rarity_of(&TraitSet::from_fn(|_| 75)), Rarity::Rare);
        assert_eq!(rarity_of(&TraitSet::from_fn(|_| 80)), Rarity::Epic);
        assert_eq!(rarity_of(&TraitSet::from_fn(|_| 95)), Rarity::Legendary);
    }

    #[test]
    fn test_format_cooldown() {
        assert_eq!(format_cooldown(0), "0h 0m");
        assert_eq!(format_cooldown(BREEDING_COOLDOWN_SECS), "24h 0m");
        assert_eq!(format_cooldown(3 * 3600 + 59 * 60 + 59), "3h 59m");
        assert_eq!(format_cooldown(-10), "0h 0m");
    }

    #[test]
    fn test_offspring_name_shape() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let name = offspring_name(&mut rng);
        let parts: Vec<&str> = name.split(' ').collect();
        assert_eq!(parts.len(), 3);
        assert!(NAME_PREFIXES.contains(&parts[0]));
        assert!(NAME_SUFFIXES.contains(&parts[1]));
        assert!(parts[2].parse::<u32>().unwrap() < 1000);
    }

    #[test]
    fn test_parent_selection_fills_slots_in_order() {
        let mut selection = ParentSelection::default();
        assert!(matches!(
            selection.pair(),
            Err(ArenaError::MissingSelection(ref slot)) if slot == "first parent"
        ));
        assert_eq!(selection.select(4), Some(ParentSlot::First));
        let err = selection.pair().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        assert_eq!(selection.select(9), Some(ParentSlot::Second));
        assert_eq!(selection.select(11), None);
        assert_eq!(selection.pair().unwrap(), (4, 9));

        selection.clear(ParentSlot::First);
        assert_eq!(selection.select(11), Some(ParentSlot::First));
        assert_eq!(selection.pair().unwrap(), (11, 9));
        selection.clear_all();
        assert!(selection.pair().is_err());
    }

    #[test]
    fn test_breeding_stats() {
        let engine = BreedingEngine::default_rules();
        let a = parent(1, 2, "9999999999999999");
        let b = parent(2, 2, "9999999999999999");
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let history: Vec<BreedingRecord> = (0..20)
            .map(|i| BreedingRecord {
                name: format!("child {}", i),
                offspring: engine.breed(&a, &b, NOW, &mut rng).unwrap(),
                recorded_at: NOW,
            })
            .collect();

        let stats = BreedingStats::from_history(&history);
        assert_eq!(stats.total_breedings, 20);
        assert_eq!(stats.rarity_distribution.values().sum::<usize>(), 20);
        assert!(stats.average_traits[&Trait::Strength] >= 90.0);
        assert!(BreedingStats::from_history(&[]).average_traits.is_empty());
    }

    proptest! {
        #[test]
        fn test_inherited_traits_stay_within_drift_of_parents(
            da in prop::array::uniform16(0u8..10),
            db in prop::array::uniform16(0u8..10),
            seed in any::<u64>(),
        ) {
            let engine = BreedingEngine::default_rules();
            let mut a = parent(1, 2, "0000000000000000");
            a.creature.genome = Genome::from_digits(da).unwrap();
            let mut b = parent(2, 2, "0000000000000000");
            b.creature.genome = Genome::from_digits(db).unwrap();

            let child = engine.breed_seeded(&a, &b, NOW, seed).unwrap();
            for t in Trait::ALL {
                let va = i32::from(a.creature.genome.trait_of(t));
                let vb = i32::from(b.creature.genome.trait_of(t));
                let v = i32::from(child.traits.get(t));
                prop_assert!((1..=100).contains(&v));
                let bonus = if t == Trait::Special && child.is_mutated { 20 } else { 0 };
                prop_assert!(v >= (va.min(vb) - 10).max(1));
                prop_assert!(v <= (va.max(vb) + 10 + bonus).min(100));
            }
        }
    }

    impl BreedingEngine {
        fn default_rules() -> Self {
            Self::new(&ArenaConfig::default())
        }
    }
}
