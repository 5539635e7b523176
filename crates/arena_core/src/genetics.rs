//! Genome codec: trait expression, encoding and decoding.
//!
//! Two readings of a genome exist side by side:
//! - *expression* (`trait_of`): the digits in a trait's 3-position window,
//!   summed and scaled by 10. This is what a creature's phenotype is.
//! - *encoding* (`encode` / `decode`): offspring genomes are written as five
//!   2-digit fields, `floor(trait / 10)` each, followed by random padding.

use crate::error::Result;
use arena_data::{Genome, Trait, TraitSet};
use rand::Rng;

/// Digits written per trait by [`encode`].
pub const ENCODED_FIELD_WIDTH: usize = 2;

pub trait GenomeLogic {
    /// Window digit sum × 10, clamped to `[1, 100]`. Total for every genome.
    fn trait_of(&self, t: Trait) -> u8;
    /// All five expressed traits.
    fn expressed_traits(&self) -> TraitSet;
    /// Reads back the fields written by [`encode`].
    fn decode(&self) -> TraitSet;
}

impl GenomeLogic for Genome {
    fn trait_of(&self, t: Trait) -> u8 {
        let sum: i32 = t.window().iter().map(|&p| i32::from(self.digit(p))).sum();
        (sum * 10).clamp(TraitSet::MIN, TraitSet::MAX) as u8
    }

    fn expressed_traits(&self) -> TraitSet {
        TraitSet::from_fn(|t| i32::from(self.trait_of(t)))
    }

    fn decode(&self) -> TraitSet {
        let mut idx = 0;
        TraitSet::from_fn(|_| {
            let field = i32::from(self.digit(idx)) * 10 + i32::from(self.digit(idx + 1));
            idx += ENCODED_FIELD_WIDTH;
            field * 10
        })
    }
}

/// Parses user or chain input into a genome.
pub fn parse_genome(input: &str) -> Result<Genome> {
    Ok(Genome::parse(input.trim())?)
}

/// Writes `traits` in canonical order, padding the tail with random digits.
pub fn encode<R: Rng>(traits: &TraitSet, rng: &mut R) -> Genome {
    let mut fields = [0u8; Trait::ALL.len() * ENCODED_FIELD_WIDTH];
    for (i, t) in Trait::ALL.into_iter().enumerate() {
        let field = traits.get(t) / 10;
        fields[i * ENCODED_FIELD_WIDTH] = field / 10;
        fields[i * ENCODED_FIELD_WIDTH + 1] = field % 10;
    }
    Genome::from_fn(|pos| match fields.get(pos) {
        Some(&d) => d,
        None => rng.gen_range(0..10),
    })
}

/// A genome with every digit drawn uniformly.
pub fn random_genome<R: Rng>(rng: &mut R) -> Genome {
    Genome::from_fn(|_| rng.gen_range(0..10))
}
