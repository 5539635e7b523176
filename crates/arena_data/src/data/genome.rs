use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of decimal digits in every genome.
pub const GENOME_LENGTH: usize = 16;

/// Rejection reasons for malformed genome input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenomeError {
    /// Input did not have exactly [`GENOME_LENGTH`] characters.
    #[error("genome must be exactly {expected} digits, got {0}", expected = GENOME_LENGTH)]
    Length(usize),
    /// Input contained something other than `0-9`.
    #[error("genome has non-digit {ch:?} at position {position}")]
    NonDigit { position: usize, ch: char },
}

/// A fixed-width decimal genome.
///
/// Digits are held one per slot so every operation on a genome is digit-wise;
/// the value is never interpreted as a 16-digit integer.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Genome([u8; GENOME_LENGTH]);

impl Genome {
    /// Builds a genome from raw digits, rejecting any slot above 9.
    pub fn from_digits(digits: [u8; GENOME_LENGTH]) -> Result<Self, GenomeError> {
        if let Some(position) = digits.iter().position(|&d| d > 9) {
            return Err(GenomeError::NonDigit {
                position,
                ch: char::from(b'0'.saturating_add(digits[position])),
            });
        }
        Ok(Self(digits))
    }

    /// Builds a genome position by position; values are reduced modulo 10.
    pub fn from_fn<F>(mut digit_at: F) -> Self
    where
        F: FnMut(usize) -> u8,
    {
        let mut digits = [0u8; GENOME_LENGTH];
        for (position, slot) in digits.iter_mut().enumerate() {
            *slot = digit_at(position) % 10;
        }
        Self(digits)
    }

    /// Parses a 16-character decimal string.
    pub fn parse(input: &str) -> Result<Self, GenomeError> {
        let count = input.chars().count();
        if count != GENOME_LENGTH {
            return Err(GenomeError::Length(count));
        }

        let mut digits = [0u8; GENOME_LENGTH];
        for (position, ch) in input.chars().enumerate() {
            let digit = ch
                .to_digit(10)
                .ok_or(GenomeError::NonDigit { position, ch })?;
            digits[position] = digit as u8;
        }
        Ok(Self(digits))
    }

    #[must_use]
    pub fn digit(&self, position: usize) -> u8 {
        self.0[position]
    }

    #[must_use]
    pub fn digits(&self) -> &[u8; GENOME_LENGTH] {
        &self.0
    }
}

impl fmt::Display for Genome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for d in self.0 {
            write!(f, "{}", d)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Genome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Genome(\"{}\")", self)
    }
}

impl FromStr for Genome {
    type Err = GenomeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Genome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Genome {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// A heritable attribute expressed from a fixed genome window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trait {
    Strength,
    Speed,
    Intelligence,
    Resilience,
    Special,
}

impl Trait {
    /// Canonical order used for encoding and iteration.
    pub const ALL: [Trait; 5] = [
        Trait::Strength,
        Trait::Speed,
        Trait::Intelligence,
        Trait::Resilience,
        Trait::Special,
    ];

    /// Genome positions whose digits express this trait.
    #[must_use]
    pub const fn window(self) -> [usize; 3] {
        match self {
            Trait::Strength => [0, 1, 2],
            Trait::Speed => [3, 4, 5],
            Trait::Intelligence => [6, 7, 8],
            Trait::Resilience => [9, 10, 11],
            Trait::Special => [12, 13, 14],
        }
    }

    /// Probability that an offspring inherits the stronger parent's value.
    #[must_use]
    pub const fn dominance(self) -> f64 {
        match self {
            Trait::Strength => 0.7,
            Trait::Speed => 0.6,
            Trait::Intelligence => 0.8,
            Trait::Resilience => 0.5,
            Trait::Special => 0.3,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Trait::Strength => "strength",
            Trait::Speed => "speed",
            Trait::Intelligence => "intelligence",
            Trait::Resilience => "resilience",
            Trait::Special => "special",
        }
    }
}

impl fmt::Display for Trait {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Trait {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Trait::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown trait '{}'", s))
    }
}

/// Expressed trait values, each kept in `[TraitSet::MIN, TraitSet::MAX]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TraitSet {
    pub strength: u8,
    pub speed: u8,
    pub intelligence: u8,
    pub resilience: u8,
    pub special: u8,
}

impl TraitSet {
    pub const MIN: i32 = 1;
    pub const MAX: i32 = 100;

    /// Builds a set by evaluating `value` for every trait; results are clamped.
    pub fn from_fn<F>(mut value: F) -> Self
    where
        F: FnMut(Trait) -> i32,
    {
        let mut set = Self {
            strength: 1,
            speed: 1,
            intelligence: 1,
            resilience: 1,
            special: 1,
        };
        for t in Trait::ALL {
            set.set(t, value(t));
        }
        set
    }

    #[must_use]
    pub fn get(&self, t: Trait) -> u8 {
        match t {
            Trait::Strength => self.strength,
            Trait::Speed => self.speed,
            Trait::Intelligence => self.intelligence,
            Trait::Resilience => self.resilience,
            Trait::Special => self.special,
        }
    }

    pub fn set(&mut self, t: Trait, value: i32) {
        let v = value.clamp(Self::MIN, Self::MAX) as u8;
        match t {
            Trait::Strength => self.strength = v,
            Trait::Speed => self.speed = v,
            Trait::Intelligence => self.intelligence = v,
            Trait::Resilience => self.resilience = v,
            Trait::Special => self.special = v,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Trait, u8)> + '_ {
        Trait::ALL.into_iter().map(move |t| (t, self.get(t)))
    }

    #[must_use]
    pub fn mean(&self) -> f64 {
        let total: u32 = self.iter().map(|(_, v)| u32::from(v)).sum();
        f64::from(total) / Trait::ALL.len() as f64
    }
}

/// Rarity tier shared by offspring previews and creature leaderboards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    pub const ALL: [Rarity; 5] = [
        Rarity::Common,
        Rarity::Uncommon,
        Rarity::Rare,
        Rarity::Epic,
        Rarity::Legendary,
    ];
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Rarity::Common => "Common",
            Rarity::Uncommon => "Uncommon",
            Rarity::Rare => "Rare",
            Rarity::Epic => "Epic",
            Rarity::Legendary => "Legendary",
        };
        f.write_str(s)
    }
}
