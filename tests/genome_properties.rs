use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use zombie_arena_lib::model::genetics::{encode, parse_genome};
use zombie_arena_lib::model::state::{Genome, Trait, TraitSet, GENOME_LENGTH};
use zombie_arena_lib::model::GenomeLogic;

prop_compose! {
    fn arb_genome()(digits in prop::array::uniform16(0u8..10)) -> Genome {
        Genome::from_digits(digits).unwrap()
    }
}

prop_compose! {
    fn arb_traits()(values in prop::array::uniform5(1i32..=100)) -> TraitSet {
        let mut i = 0;
        TraitSet::from_fn(|_| {
            let v = values[i];
            i += 1;
            v
        })
    }
}

#[test]
fn test_reference_genome_expression() {
    let genome = parse_genome("1234567890123456").unwrap();
    let traits = genome.expressed_traits();
    assert_eq!(traits.get(Trait::Strength), 60);
    assert_eq!(traits.get(Trait::Speed), 100);
    assert_eq!(traits.get(Trait::Intelligence), 100);
    assert_eq!(traits.get(Trait::Resilience), 30);
    assert_eq!(traits.get(Trait::Special), 100);
    for (_, value) in traits.iter() {
        assert!((1..=100).contains(&value));
    }
}

#[test]
fn test_rejects_malformed_genomes() {
    assert!(parse_genome("123").is_err());
    assert!(parse_genome("12345678901234ab").is_err());
    assert!(parse_genome(" 1234567890123456 ").is_ok());
}

proptest! {
    #[test]
    fn test_expression_is_total_and_bounded(genome in arb_genome()) {
        for t in Trait::ALL {
            let v = genome.trait_of(t);
            prop_assert!((1..=100).contains(&v));
        }
    }

    #[test]
    fn test_display_parse_round_trip(genome in arb_genome()) {
        let text = genome.to_string();
        prop_assert_eq!(text.len(), GENOME_LENGTH);
        prop_assert_eq!(parse_genome(&text).unwrap(), genome);
    }

    #[test]
    fn test_decode_recovers_encoded_traits(traits in arb_traits(), seed in any::<u64>()) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let genome = encode(&traits, &mut rng);
        let decoded = genome.decode();
        for t in Trait::ALL {
            let original = i32::from(traits.get(t));
            let back = i32::from(decoded.get(t));
            prop_assert!(back <= original, "{} decoded above original", t);
            prop_assert!(original - back < 10 || back == 1, "{}: {} vs {}", t, original, back);
        }
    }
}
