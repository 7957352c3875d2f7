//! Dice helpers. Every roll goes through the caller's Rng.

use rand::Rng;

/// A single six-sided die, 1-6.
pub fn d6(rng: &mut impl Rng) -> u32 {
    rng.gen_range(1..=6)
}

/// Two six-sided dice summed, 2-12.
pub fn roll_2d6(rng: &mut impl Rng) -> u32 {
    d6(rng) + d6(rng)
}

/// Uniform integer in `0..sides`.
pub fn random_int(rng: &mut impl Rng, sides: u32) -> u32 {
    rng.gen_range(0..sides)
}
