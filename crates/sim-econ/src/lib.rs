#![deny(warnings)]

//! Economic helpers for Idle Acres.
//!
//! This module provides validated utilities for:
//! - Geometric upgrade cost curves
//! - Luck-weighted selection from ordered reward tables
//! - Chance rolls and jittered timers on a caller-supplied RNG

use rand::Rng;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors produced by economic helpers.
#[derive(Debug, Error, PartialEq)]
pub enum EconError {
    /// Cost multipliers below one would make later purchases cheaper.
    #[error("cost multiplier must be >= 1, got {0}")]
    InvalidMultiplier(Decimal),
    /// Monetary values must be non-negative.
    #[error("invalid price or cost value")]
    InvalidPrice,
    /// Luck must lie within [0, 1] and be finite.
    #[error("invalid luck: {0}")]
    InvalidLuck(f64),
    /// Selection needs at least one entry.
    #[error("cannot select from an empty table")]
    EmptyTable,
}

/// Price of the next purchase of an upgrade.
///
/// cost = base × multiplier^(owned − initial), rounded to cents. Counts below
/// `initial` (a claimed tile was sold back) price at `base`. Saturates at
/// `Decimal::MAX` instead of overflowing.
///
/// Example:
/// let c = upgrade_cost(Decimal::new(10, 0), Decimal::new(15, 1), 3, 1).unwrap();
/// assert_eq!(c, Decimal::new(2250, 2)); // 10 × 1.5²
pub fn upgrade_cost(
    base: Decimal,
    multiplier: Decimal,
    owned: u32,
    initial: u32,
) -> Result<Decimal, EconError> {
    if base < Decimal::ZERO {
        return Err(EconError::InvalidPrice);
    }
    if multiplier < Decimal::ONE {
        return Err(EconError::InvalidMultiplier(multiplier));
    }
    let steps = owned.saturating_sub(initial);
    let mut cost = base;
    for _ in 0..steps {
        cost = match cost.checked_mul(multiplier) {
            // rounding is monotone, so the curve stays non-decreasing
            Some(next) => next.round_dp(6),
            None => return Ok(Decimal::MAX),
        };
    }
    Ok(cost.round_dp(2))
}

/// Pick an index from an ordered table where later entries are rarer.
///
/// Luck is inverted to get the first entry's chance (`1 − luck`); every later
/// entry `i` rolls its own chance `(1 − luck) + i × luck / len`. The first hit
/// wins and a full miss falls back to entry 0. The per-entry chances do not
/// form a normalized distribution; higher luck simply makes it likelier that
/// the walk gets past the common entries.
///
/// Example:
/// let i = lucky_pick(&mut rng, 6, 0.3).unwrap();
/// assert!(i < 6);
pub fn lucky_pick<R: Rng + ?Sized>(rng: &mut R, len: usize, luck: f64) -> Result<usize, EconError> {
    if len == 0 {
        return Err(EconError::EmptyTable);
    }
    if !luck.is_finite() || !(0.0..=1.0).contains(&luck) {
        return Err(EconError::InvalidLuck(luck));
    }
    let first = 1.0 - luck;
    let delta = luck / len as f64;
    for i in 0..len {
        let chance = first + delta * i as f64;
        if rng.gen::<f64>() < chance {
            return Ok(i);
        }
    }
    Ok(0)
}

/// Scale luck down by `factor` (e.g. a nearby kiln scaring the fish), keeping
/// it inside [0, 1].
pub fn dampen_luck(luck: f64, factor: f64) -> f64 {
    (luck * factor).clamp(0.0, 1.0)
}

/// Independent Bernoulli roll. Chances at or below zero never hit.
pub fn roll<R: Rng + ?Sized>(rng: &mut R, chance: f64) -> bool {
    chance > 0.0 && rng.gen::<f64>() < chance
}

/// `base ± variance`, never negative.
pub fn jitter<R: Rng + ?Sized>(rng: &mut R, base: f64, variance: f64) -> f64 {
    if variance <= 0.0 {
        return base.max(0.0);
    }
    (base + rng.gen_range(-variance..=variance)).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn cost_at_initial_count_is_base() {
        let c = upgrade_cost(Decimal::new(10, 0), Decimal::new(15, 1), 1, 1).unwrap();
        assert_eq!(c, Decimal::new(10, 0));
        let below = upgrade_cost(Decimal::new(10, 0), Decimal::new(15, 1), 0, 1).unwrap();
        assert_eq!(below, Decimal::new(10, 0));
    }

    #[test]
    fn cost_grows_geometrically() {
        let c = upgrade_cost(Decimal::new(10, 0), Decimal::new(15, 1), 3, 1).unwrap();
        assert_eq!(c, Decimal::new(2250, 2));
    }

    #[test]
    fn cost_rejects_shrinking_multiplier() {
        assert_eq!(
            upgrade_cost(Decimal::new(10, 0), Decimal::new(9, 1), 2, 0),
            Err(EconError::InvalidMultiplier(Decimal::new(9, 1)))
        );
        assert_eq!(
            upgrade_cost(Decimal::new(-1, 0), Decimal::ONE, 0, 0),
            Err(EconError::InvalidPrice)
        );
    }

    #[test]
    fn cost_saturates() {
        let c = upgrade_cost(Decimal::new(1_000_000, 0), Decimal::new(1000, 0), 40, 0).unwrap();
        assert_eq!(c, Decimal::MAX);
    }

    #[test]
    fn lucky_pick_is_seeded() {
        let mut a = ChaCha8Rng::seed_from_u64(7);
        let mut b = ChaCha8Rng::seed_from_u64(7);
        let xs: Vec<usize> = (0..50).map(|_| lucky_pick(&mut a, 5, 0.4).unwrap()).collect();
        let ys: Vec<usize> = (0..50).map(|_| lucky_pick(&mut b, 5, 0.4).unwrap()).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn luck_shifts_picks_toward_later_entries() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mean = |rng: &mut ChaCha8Rng, luck: f64| {
            let n = 4000;
            let sum: usize = (0..n).map(|_| lucky_pick(&mut *rng, 6, luck).unwrap()).sum();
            sum as f64 / n as f64
        };
        let unlucky = mean(&mut rng, 0.05);
        let lucky = mean(&mut rng, 0.9);
        assert!(lucky > unlucky + 0.5, "lucky={lucky} unlucky={unlucky}");
    }

    #[test]
    fn zero_luck_always_first() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..100 {
            assert_eq!(lucky_pick(&mut rng, 4, 0.0).unwrap(), 0);
        }
    }

    #[test]
    fn lucky_pick_validates() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(lucky_pick(&mut rng, 0, 0.5), Err(EconError::EmptyTable));
        assert_eq!(lucky_pick(&mut rng, 3, 1.5), Err(EconError::InvalidLuck(1.5)));
    }

    #[test]
    fn roll_edges() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        for _ in 0..100 {
            assert!(!roll(&mut rng, 0.0));
            assert!(roll(&mut rng, 1.0));
        }
    }

    #[test]
    fn dampen_luck_clamps() {
        assert_eq!(dampen_luck(0.6, 0.5), 0.3);
        assert_eq!(dampen_luck(0.8, 2.0), 1.0);
    }

    proptest! {
        #[test]
        fn cost_monotonic(base in 1i64..100_000, mult in 100i64..300, initial in 0u32..3, n in 0u32..60) {
            let b = Decimal::new(base, 2);
            let m = Decimal::new(mult, 2);
            let now = upgrade_cost(b, m, initial + n, initial).unwrap();
            let next = upgrade_cost(b, m, initial + n + 1, initial).unwrap();
            prop_assert!(next >= now);
        }

        #[test]
        fn jitter_stays_in_band(seed in any::<u64>(), base in 1.0f64..20.0, var in 0.0f64..1.0) {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let v = jitter(&mut rng, base, var);
            prop_assert!(v >= base - var - 1e-9 && v <= base + var + 1e-9);
        }
    }
}
