//! Deterministic utilities for reproducible training
//!
//! Provides an LCG-based RNG plus the sampling helpers built on it, so the
//! same seed yields the same split, bootstrap samples and trees on every
//! platform.

use std::collections::BTreeMap;
use std::num::Wrapping;

/// Linear Congruential Generator for deterministic pseudo-randomness
/// Uses constants from Numerical Recipes (glibc)
#[derive(Clone, Debug)]
pub struct LcgRng {
    state: Wrapping<i64>,
}

impl LcgRng {
    // LCG constants (compatible with glibc)
    const MULTIPLIER: i64 = 1103515245;
    const INCREMENT: i64 = 12345;
    const MODULUS: i64 = 1 << 31;

    pub fn new(seed: i64) -> Self {
        Self {
            state: Wrapping(seed.wrapping_abs() % Self::MODULUS),
        }
    }

    /// Independent stream for one member of an ensemble
    pub fn derive(seed: i64, stream: u64) -> Self {
        let mixed = seed.wrapping_mul(31).wrapping_add((stream as i64).wrapping_mul(7919));
        let mut rng = Self::new(mixed);
        // Discard the first outputs, which correlate with nearby seeds.
        for _ in 0..4 {
            rng.next_i64();
        }
        rng
    }

    /// Generate next random i64 in range [0, MODULUS)
    pub fn next_i64(&mut self) -> i64 {
        self.state = self.state * Wrapping(Self::MULTIPLIER) + Wrapping(Self::INCREMENT);
        (self.state.0 & (Self::MODULUS - 1)).abs()
    }

    /// Generate random value in range [0, max)
    ///
    /// Scales the high bits; the low bits of an LCG have short periods.
    pub fn next_range(&mut self, max: usize) -> usize {
        if max == 0 {
            return 0;
        }
        ((self.next_f64() * max as f64) as usize).min(max - 1)
    }

    /// Uniform value in [0.0, 1.0)
    pub fn next_f64(&mut self) -> f64 {
        self.next_i64() as f64 / Self::MODULUS as f64
    }

    /// Fisher-Yates shuffle
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.next_range(i + 1);
            items.swap(i, j);
        }
    }

    /// `k` distinct indices from `0..n`, in draw order
    pub fn sample_indices(&mut self, n: usize, k: usize) -> Vec<usize> {
        let mut pool: Vec<usize> = (0..n).collect();
        let k = k.min(n);
        for i in 0..k {
            let j = i + self.next_range(n - i);
            pool.swap(i, j);
        }
        pool.truncate(k);
        pool
    }

    /// `n` indices from `0..n` drawn with replacement
    pub fn bootstrap(&mut self, n: usize) -> Vec<usize> {
        (0..n).map(|_| self.next_range(n)).collect()
    }
}

/// Stratified train/test split.
///
/// Every class contributes `round(count * test_fraction)` rows to the test
/// side (at least one when the class has two or more rows). Both index
/// lists are returned sorted.
pub fn stratified_split(targets: &[usize], test_fraction: f64, seed: i64) -> (Vec<usize>, Vec<usize>) {
    let mut by_class: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (idx, &class) in targets.iter().enumerate() {
        by_class.entry(class).or_default().push(idx);
    }

    let mut rng = LcgRng::new(seed);
    let mut train = Vec::with_capacity(targets.len());
    let mut test = Vec::new();

    for (_, mut members) in by_class {
        rng.shuffle(&mut members);
        let mut n_test = (members.len() as f64 * test_fraction).round() as usize;
        if n_test == 0 && members.len() >= 2 && test_fraction > 0.0 {
            n_test = 1;
        }
        let n_test = n_test.min(members.len().saturating_sub(1));
        test.extend_from_slice(&members[..n_test]);
        train.extend_from_slice(&members[n_test..]);
    }

    train.sort_unstable();
    test.sort_unstable();
    (train, test)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_lcg_determinism() {
        let mut rng1 = LcgRng::new(42);
        let mut rng2 = LcgRng::new(42);

        for _ in 0..100 {
            assert_eq!(rng1.next_i64(), rng2.next_i64());
        }
    }

    #[test]
    fn test_lcg_range() {
        let mut rng = LcgRng::new(42);
        for _ in 0..100 {
            let val = rng.next_range(10);
            assert!(val < 10);
            let unit = rng.next_f64();
            assert!((0.0..1.0).contains(&unit));
        }
    }

    #[test]
    fn test_derived_streams_differ() {
        let a: Vec<i64> = (0..8).scan(LcgRng::derive(42, 0), |r, _| Some(r.next_i64())).collect();
        let b: Vec<i64> = (0..8).scan(LcgRng::derive(42, 1), |r, _| Some(r.next_i64())).collect();
        assert_ne!(a, b);
    }

    #[test]
    fn test_sample_indices_are_distinct() {
        let mut rng = LcgRng::new(7);
        let mut picked = rng.sample_indices(25, 5);
        assert_eq!(picked.len(), 5);
        picked.sort_unstable();
        picked.dedup();
        assert_eq!(picked.len(), 5);
        assert!(picked.iter().all(|&i| i < 25));
    }

    #[test]
    fn test_stratified_split_keeps_class_ratios() {
        let targets: Vec<usize> = (0..100).map(|i| if i < 60 { 0 } else if i < 90 { 1 } else { 2 }).collect();
        let (train, test) = stratified_split(&targets, 0.2, 42);

        assert_eq!(train.len() + test.len(), 100);
        let count = |idx: &[usize], class: usize| idx.iter().filter(|&&i| targets[i] == class).count();
        assert_eq!(count(&test, 0), 12);
        assert_eq!(count(&test, 1), 6);
        assert_eq!(count(&test, 2), 2);
        assert!(train.iter().all(|i| !test.contains(i)));
    }

    #[test]
    fn test_stratified_split_is_deterministic() {
        let targets: Vec<usize> = (0..50).map(|i| i % 3).collect();
        assert_eq!(stratified_split(&targets, 0.2, 42), stratified_split(&targets, 0.2, 42));
    }

    proptest! {
        #[test]
        fn stratified_split_partitions_rows(
            targets in proptest::collection::vec(0usize..3, 0..200),
            fraction in 0.0f64..0.9,
            seed in 0i64..1_000,
        ) {
            let (train, test) = stratified_split(&targets, fraction, seed);
            let mut all: Vec<usize> = train.iter().chain(&test).copied().collect();
            all.sort_unstable();
            prop_assert_eq!(all, (0..targets.len()).collect::<Vec<_>>());
            prop_assert!(train.windows(2).all(|w| w[0] < w[1]));
            prop_assert!(test.windows(2).all(|w| w[0] < w[1]));
        }

        #[test]
        fn bootstrap_stays_in_range(n in 1usize..500, seed in any::<i64>()) {
            let sample = LcgRng::new(seed).bootstrap(n);
            prop_assert_eq!(sample.len(), n);
            prop_assert!(sample.iter().all(|&i| i < n));
        }
    }
}
