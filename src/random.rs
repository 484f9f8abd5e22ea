//! Random number generation and resampling.
//!
//! Provides seeded RNG construction and bootstrap-style resampling with
//! replacement, used by the Monte Carlo p-value estimate of the
//! two-sample Kolmogorov-Smirnov test.
//!
//! # Reproducibility
//!
//! For reproducible experiments, use [`create_rng`] with a fixed seed.
//! The underlying algorithm (SmallRng) is deterministic for a given seed
//! on the same platform.

use rand::Rng;

/// Creates a fast, seeded random number generator.
///
/// Uses `SmallRng` (Xoshiro256++) for high performance.
/// The sequence is deterministic for a given seed on the same platform.
///
/// # Examples
/// ```
/// use u_nonparam::random::create_rng;
/// use rand::Rng;
/// let mut rng = create_rng(42);
/// let x: f64 = rng.random();
/// assert!(x >= 0.0 && x < 1.0);
/// ```
pub fn create_rng(seed: u64) -> rand::rngs::SmallRng {
    use rand::SeedableRng;
    rand::rngs::SmallRng::seed_from_u64(seed)
}

/// Fills `out` with values drawn uniformly, with replacement, from `pool`.
///
/// Leaves `out` untouched when `pool` is empty.
///
/// # Complexity
/// Time: O(out.len()), Space: O(1)
///
/// # Examples
/// ```
/// use u_nonparam::random::{create_rng, resample_into};
/// let pool = [1.0, 2.0, 3.0];
/// let mut out = [0.0; 5];
/// resample_into(&pool, &mut out, &mut create_rng(7));
/// assert!(out.iter().all(|v| pool.contains(v)));
/// ```
pub fn resample_into<R: Rng + ?Sized>(pool: &[f64], out: &mut [f64], rng: &mut R) {
    if pool.is_empty() {
        return;
    }
    for slot in out.iter_mut() {
        *slot = pool[rng.random_range(0..pool.len())];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_rng_deterministic() {
        let mut a = create_rng(42);
        let mut b = create_rng(42);
        for _ in 0..10 {
            let x: u64 = a.random();
            let y: u64 = b.random();
            assert_eq!(x, y);
        }
    }

    #[test]
    fn test_resample_empty_pool() {
        let mut rng = create_rng(1);
        let mut out = [9.0; 3];
        resample_into(&[], &mut out, &mut rng);
        assert_eq!(out, [9.0; 3]);
    }

    #[test]
    fn test_resample_single_value_pool() {
        let mut rng = create_rng(3);
        let mut v = [0.0; 10];
        resample_into(&[4.5], &mut v, &mut rng);
        assert!(v.iter().all(|&x| x == 4.5));
    }

    #[test]
    fn test_resample_covers_pool() {
        // with 2000 draws from 4 values every value appears
        let pool = [1.0, 2.0, 3.0, 4.0];
        let mut rng = create_rng(99);
        let mut v = vec![0.0; 2000];
        resample_into(&pool, &mut v, &mut rng);
        for p in &pool {
            assert!(v.contains(p), "value {p} never drawn");
        }
    }

    #[test]
    fn test_resample_through_trait_object() {
        let mut rng = create_rng(5);
        let dyn_rng: &mut dyn rand::RngCore = &mut rng;
        let mut out = [0.0; 4];
        resample_into(&[1.0, 2.0], &mut out, dyn_rng);
        assert!(out.iter().all(|&x| x == 1.0 || x == 2.0));
    }
}
