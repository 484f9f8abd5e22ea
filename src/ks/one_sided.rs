//! One-sided one-sample Kolmogorov-Smirnov distribution.
//!
//! Survival function P(D⁺ₙ ≥ x) of the one-sided statistic
//! D⁺ₙ = sup (Fₙ(t) − F(t)) for a continuous F.
//!
//! # Algorithm
//! With t = n·x, k = ⌊t⌋:
//!
//! - Birnbaum–Tingey sum (n − k positive terms)
//!   `Σ_{j<n−k} t·C(n,j)·(t+j)^(j−1)·(n−t−j)^(n−j) / nⁿ`
//! - Smirnov–Dwass sum (k + 1 alternating terms)
//!   `1 − Σ_{i≤k} (−1)^i·t·C(n,i)·(n+t−i)^(n−i−1)·(t−i)^i / nⁿ`
//!
//! Every term is carried as a double-double fraction with a separate
//! power-of-two exponent, so nⁿ never overflows.
//!
//! References:
//! - Birnbaum & Tingey (1951), "One-sided confidence contours for
//!   probability distribution functions", *Ann. Math. Statist.* 22(4).
//! - Dwass (1959), "The distribution of a generalized D⁺ₙ statistic",
//!   *Ann. Math. Statist.* 30(4).

use crate::extended::{scalb, Accuracy, DD};

/// P(D⁺ₙ ≥ x).
pub(crate) fn sf(x: f64, n: u32) -> f64 {
    if x.is_nan() || n == 0 {
        return f64::NAN;
    }
    if x <= 0.0 {
        return 1.0;
    }
    if x >= 1.0 {
        return 0.0;
    }

    let n64 = u64::from(n);
    let t = DD::from_product(f64::from(n), x);
    let k_dd = t.floor();
    let k = k_dd.to_f64() as u64;

    if k + 1 >= n64 {
        // x ≥ 1 − 1/n: only the j = 0 term survives
        let (f, e) = DD::from_sum(1.0, -x).pow_scaled(n64, Accuracy::High);
        return scalb(f.to_f64(), e);
    }
    if k == 0 {
        // x < 1/n: 1 − x(1 + x)^(n−1)
        let (f, e) = DD::from_sum(1.0, x).pow_scaled(n64 - 1, Accuracy::High);
        let tail = f.mul_f64(x).ldexp(e);
        return (DD::ONE - tail).to_f64().clamp(0.0, 1.0);
    }
    let alpha = (t - k_dd).to_f64();
    let tf = t.to_f64();
    let dwass_terms = k + 1;
    let regular_terms = n64 - k;
    let p = if dwass_terms < regular_terms && tf <= 16.0 && 2.0 * tf * tf / f64::from(n) <= 14.0
    {
        dwass_sum(n64, t, k, alpha)
    } else {
        regular_sum(n64, t, regular_terms)
    };
    p.clamp(0.0, 1.0)
}

/// C(n, j) from C(n, j − 1), kept as a scaled pair.
fn next_binomial(prev: (DD, i64), n: u64, j: u64) -> (DD, i64) {
    let (f, e) = prev
        .0
        .mul_f64((n - j + 1) as f64)
        .div_f64(j as f64)
        .frexp();
    (f, prev.1 + e)
}

/// Sums scaled terms from the smallest exponent to the largest.
fn sum_scaled(parts: &mut [(DD, i64)]) -> DD {
    let Some(top) = parts.iter().map(|&(_, e)| e).max() else {
        return DD::ZERO;
    };
    parts.sort_by_key(|&(_, e)| e);
    let sum = parts
        .iter()
        .fold(DD::ZERO, |acc, &(f, e)| acc + f.ldexp(e - top));
    sum.ldexp(top)
}

/// Birnbaum–Tingey sum over the first `terms` indices with truncation
/// once terms fall below the precision of the largest.
pub(super) fn regular_sum(n: u64, t: DD, terms: u64) -> f64 {
    let guard = (terms as f64 / 2.0).log2().ceil().max(0.0) as i64 + 1;
    let cutoff = 53 + guard;
    let (nn, nn_exp) = DD::from_f64(n as f64).pow_scaled(n, Accuracy::Fast);

    let mut binom = (DD::ONE, 0_i64);
    let mut parts: Vec<(DD, i64)> = Vec::new();
    let mut largest: Option<i64> = None;
    for j in 0..terms {
        if j > 0 {
            binom = next_binomial(binom, n, j);
        }
        let rest = DD::from_f64((n - j) as f64) - t;
        let (rf, re) = rest.pow_scaled(n - j, Accuracy::Fast);
        let mut frac = rf / nn;
        let mut exp = re - nn_exp;
        if j > 0 {
            let (hf, he) = t.add_f64(j as f64).pow_scaled(j - 1, Accuracy::Fast);
            frac = frac * hf * binom.0 * t;
            exp += he + binom.1;
        }
        let (f, e) = frac.frexp();
        let exp = exp + e;
        match largest {
            Some(top) if exp <= top => {
                if exp < top - cutoff {
                    break;
                }
            }
            _ => largest = Some(exp),
        }
        parts.push((f, exp));
    }
    sum_scaled(&mut parts).to_f64()
}

/// Smirnov–Dwass alternating sum; `k >= 1`, `alpha` is the fractional part
/// of t (the i = k term vanishes when it is zero).
pub(super) fn dwass_sum(n: u64, t: DD, k: u64, alpha: f64) -> f64 {
    let last = if alpha == 0.0 { k - 1 } else { k };
    let (nn, nn_exp) = DD::from_f64(n as f64).pow_scaled(n, Accuracy::High);

    let mut binom = (DD::ONE, 0_i64);
    let mut parts: Vec<(DD, i64)> = Vec::with_capacity(last as usize + 1);
    for i in 0..=last {
        if i > 0 {
            binom = next_binomial(binom, n, i);
        }
        let (af, ae) = t
            .add_f64((n - i) as f64)
            .pow_scaled(n - i - 1, Accuracy::High);
        let mut frac = af / nn * t * binom.0;
        let mut exp = ae - nn_exp + binom.1;
        if i > 0 {
            let (bf, be) = t.add_f64(-(i as f64)).pow_scaled(i, Accuracy::High);
            frac = frac * bf;
            exp += be;
        }
        let (f, e) = frac.frexp();
        let f = if i % 2 == 1 { -f } else { f };
        parts.push((f, exp + e));
    }
    (DD::ONE - sum_scaled(&mut parts)).to_f64()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(x: f64, n: u32) -> (DD, u64, f64) {
        let t = DD::from_product(f64::from(n), x);
        let k = t.floor();
        (t, k.to_f64() as u64, (t - k).to_f64())
    }

    #[test]
    fn test_edges() {
        assert!(sf(f64::NAN, 5).is_nan());
        assert!(sf(0.5, 0).is_nan());
        assert_eq!(sf(-0.1, 5), 1.0);
        assert_eq!(sf(0.0, 5), 1.0);
        assert_eq!(sf(1.0, 5), 0.0);
    }

    #[test]
    fn test_n1_is_uniform_tail() {
        for &x in &[0.1, 0.25, 0.5, 0.9] {
            assert!((sf(x, 1) - (1.0 - x)).abs() < 1e-15);
        }
    }

    #[test]
    fn test_small_closed_form() {
        // n = 2, x = 0.3: 1 − 0.3·1.3
        assert!((sf(0.3, 2) - 0.61).abs() < 1e-15);
    }

    #[test]
    fn test_hand_computed_n5() {
        // Birnbaum–Tingey terms: 0.16807 + 0.09375 + 0.0567 + 0.0243
        assert!((sf(0.3, 5) - 0.34282).abs() < 1e-14);
    }

    #[test]
    fn test_upper_closed_form() {
        // x ≥ 1 − 1/n
        let p = sf(0.95, 10);
        assert!((p - 0.05_f64.powi(10)).abs() < 1e-25);
    }

    #[test]
    fn test_dwass_matches_regular() {
        for &(n, x) in &[
            (5_u32, 0.3),
            (10, 0.15),
            (10, 0.25),
            (30, 0.12),
            (50, 0.05),
            (100, 0.08),
            (200, 0.03),
        ] {
            let (t, k, alpha) = split(x, n);
            let n64 = u64::from(n);
            let d = dwass_sum(n64, t, k, alpha);
            let r = regular_sum(n64, t, n64 - k);
            assert!(
                ((d - r) / r).abs() < 1e-12,
                "n={n}, x={x}: dwass={d}, regular={r}"
            );
        }
    }

    #[test]
    fn test_dwass_integral_t() {
        // t = 8 · 0.25 = 2 exactly: the i = k term vanishes
        let (t, k, alpha) = split(0.25, 8);
        assert_eq!(alpha, 0.0);
        assert_eq!(k, 2);
        let d = dwass_sum(8, t, k, alpha);
        let r = regular_sum(8, t, 8 - k);
        assert!(((d - r) / r).abs() < 1e-12, "dwass={d}, regular={r}");
    }

    #[test]
    fn test_tail_matches_exponential_bound() {
        // P(D⁺ ≥ x) ≤ exp(−2nx²) (Massart)
        for &(n, x) in &[(50_u32, 0.2), (100, 0.15), (1000, 0.05)] {
            let p = sf(x, n);
            let bound = (-2.0 * f64::from(n) * x * x).exp();
            assert!(p <= bound, "n={n}, x={x}: p={p} > {bound}");
            assert!(p > bound * 0.1, "n={n}, x={x}: p={p} too small");
        }
    }

    #[test]
    fn test_deep_tail_positive() {
        let p = sf(0.9, 100);
        assert!(p > 0.0 && p < 1e-90, "p={p}");
    }

    #[test]
    fn test_large_n_exact_sum() {
        // n = 250000, x = 0.005: t = 1250, Birnbaum–Tingey with truncation
        let p = sf(0.005, 250_000);
        assert!(((p - 3.714035e-6) / 3.714035e-6).abs() < 5e-6, "p={p}");
    }

    #[test]
    fn test_large_n_between_exponential_bounds() {
        // Stephens (1970): exp(−(6nx + 1)²/(18n))
        let (n, x) = (500_000_u32, 0.002);
        let nf = f64::from(n);
        let approx = (-(6.0 * nf * x + 1.0).powi(2) / (18.0 * nf)).exp();
        let p = sf(x, n);
        assert!(((p - approx) / approx).abs() < 1e-3, "p={p}, approx={approx}");
        assert!(p <= (-2.0 * nf * x * x).exp());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn sf_in_unit_interval(x in 0.0_f64..1.0, n in 1_u32..300) {
            let p = sf(x, n);
            prop_assert!((0.0..=1.0).contains(&p), "sf({}, {}) = {}", x, n, p);
        }

        #[test]
        fn sf_monotone_in_x(x in 0.0_f64..0.95, dx in 0.001_f64..0.05, n in 1_u32..120) {
            let a = sf(x, n);
            let b = sf(x + dx, n);
            prop_assert!(b <= a + 1e-12, "sf not monotone: sf({}, {}) = {} < sf({}) = {}", x, n, a, x + dx, b);
        }
    }
}
