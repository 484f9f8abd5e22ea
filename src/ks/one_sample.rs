//! One-sample Kolmogorov-Smirnov distribution.
//!
//! Survival function of Dₙ (two-sided) and D⁺ₙ (one-sided) for a sample of
//! size n from a continuous distribution.
//!
//! # Two-sided strategy
//!
//! | Region | Evaluator |
//! |---|---|
//! | x ≤ 1/n or x ≥ 1 − 1/n | closed form |
//! | n ≤ 140, nx² < 0.754693 | Durbin matrix |
//! | n ≤ 140, nx² < 4 | Pomeranz |
//! | n ≤ 140, otherwise | Miller: 2·P(D⁺ₙ ≥ x) |
//! | n > 140, nx² ≥ 2.2 | Miller |
//! | n ≤ 100000, n·x^1.5 < 1.4 | Durbin matrix |
//! | otherwise | Pelz–Good |
//!
//! Reference: Simard & L'Ecuyer (2011), "Computing the Two-Sided
//! Kolmogorov-Smirnov Distribution", *Journal of Statistical Software*
//! 39(11).

use super::{durbin, one_sided, pelz_good, pomeranz};
use crate::extended::DD;

/// Evaluator chosen for a two-sided survival probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TwoSidedStrategy {
    Boundary,
    Durbin,
    Pomeranz,
    Miller,
    PelzGood,
}

/// Whether the exact product `t` is at most `c`.
fn at_most(t: DD, c: f64) -> bool {
    t.add_f64(-c).hi() <= 0.0
}

fn at_least(t: DD, c: f64) -> bool {
    t.add_f64(-c).hi() >= 0.0
}

impl TwoSidedStrategy {
    /// Picks the evaluator for `P(Dₙ ≥ x)`.
    ///
    /// # Examples
    /// ```
    /// use u_nonparam::ks::TwoSidedStrategy;
    /// assert_eq!(TwoSidedStrategy::select(0.05, 10), TwoSidedStrategy::Boundary);
    /// assert_eq!(TwoSidedStrategy::select(0.2, 10), TwoSidedStrategy::Durbin);
    /// assert_eq!(TwoSidedStrategy::select(0.4, 10), TwoSidedStrategy::Pomeranz);
    /// assert_eq!(TwoSidedStrategy::select(0.7, 10), TwoSidedStrategy::Miller);
    /// ```
    pub fn select(x: f64, n: u32) -> Self {
        let nf = f64::from(n);
        let t = DD::from_product(nf, x);
        if x <= 0.0 || x >= 1.0 || at_most(t, 1.0) || at_least(t, nf - 1.0) {
            return TwoSidedStrategy::Boundary;
        }
        let w = nf * x * x;
        if n <= 140 {
            if w < 0.754693 {
                TwoSidedStrategy::Durbin
            } else if w < 4.0 {
                TwoSidedStrategy::Pomeranz
            } else {
                TwoSidedStrategy::Miller
            }
        } else if w >= 2.2 {
            TwoSidedStrategy::Miller
        } else if n <= 100_000 && nf * x.powf(1.5) < 1.4 {
            TwoSidedStrategy::Durbin
        } else {
            TwoSidedStrategy::PelzGood
        }
    }
}

/// Closed forms at the ends of the support.
fn boundary_sf(x: f64, n: u32) -> f64 {
    if x >= 1.0 {
        return 0.0;
    }
    let nf = f64::from(n);
    let t = DD::from_product(nf, x);
    if x <= 0.0 || at_most(t.mul_f64(2.0), 1.0) {
        return 1.0;
    }
    if at_most(t, 1.0) {
        // 1 − n!(2x − 1/n)ⁿ = 1 − Π i(2t − 1)/n
        let step = t.mul_f64(2.0).add_f64(-1.0).to_f64() / nf;
        let cdf = (1..=n).fold(1.0, |acc, i| acc * f64::from(i) * step);
        return 1.0 - cdf;
    }
    // x ≥ 1 − 1/n
    (2.0 * one_sided::sf(x, n)).min(1.0)
}

/// Survival function of the one-sample KS statistic.
///
/// Returns `P(Dₙ ≥ x)` when `one_sided` is false and `P(D⁺ₙ ≥ x)` when it
/// is true.
///
/// # Returns
/// - `NaN` for NaN `x` or `n == 0`
/// - `1` for `x ≤ 0`, `0` for `x ≥ 1`
///
/// # Examples
/// ```
/// use u_nonparam::ks::ks_one_sample_sf;
/// // two-sided 5% critical value for n = 10
/// assert!((ks_one_sample_sf(0.40925, 10, false) - 0.05).abs() < 1e-4);
/// // n = 1: P(D₁⁺ ≥ x) = 1 − x
/// assert!((ks_one_sample_sf(0.3, 1, true) - 0.7).abs() < 1e-15);
/// ```
pub fn ks_one_sample_sf(x: f64, n: u32, one_sided: bool) -> f64 {
    if x.is_nan() || n == 0 {
        return f64::NAN;
    }
    if one_sided {
        return one_sided::sf(x, n);
    }
    let strategy = TwoSidedStrategy::select(x, n);
    log::trace!("two-sided KS sf: n={n}, x={x}, strategy={strategy:?}");
    let p = match strategy {
        TwoSidedStrategy::Boundary => boundary_sf(x, n),
        TwoSidedStrategy::Durbin => 1.0 - durbin::cdf(x, n),
        TwoSidedStrategy::Pomeranz => 1.0 - pomeranz::cdf(x, n),
        TwoSidedStrategy::Miller => 2.0 * one_sided::sf(x, n),
        TwoSidedStrategy::PelzGood => 1.0 - pelz_good::cdf(x, n),
    };
    p.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edges() {
        assert!(ks_one_sample_sf(f64::NAN, 5, false).is_nan());
        assert!(ks_one_sample_sf(0.5, 0, true).is_nan());
        assert_eq!(ks_one_sample_sf(0.0, 5, false), 1.0);
        assert_eq!(ks_one_sample_sf(-3.0, 5, true), 1.0);
        assert_eq!(ks_one_sample_sf(1.0, 5, false), 0.0);
        assert_eq!(ks_one_sample_sf(2.0, 5, true), 0.0);
    }

    #[test]
    fn test_n1_two_sided() {
        // P(D₁ ≥ x) = 2(1 − x) for x ≥ 1/2
        for &x in &[0.5, 0.6, 0.8, 0.99] {
            let p = ks_one_sample_sf(x, 1, false);
            assert!((p - 2.0 * (1.0 - x)).abs() < 1e-14, "x={x}: {p}");
        }
        assert_eq!(ks_one_sample_sf(0.3, 1, false), 1.0);
    }

    #[test]
    fn test_critical_values() {
        // Miller (1956) two-sided 5% points
        for &(n, x) in &[
            (1_u32, 0.975),
            (2, 0.84189),
            (3, 0.70760),
            (4, 0.62394),
            (5, 0.56328),
            (10, 0.40925),
            (20, 0.29408),
        ] {
            let p = ks_one_sample_sf(x, n, false);
            assert!((p - 0.05).abs() < 1e-4, "n={n}, x={x}: p={p}");
        }
    }

    #[test]
    fn test_lower_boundary_formula() {
        // 1/(2n) < x ≤ 1/n: 1 − n!(2x − 1/n)ⁿ
        let n = 4;
        let x = 0.2;
        let expected = 1.0 - 24.0 * (0.4_f64 - 0.25).powi(4);
        assert!((ks_one_sample_sf(x, n, false) - expected).abs() < 1e-14);
        assert_eq!(ks_one_sample_sf(0.1, n, false), 1.0);
    }

    #[test]
    fn test_upper_boundary_formula() {
        let n = 8;
        let x = 0.9;
        let expected = 2.0 * 0.1_f64.powi(8);
        let p = ks_one_sample_sf(x, n, false);
        assert!(((p - expected) / expected).abs() < 1e-12);
    }

    #[test]
    fn test_strategy_regions() {
        use TwoSidedStrategy::*;
        assert_eq!(TwoSidedStrategy::select(0.009, 100), Boundary);
        assert_eq!(TwoSidedStrategy::select(0.995, 100), Boundary);
        assert_eq!(TwoSidedStrategy::select(0.05, 100), Durbin);
        assert_eq!(TwoSidedStrategy::select(0.15, 100), Pomeranz);
        assert_eq!(TwoSidedStrategy::select(0.25, 100), Miller);
        assert_eq!(TwoSidedStrategy::select(0.2, 1000), Miller);
        assert_eq!(TwoSidedStrategy::select(0.005, 1000), Durbin);
        assert_eq!(TwoSidedStrategy::select(0.03, 1000), PelzGood);
        assert_eq!(TwoSidedStrategy::select(0.001, 200_000), PelzGood);
    }

    #[test]
    fn test_miller_matches_pomeranz() {
        for &(n, w) in &[(20_u32, 2.3), (50, 2.5), (100, 3.0), (140, 3.9)] {
            let x = (w / f64::from(n)).sqrt();
            let miller = (2.0 * one_sided::sf(x, n)).min(1.0);
            let exact = 1.0 - pomeranz::cdf(x, n);
            assert!(
                ((miller - exact) / exact).abs() < 1e-4,
                "n={n}, x={x}: miller={miller}, pomeranz={exact}"
            );
        }
    }

    #[test]
    fn test_continuity_at_durbin_pomeranz_switch() {
        let n = 100;
        let x = (0.754693_f64 / 100.0).sqrt();
        let below = ks_one_sample_sf(x * (1.0 - 1e-9), n, false);
        let above = ks_one_sample_sf(x * (1.0 + 1e-9), n, false);
        assert!((below - above).abs() < 1e-8);
    }

    #[test]
    fn test_continuity_at_miller_switch_large_n() {
        for &n in &[141_u32, 300, 1000, 10_000] {
            let x = (2.2 / f64::from(n)).sqrt();
            let (lo, hi) = (x * (1.0 - 1e-9), x * (1.0 + 1e-9));
            assert_eq!(TwoSidedStrategy::select(lo, n), TwoSidedStrategy::PelzGood);
            assert_eq!(TwoSidedStrategy::select(hi, n), TwoSidedStrategy::Miller);
            let below = ks_one_sample_sf(lo, n, false);
            let above = ks_one_sample_sf(hi, n, false);
            assert!(
                ((below - above) / above).abs() < 5e-4,
                "n={n}: pelz-good={below}, miller={above}"
            );
        }
    }

    #[test]
    fn test_non_increasing_in_n() {
        let sizes = [50_u32, 100, 140, 280, 600, 1500, 5000, 20_000];
        for &x in &[0.02, 0.05, 0.1, 0.2] {
            let p: Vec<f64> = sizes.iter().map(|&n| ks_one_sample_sf(x, n, false)).collect();
            for (w, ns) in p.windows(2).zip(sizes.windows(2)) {
                assert!(
                    w[1] <= w[0] * (1.0 + 1e-9) + 1e-15,
                    "x={x}: P(D{} ≥ x)={} < P(D{} ≥ x)={}",
                    ns[0],
                    w[0],
                    ns[1],
                    w[1]
                );
            }
        }
    }

    #[test]
    fn test_large_n_near_limit() {
        // √n·D → K; P(K > 1.3581) = 0.05
        let n = 1000;
        let x = 1.3581 / f64::from(n).sqrt();
        let p = ks_one_sample_sf(x, n, false);
        assert!((p - 0.05).abs() < 3e-3, "p = {p}");
    }

    #[test]
    fn test_one_sided_below_two_sided() {
        for &(n, x) in &[(10_u32, 0.3), (50, 0.1), (300, 0.05)] {
            let one = ks_one_sample_sf(x, n, true);
            let two = ks_one_sample_sf(x, n, false);
            assert!(one <= two && two <= 2.0 * one + 1e-12, "n={n}, x={x}");
        }
    }
}
