//! Wilcoxon signed-rank test.
//!
//! W+ is the sum of the ranks of |zᵢ| over the positive differences.
//! Zero differences follow Pratt (1959): they take part in the ranking
//! but add nothing to W+, and their rank mass is removed from the mean
//! and variance of the normal approximation.
//!
//! # Exact distribution
//! Without zeros or ties, W+ counts the rank subsets {1..n} whose sum is
//! t. The counts uₙ(t) satisfy
//!
//! ```text
//! uₙ(t) = uₙ₋₁(t) + uₙ₋₁(t − n)
//! ```
//!
//! and are symmetric about n(n+1)/4, so row n stores t ≤ n(n+1)/4. Each
//! ordering of signs has probability 2⁻ⁿ.
//!
//! References:
//! - Wilcoxon (1945), "Individual comparisons by ranking methods",
//!   *Biometrics Bulletin* 1(6).
//! - Pratt (1959), "Remarks on zeros and ties in the Wilcoxon signed rank
//!   procedures", *JASA* 54(287).

use std::sync::Arc;

use crate::collections::{ExtendOnly, ReclaimableCache};
use crate::error::{check_mu, check_sample, Result, TestError};
use crate::hypothesis::{normal_p_value, symmetric_exact_p_value, Alternative, PValueMethod};
use crate::ranking::{rank, tie_correction};

/// AUTO uses the exact distribution while n is below this.
const AUTO_EXACT_LIMIT: usize = 50;

/// Largest n for which the exact table is built.
const MAX_EXACT_N: usize = 512;

static SUBSET_SUMS: ReclaimableCache<SubsetSumTable> = ReclaimableCache::new();

/// `rows[n][t]` = uₙ(t) for t ≤ n(n+1)/4.
#[derive(Debug, Clone, Default)]
struct SubsetSumTable {
    rows: Vec<Arc<[f64]>>,
}

fn rank_total(n: usize) -> i64 {
    (n * (n + 1) / 2) as i64
}

impl SubsetSumTable {
    fn count(&self, n: usize, t: i64) -> f64 {
        let total = rank_total(n);
        if t < 0 || t > total {
            return 0.0;
        }
        self.rows[n][t.min(total - t) as usize]
    }

    fn grow(mut self, n: usize) -> Self {
        for k in self.rows.len()..=n {
            let row: Vec<f64> = if k == 0 {
                vec![1.0]
            } else {
                (0..=rank_total(k) / 2)
                    .map(|t| self.count(k - 1, t) + self.count(k - 1, t - k as i64))
                    .collect()
            };
            self.rows.push(Arc::from(row));
        }
        self
    }
}

impl ExtendOnly for SubsetSumTable {
    fn union(&self, other: &Self) -> Self {
        if self.rows.len() >= other.rows.len() {
            self.clone()
        } else {
            other.clone()
        }
    }
}

/// uₙ(0..=n(n+1)/4), growing the shared table if needed.
fn subset_sums(n: usize) -> Option<Arc<[f64]>> {
    let current = SUBSET_SUMS.snapshot();
    if let Some(row) = current.as_ref().and_then(|t| t.rows.get(n).cloned()) {
        return Some(row);
    }
    let base = current.map(|t| (*t).clone()).unwrap_or_default();
    log::debug!("growing Wilcoxon subset-sum table to n={n}");
    SUBSET_SUMS.publish(base.grow(n)).rows.get(n).cloned()
}

/// Exact P(W+ ≤ w) for n non-zero, untied differences; `None` if n is
/// beyond the exact limit.
fn exact_cdf(w: i64, n: usize) -> Option<f64> {
    if n > MAX_EXACT_N {
        return None;
    }
    let total = rank_total(n);
    if w < 0 {
        return Some(0.0);
    }
    if w >= total {
        return Some(1.0);
    }
    if 2 * w > total {
        return exact_cdf(total - w - 1, n).map(|p| 1.0 - p);
    }
    let row = subset_sums(n)?;
    let hits: f64 = row[..=w as usize].iter().sum();
    Some(hits / 2.0_f64.powi(n as i32))
}

/// Drops the shared exact-distribution table. Returns `true` if one was
/// cached.
pub fn reclaim_exact_cache() -> bool {
    SUBSET_SUMS.reclaim()
}

/// Signed-rank summary of a vector of differences.
#[derive(Debug, Clone, PartialEq)]
struct SignedRanks {
    w_plus: f64,
    zeros: usize,
    /// Σ(t³ − t) over tie groups of non-zero |d|.
    tie_correction: f64,
    has_ties: bool,
}

fn signed_ranks(d: &[f64]) -> SignedRanks {
    let abs: Vec<f64> = d.iter().map(|v| v.abs()).collect();
    let ranking = rank(&abs);
    let w_plus = d
        .iter()
        .zip(ranking.ranks.iter())
        .filter(|(v, _)| **v > 0.0)
        .map(|(_, r)| r)
        .sum();
    let nonzero: Vec<f64> = abs.iter().copied().filter(|v| *v != 0.0).collect();
    let c = tie_correction(&nonzero);
    SignedRanks {
        w_plus,
        zeros: d.len() - nonzero.len(),
        tie_correction: c.to_f64(),
        has_ties: !c.is_zero(),
    }
}

/// W+ of a sample of differences.
///
/// # Examples
/// ```
/// use u_nonparam::wilcoxon::wilcoxon_statistic;
/// // ranks of |z| are 1, 2, 3, 4; positives hold ranks 1 and 3
/// assert_eq!(wilcoxon_statistic(&[1.0, -2.0, 3.0, -4.0]).unwrap(), 4.0);
/// ```
pub fn wilcoxon_statistic(z: &[f64]) -> Result<f64> {
    check_sample("z", z, 1)?;
    Ok(signed_ranks(z).w_plus)
}

/// W+ of the paired differences `x − y`.
pub fn wilcoxon_statistic_paired(x: &[f64], y: &[f64]) -> Result<f64> {
    let d = paired_differences(x, y, 0.0)?;
    Ok(signed_ranks(&d).w_plus)
}

fn paired_differences(x: &[f64], y: &[f64], mu: f64) -> Result<Vec<f64>> {
    check_sample("x", x, 1)?;
    check_sample("y", y, 1)?;
    if x.len() != y.len() {
        return Err(TestError::LengthMismatch {
            x: x.len(),
            y: y.len(),
        });
    }
    let d: Vec<f64> = x.iter().zip(y.iter()).map(|(a, b)| a - b - mu).collect();
    check_sample("x - y", &d, 1)?;
    Ok(d)
}

/// Outcome of a Wilcoxon signed-rank test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WilcoxonResult {
    /// W+ of the differences shifted by `mu`.
    pub statistic: f64,
    /// Whether non-zero |differences| contain ties.
    pub has_tied_values: bool,
    pub has_zero_values: bool,
    pub p_value: f64,
}

/// Wilcoxon signed-rank test configuration.
///
/// # Examples
/// ```
/// use u_nonparam::wilcoxon::WilcoxonSignedRankTest;
///
/// let r = WilcoxonSignedRankTest::new()
///     .test(&[1.0, -2.0, 3.0, -4.0])
///     .unwrap();
/// assert_eq!(r.statistic, 4.0);
/// // 2 · 7/16
/// assert!((r.p_value - 0.875).abs() < 1e-15);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WilcoxonSignedRankTest {
    alternative: Alternative,
    method: PValueMethod,
    continuity_correction: bool,
    mu: f64,
}

impl Default for WilcoxonSignedRankTest {
    fn default() -> Self {
        Self {
            alternative: Alternative::TwoSided,
            method: PValueMethod::Auto,
            continuity_correction: true,
            mu: 0.0,
        }
    }
}

impl WilcoxonSignedRankTest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_alternative(self, alternative: Alternative) -> Self {
        Self {
            alternative,
            ..self
        }
    }

    /// `PValueMethod::Estimate` is rejected when the test runs.
    pub fn with_method(self, method: PValueMethod) -> Self {
        Self { method, ..self }
    }

    pub fn with_continuity_correction(self, continuity_correction: bool) -> Self {
        Self {
            continuity_correction,
            ..self
        }
    }

    /// Hypothesized location of the differences.
    pub fn with_mu(self, mu: f64) -> Self {
        Self { mu, ..self }
    }

    /// One-sample test on the differences `z − mu`.
    pub fn test(&self, z: &[f64]) -> Result<WilcoxonResult> {
        check_sample("z", z, 1)?;
        check_mu(self.mu)?;
        let d: Vec<f64> = z.iter().map(|v| v - self.mu).collect();
        check_sample("z - mu", &d, 1)?;
        self.run(&d)
    }

    /// Paired test on `x − y − mu`.
    pub fn test_paired(&self, x: &[f64], y: &[f64]) -> Result<WilcoxonResult> {
        check_mu(self.mu)?;
        let d = paired_differences(x, y, self.mu)?;
        self.run(&d)
    }

    fn run(&self, d: &[f64]) -> Result<WilcoxonResult> {
        if self.method == PValueMethod::Estimate {
            return Err(TestError::InvalidParameter(
                "Wilcoxon signed-rank test does not support p-value estimation".to_string(),
            ));
        }
        let n = d.len();
        let s = signed_ranks(d);
        let exact_allowed = !s.has_ties && s.zeros == 0;

        let method = match self.method {
            PValueMethod::Auto if exact_allowed && n < AUTO_EXACT_LIMIT => PValueMethod::Exact,
            PValueMethod::Auto => PValueMethod::Asymptotic,
            other => other,
        };
        log::debug!(
            "Wilcoxon: n={n}, zeros={}, ties={}, method={method:?}",
            s.zeros,
            s.has_ties
        );

        let exact = if method == PValueMethod::Exact && exact_allowed {
            symmetric_exact_p_value(s.w_plus.round() as i64, rank_total(n), self.alternative, |k| {
                exact_cdf(k, n)
            })
        } else {
            None
        };
        let p_value = match exact {
            Some(p) => p,
            None => {
                if method == PValueMethod::Exact {
                    log::debug!("Wilcoxon: exact p-value unavailable; using asymptotic");
                }
                self.asymptotic(&s, n)
            }
        };
        Ok(WilcoxonResult {
            statistic: s.w_plus,
            has_tied_values: s.has_ties,
            has_zero_values: s.zeros > 0,
            p_value,
        })
    }

    fn asymptotic(&self, s: &SignedRanks, n: usize) -> f64 {
        let nf = n as f64;
        let z0 = s.zeros as f64;
        let mean = (nf * (nf + 1.0) - z0 * (z0 + 1.0)) / 4.0;
        let variance = (nf * (nf + 1.0) * (2.0 * nf + 1.0) - z0 * (z0 + 1.0) * (2.0 * z0 + 1.0))
            / 24.0
            - s.tie_correction / 48.0;
        normal_p_value(
            s.w_plus - mean,
            variance,
            self.alternative,
            self.continuity_correction,
        )
    }
}
