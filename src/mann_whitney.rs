//! Mann-Whitney U test.
//!
//! U1 counts the pairs (xᵢ, yⱼ) with xᵢ > yⱼ, ties counting one half; it
//! is computed from the rank sum of x in the pooled sample as
//! U1 = R1 − n(n+1)/2.
//!
//! # Exact distribution
//! f(i, j, k), the number of orderings of i x-values and j y-values with
//! U = k, satisfies
//!
//! ```text
//! f(i, j, k) = f(i − 1, j, k − j) + f(i, j − 1, k)
//! ```
//!
//! (the largest value is either an x, beating all j y-values, or a y).
//! f is symmetric in (i, j) and in k ↔ ij − k, so only i ≤ j and
//! k ≤ ij/2 are stored. The table is shared process-wide in a
//! [`ReclaimableCache`] and grows on demand.
//!
//! Reference: Mann & Whitney (1947), "On a test of whether one of two
//! random variables is stochastically larger than the other", *Annals of
//! Mathematical Statistics* 18(1).

use std::sync::Arc;

use crate::collections::{ExtendOnly, ReclaimableCache};
use crate::error::{check_mu, check_sample, Result, TestError};
use crate::hypothesis::{normal_p_value, symmetric_exact_p_value, Alternative, PValueMethod};
use crate::ranking::{rank, Ranking};
use crate::special::binomial_coefficient;

/// AUTO uses the exact distribution while max(n, m) is below this.
const AUTO_EXACT_LIMIT: usize = 50;

/// Upper bound on stored cells for the exact table.
const MAX_TABLE_CELLS: u128 = 1 << 24;

static COUNTS: ReclaimableCache<CountTable> = ReclaimableCache::new();

/// f(i, j, ·) for i ≤ j, stored as `rows[i][j − i][k]` for k ≤ ij/2.
#[derive(Debug, Clone, Default)]
struct CountTable {
    rows: Vec<Vec<Arc<[f64]>>>,
}

impl CountTable {
    fn row(&self, a: usize, b: usize) -> Option<Arc<[f64]>> {
        self.rows.get(a)?.get(b - a).cloned()
    }

    /// f(i, j, k) with the symmetric lookups applied; zero off the support.
    fn count(&self, i: usize, j: usize, k: i64) -> f64 {
        let (a, b) = if i <= j { (i, j) } else { (j, i) };
        let total = (a * b) as i64;
        if k < 0 || k > total {
            return 0.0;
        }
        let k = k.min(total - k) as usize;
        self.rows[a][b - a][k]
    }

    /// Extends the table to cover every (i, j) with i ≤ a, i ≤ j ≤ b.
    fn grow(mut self, a: usize, b: usize) -> Self {
        if self.rows.len() <= a {
            self.rows.resize_with(a + 1, Vec::new);
        }
        for i in 0..=a {
            let mut j = i + self.rows[i].len();
            while j <= b {
                let half = (i * j / 2) as i64;
                let row: Vec<f64> = if i == 0 {
                    vec![1.0]
                } else {
                    (0..=half)
                        .map(|k| self.count(i - 1, j, k - j as i64) + self.count(i, j - 1, k))
                        .collect()
                };
                self.rows[i].push(Arc::from(row));
                j += 1;
            }
        }
        self
    }
}

impl ExtendOnly for CountTable {
    fn union(&self, other: &Self) -> Self {
        let len = self.rows.len().max(other.rows.len());
        let rows = (0..len)
            .map(|i| {
                let mine = self.rows.get(i).map_or(0, Vec::len);
                let theirs = other.rows.get(i).map_or(0, Vec::len);
                let source = if mine >= theirs { self } else { other };
                source.rows.get(i).cloned().unwrap_or_default()
            })
            .collect();
        CountTable { rows }
    }
}

/// Whether the exact table for sizes a ≤ b stays within bounds.
fn exact_feasible(a: usize, b: usize) -> bool {
    let (a128, b128) = (a as u128, b as u128);
    let cells = (a128 * (a128 + 1) / 2)
        .saturating_mul(b128 * (b128 + 1) / 2)
        / 2
        + (a128 + 1) * (b128 + 1);
    cells <= MAX_TABLE_CELLS && binomial_coefficient((a + b) as u64, a as u64).is_finite()
}

/// f(a, b, 0..=ab/2), growing the shared table if needed.
fn counts(a: usize, b: usize) -> Option<Arc<[f64]>> {
    let current = COUNTS.snapshot();
    if let Some(row) = current.as_ref().and_then(|t| t.row(a, b)) {
        return Some(row);
    }
    let base = current.map(|t| (*t).clone()).unwrap_or_default();
    log::debug!("growing Mann-Whitney count table to ({a}, {b})");
    COUNTS.publish(base.grow(a, b)).row(a, b)
}

/// Exact P(U ≤ u) for sample sizes n and m; `None` if infeasible.
fn exact_cdf(u: i64, n: usize, m: usize) -> Option<f64> {
    let (a, b) = if n <= m { (n, m) } else { (m, n) };
    if !exact_feasible(a, b) {
        return None;
    }
    let total = (a * b) as i64;
    if u < 0 {
        return Some(0.0);
    }
    if u >= total {
        return Some(1.0);
    }
    if 2 * u > total {
        return exact_cdf(total - u - 1, n, m).map(|p| 1.0 - p);
    }
    let row = counts(a, b)?;
    let paths = binomial_coefficient((a + b) as u64, a as u64);
    let hits: f64 = row[..=u as usize].iter().sum();
    Some(hits / paths)
}

/// Drops the shared exact-distribution table. Returns `true` if one was
/// cached.
pub fn reclaim_exact_cache() -> bool {
    COUNTS.reclaim()
}

/// U1 of `x` against `y`, with the pooled ranking.
fn u_statistic(x: &[f64], y: &[f64]) -> (f64, Ranking) {
    let pooled: Vec<f64> = x.iter().chain(y.iter()).copied().collect();
    let ranking = rank(&pooled);
    let n = x.len() as f64;
    let r1: f64 = ranking.ranks[..x.len()].iter().sum();
    (r1 - n * (n + 1.0) / 2.0, ranking)
}

/// Mann-Whitney U1 statistic of `x` against `y`.
///
/// # Examples
/// ```
/// use u_nonparam::mann_whitney::mann_whitney_statistic;
/// assert_eq!(mann_whitney_statistic(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]).unwrap(), 0.0);
/// // one tie between samples counts one half
/// assert_eq!(mann_whitney_statistic(&[2.0, 7.0], &[2.0, 5.0]).unwrap(), 2.5);
/// ```
pub fn mann_whitney_statistic(x: &[f64], y: &[f64]) -> Result<f64> {
    check_sample("x", x, 1)?;
    check_sample("y", y, 1)?;
    Ok(u_statistic(x, y).0)
}

/// Outcome of a Mann-Whitney U test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MannWhitneyResult {
    /// U1 of the shifted sample `x − mu` against `y`.
    pub statistic: f64,
    pub has_tied_values: bool,
    pub p_value: f64,
}

/// Mann-Whitney U test configuration.
///
/// # Examples
/// ```
/// use u_nonparam::mann_whitney::MannWhitneyUTest;
///
/// let r = MannWhitneyUTest::new()
///     .test(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0])
///     .unwrap();
/// assert_eq!(r.statistic, 0.0);
/// assert!((r.p_value - 0.1).abs() < 1e-15);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MannWhitneyUTest {
    alternative: Alternative,
    method: PValueMethod,
    continuity_correction: bool,
    mu: f64,
}

impl Default for MannWhitneyUTest {
    fn default() -> Self {
        Self {
            alternative: Alternative::TwoSided,
            method: PValueMethod::Auto,
            continuity_correction: true,
            mu: 0.0,
        }
    }
}

impl MannWhitneyUTest {
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

    /// Applies the 0.5 continuity correction to the normal approximation.
    pub fn with_continuity_correction(self, continuity_correction: bool) -> Self {
        Self {
            continuity_correction,
            ..self
        }
    }

    /// Location shift: tests whether `x − mu` and `y` share a distribution.
    pub fn with_mu(self, mu: f64) -> Self {
        Self { mu, ..self }
    }

    pub fn test(&self, x: &[f64], y: &[f64]) -> Result<MannWhitneyResult> {
        check_sample("x", x, 1)?;
        check_sample("y", y, 1)?;
        check_mu(self.mu)?;
        if self.method == PValueMethod::Estimate {
            return Err(TestError::InvalidParameter(
                "Mann-Whitney U test does not support p-value estimation".to_string(),
            ));
        }
        let shifted: Vec<f64> = x.iter().map(|v| v - self.mu).collect();
        check_sample("x - mu", &shifted, 1)?;
        let (n, m) = (x.len(), y.len());
        let (u1, ranking) = u_statistic(&shifted, y);

        let method = match self.method {
            PValueMethod::Auto if !ranking.has_ties && n.max(m) < AUTO_EXACT_LIMIT => {
                PValueMethod::Exact
            }
            PValueMethod::Auto => PValueMethod::Asymptotic,
            other => other,
        };
        log::debug!("Mann-Whitney: n={n}, m={m}, ties={}, method={method:?}", ranking.has_ties);

        let exact = if method == PValueMethod::Exact && !ranking.has_ties {
            let total = (n * m) as i64;
            symmetric_exact_p_value(u1.round() as i64, total, self.alternative, |k| {
                exact_cdf(k, n, m)
            })
        } else {
            None
        };
        let p_value = match exact {
            Some(p) => p,
            None => {
                if method == PValueMethod::Exact {
                    log::debug!("Mann-Whitney: exact p-value unavailable; using asymptotic");
                }
                self.asymptotic(u1, n, m, &ranking)
            }
        };
        Ok(MannWhitneyResult {
            statistic: u1,
            has_tied_values: ranking.has_ties,
            p_value,
        })
    }

    fn asymptotic(&self, u1: f64, n: usize, m: usize, ranking: &Ranking) -> f64 {
        let (nf, mf) = (n as f64, m as f64);
        let big_n = nf + mf;
        let c = ranking.tie_correction.to_f64();
        let variance = nf * mf / 12.0 * ((big_n + 1.0) - c / (big_n * (big_n - 1.0)));
        normal_p_value(
            u1 - nf * mf / 2.0,
            variance,
            self.alternative,
            self.continuity_correction,
        )
    }
}
