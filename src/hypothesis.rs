//! Selectors shared by every test: the alternative hypothesis and the
//! p-value computation method, and the p-value helpers the rank tests
//! share.

use crate::distributions::Normal;

/// Alternative hypothesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alternative {
    /// The two distributions differ.
    #[default]
    TwoSided,
    /// The first sample is stochastically greater (or, for KS, its CDF
    /// lies above the second).
    Greater,
    /// The first sample is stochastically less (or, for KS, its CDF
    /// lies below the second).
    Less,
}

/// How the p-value is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PValueMethod {
    /// Exact when feasible for the sample size and free of ties,
    /// otherwise asymptotic.
    #[default]
    Auto,
    /// Exact distribution. Falls back to asymptotic if the exact
    /// computation is unavailable (too large, or ties present for the
    /// rank tests).
    Exact,
    /// Large-sample approximation.
    Asymptotic,
    /// Monte Carlo estimate. Only the two-sample KS test supports it;
    /// requires a random source.
    Estimate,
}

/// Exact p-value of a discrete statistic symmetric about `total / 2`.
///
/// `cdf(k)` is P(S ≤ k); `None` propagates as unavailable.
pub(crate) fn symmetric_exact_p_value(
    statistic: i64,
    total: i64,
    alternative: Alternative,
    cdf: impl Fn(i64) -> Option<f64>,
) -> Option<f64> {
    let p = match alternative {
        Alternative::Greater => cdf(total - statistic)?,
        Alternative::Less => cdf(statistic)?,
        Alternative::TwoSided => 2.0 * cdf(statistic.min(total - statistic))?,
    };
    Some(p.min(1.0))
}

/// Normal-approximation p-value of `deviation = statistic − mean`.
///
/// The optional continuity correction moves the deviation 0.5 toward the
/// expectation. Zero or undefined variance gives 1.
pub(crate) fn normal_p_value(
    deviation: f64,
    variance: f64,
    alternative: Alternative,
    continuity_correction: bool,
) -> f64 {
    let Ok(normal) = Normal::new(0.0, variance.sqrt()) else {
        return 1.0;
    };
    let cc = if continuity_correction { 0.5 } else { 0.0 };
    let p = match alternative {
        Alternative::TwoSided => 2.0 * normal.sf(deviation.abs() - cc),
        Alternative::Greater => normal.sf(deviation - cc),
        Alternative::Less => normal.cdf(deviation + cc),
    };
    p.clamp(0.0, 1.0)
}
