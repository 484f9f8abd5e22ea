//! # u-nonparam
//!
//! Exact and asymptotic p-values for nonparametric hypothesis tests.
//!
//! This crate evaluates the null distributions of the Kolmogorov-Smirnov,
//! Mann-Whitney U and Wilcoxon signed-rank statistics. Each test either
//! computes its discrete distribution exactly or falls back to a
//! large-sample approximation, chosen from the sample sizes and ties.
//!
//! ## Modules
//!
//! - [`ks`] — One-sample KS distribution and the two-sample KS test
//! - [`mann_whitney`] — Mann-Whitney U statistic and test
//! - [`wilcoxon`] — Wilcoxon signed-rank statistic and test
//! - [`hypothesis`] — Alternative hypothesis and p-value method selectors
//! - [`error`] — Input-rejection errors
//! - [`extended`] — Double-double arithmetic and wide integer accumulators
//! - [`collections`] — Process-wide reclaimable memo tables
//! - [`ranking`] — Average ranks and tie corrections
//! - [`special`] — Gamma, factorial, binomial and error functions
//! - [`distributions`] — Normal distribution
//! - [`random`] — Seeded RNG and resampling
//!
//! ## Design Philosophy
//!
//! - **Numerical stability first**: double-double products for boundary
//!   decisions, power-of-two rescaling instead of log-space where exactness
//!   matters, smallest-first summation
//! - **Explicit dispatch**: the one-sample KS evaluator is picked by a
//!   documented strategy table that is testable on its own
//! - **Property-based testing**: mathematical invariants verified via proptest
//!
//! ## Example
//!
//! ```
//! use u_nonparam::hypothesis::Alternative;
//! use u_nonparam::mann_whitney::MannWhitneyUTest;
//!
//! let r = MannWhitneyUTest::new()
//!     .with_alternative(Alternative::Less)
//!     .test(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0])
//!     .unwrap();
//! assert!((r.p_value - 0.05).abs() < 1e-15);
//! ```

pub mod collections;
pub mod distributions;
pub mod error;
pub mod extended;
pub mod hypothesis;
pub mod ks;
pub mod mann_whitney;
pub mod random;
pub mod ranking;
pub mod special;
pub mod wilcoxon;

pub use error::{Result, TestError};
pub use hypothesis::{Alternative, PValueMethod};
