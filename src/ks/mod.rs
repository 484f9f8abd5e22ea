//! Kolmogorov-Smirnov distributions and tests.
//!
//! # Modules
//!
//! - [`one_sample`]: survival function of the one-sample statistic with an
//!   explicit evaluator table
//! - [`limit`]: Kolmogorov's limiting distribution
//! - [`two_sample`]: two-sample statistic and test
//!
//! The evaluators behind the one-sample table (`one_sided`, `durbin`,
//! `pomeranz`, `pelz_good`) and the exact two-sample distribution are
//! private.

mod durbin;
pub mod limit;
pub mod one_sample;
mod one_sided;
mod pelz_good;
mod pomeranz;
pub mod two_sample;
mod two_sample_exact;

pub use limit::ks_sum;
pub use one_sample::{ks_one_sample_sf, TwoSidedStrategy};
pub use two_sample::{
    ks_two_sample_statistic, KolmogorovSmirnovTest, KsTwoSampleResult, TwoSampleStatistic,
};
