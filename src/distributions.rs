//! Probability distributions.
//!
//! Distribution objects consumed by the large-sample branches of the rank
//! tests. Parameters are plain `f64` values.

use crate::error::TestError;
use crate::special;

// ============================================================================
// Normal Distribution
// ============================================================================

/// Normal (Gaussian) distribution N(μ, σ²).
///
/// # Mathematical Definition
/// - CDF: Φ((x−μ)/σ)
/// - SF: 1 − Φ((x−μ)/σ), evaluated directly for tail accuracy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normal {
    mu: f64,
    sigma: f64,
}

impl Normal {
    /// Creates a new normal distribution N(μ, σ).
    ///
    /// # Errors
    /// Returns `Err` if `sigma ≤ 0` or parameters are not finite.
    pub fn new(mu: f64, sigma: f64) -> Result<Self, TestError> {
        if !mu.is_finite() || !sigma.is_finite() || sigma <= 0.0 {
            return Err(TestError::InvalidParameter(format!(
                "Normal requires finite μ and σ > 0, got μ={mu}, σ={sigma}"
            )));
        }
        Ok(Self { mu, sigma })
    }

    /// The standard normal N(0, 1).
    pub fn standard() -> Self {
        Self {
            mu: 0.0,
            sigma: 1.0,
        }
    }

    /// CDF: Φ((x−μ)/σ).
    pub fn cdf(&self, x: f64) -> f64 {
        let z = (x - self.mu) / self.sigma;
        special::standard_normal_cdf(z)
    }

    /// Survival function: P(X > x).
    pub fn sf(&self, x: f64) -> f64 {
        let z = (x - self.mu) / self.sigma;
        special::standard_normal_sf(z)
    }
}

impl Default for Normal {
    fn default() -> Self {
        Self::standard()
    }
}
