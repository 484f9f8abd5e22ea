//! Kolmogorov's limiting distribution.

use std::f64::consts::PI;

/// P(K > z) for the Kolmogorov distribution K = lim √n·Dₙ.
///
/// # Algorithm
/// For z < 1.18 the Jacobi-transformed series
/// `1 − (√(2π)/z) Σ exp(−(2k−1)²π²/(8z²))`, otherwise the alternating
/// series `2 Σ (−1)^(k−1) exp(−2k²z²)`. Both converge in a handful of
/// terms on their side of the switch.
///
/// Independent of n, so it serves as an O(1) approximation for very
/// large samples.
///
/// # Examples
/// ```
/// use u_nonparam::ks::ks_sum;
/// assert!((ks_sum(1.3581) - 0.05).abs() < 1e-4);
/// assert_eq!(ks_sum(0.0), 1.0);
/// ```
pub fn ks_sum(z: f64) -> f64 {
    if z.is_nan() {
        return f64::NAN;
    }
    if z <= 0.0 {
        return 1.0;
    }
    if z == f64::INFINITY {
        return 0.0;
    }
    if z < 1.18 {
        let w = PI * PI / (8.0 * z * z);
        let mut sum = 0.0;
        for k in 1..=20 {
            let a = (2 * k - 1) as f64;
            let term = (-a * a * w).exp();
            sum += term;
            if term <= 1e-17 * sum {
                break;
            }
        }
        (1.0 - (2.0 * PI).sqrt() / z * sum).clamp(0.0, 1.0)
    } else {
        let mut sum = 0.0;
        let mut sign = 1.0;
        for k in 1..=20 {
            let kf = f64::from(k);
            let term = (-2.0 * kf * kf * z * z).exp();
            sum += sign * term;
            sign = -sign;
            if term <= 1e-17 * sum.abs() {
                break;
            }
        }
        (2.0 * sum).clamp(0.0, 1.0)
    }
}
