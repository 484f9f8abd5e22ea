//! Pelz–Good asymptotic series for the two-sided one-sample KS
//! distribution.
//!
//! # Algorithm
//! The Kolmogorov limit plus correction terms in powers of n^(-1/2)
//! (Pelz & Good 1976). Each of the six theta-type series is collected
//! term by term and then summed from its smallest term to its largest.
//!
//! Reference: Pelz & Good (1976), "Approximating the lower tail-areas of
//! the Kolmogorov-Smirnov one-sample statistic", *JRSS B* 38(2).

use std::f64::consts::PI;

const MAX_TERMS: usize = 21;
const EPS: f64 = 1.0e-10;

/// √(2π)
const SQRT_2PI: f64 = 2.506_628_274_631_000_5;
/// √(π/2)
const SQRT_PI_2: f64 = 1.253_314_137_315_500_3;

/// Collects `term(j)` for `j = start..` until a term falls below `EPS`
/// times the running sum, then sums the terms in reverse.
fn series(start: usize, term: impl Fn(f64) -> f64) -> f64 {
    let mut terms = Vec::with_capacity(MAX_TERMS);
    let mut running = 0.0_f64;
    for j in start..start + MAX_TERMS {
        let v = term(j as f64);
        terms.push(v);
        running += v;
        if v.abs() <= EPS * running.abs() {
            break;
        }
    }
    terms.iter().rev().sum()
}

/// Approximate P(Dₙ < d).
pub(crate) fn cdf(d: f64, n: u32) -> f64 {
    let nf = f64::from(n);
    let rn = nf.sqrt();
    let z = rn * d;
    let z2 = z * z;
    let z4 = z2 * z2;
    let z6 = z4 * z2;
    let pi2 = PI * PI;
    let pi4 = pi2 * pi2;
    let w = pi2 / (2.0 * z2);

    let mut sum = series(0, |j| {
        let ti = j + 0.5;
        (-ti * ti * w).exp()
    }) * SQRT_2PI
        / z;

    let tom = series(0, |j| {
        let ti = j + 0.5;
        (pi2 * ti * ti - z2) * (-ti * ti * w).exp()
    });
    sum += tom * SQRT_PI_2 / (rn * 3.0 * z4);

    let tom = series(0, |j| {
        let ti = j + 0.5;
        let t2 = ti * ti;
        (6.0 * z6 + 2.0 * z4 + pi2 * (2.0 * z4 - 5.0 * z2) * t2 + pi4 * (1.0 - 2.0 * z2) * t2 * t2)
            * (-t2 * w).exp()
    });
    sum += tom * SQRT_PI_2 / (nf * 36.0 * z * z6);

    let tom = series(1, |j| pi2 * j * j * (-j * j * w).exp());
    sum -= tom * SQRT_PI_2 / (nf * 18.0 * z * z2);

    let tom = series(0, |j| {
        let ti = (j + 0.5) * (j + 0.5);
        (-30.0 * z6 - 90.0 * z6 * z2
            + pi2 * (135.0 * z4 - 96.0 * z6) * ti
            + pi4 * (212.0 * z4 - 60.0 * z2) * ti * ti
            + pi2 * pi4 * ti * ti * ti * (5.0 - 30.0 * z2))
            * (-ti * w).exp()
    });
    sum += tom * SQRT_PI_2 / (rn * nf * 3240.0 * z4 * z6);

    let tom = series(1, |j| {
        let ti = j * j;
        (3.0 * pi2 * ti * z2 - pi4 * ti * ti) * (-ti * w).exp()
    });
    sum += tom * SQRT_PI_2 / (rn * nf * 108.0 * z6);

    sum.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_converges_to_kolmogorov_limit() {
        // n → ∞: only the leading series remains, P(K ≤ 1) = 0.7300003283
        let p = cdf(1.0 / 1e6_f64.sqrt(), 1_000_000);
        assert!((p - 0.7300003283).abs() < 2e-3, "p = {p}");
    }

    #[test]
    fn test_agrees_with_durbin_moderate_n() {
        use super::super::durbin;
        for &w in &[0.5, 1.0, 1.8] {
            let n = 2000_u32;
            let d = (w / f64::from(n)).sqrt();
            let a = cdf(d, n);
            let b = durbin::cdf(d, n);
            assert!((a - b).abs() < 5e-5, "n={n}, d={d}: pelz-good={a}, durbin={b}");
        }
    }

    #[test]
    fn test_series_sums_smallest_first() {
        let s = series(0, |j| 0.1_f64.powf(j));
        assert!((s - 1.0 / 0.9).abs() < 1e-9);
    }
}
