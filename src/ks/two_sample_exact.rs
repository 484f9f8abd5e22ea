//! Exact null distribution of the two-sample KS statistic.
//!
//! Statistics are integral: for samples of sizes n and m the statistic
//! n·m·D is an integer `d`, and every function here returns
//! P(n·m·D ≥ d) under the null hypothesis that all C(n+m, n) orderings of
//! the pooled sample are equally likely.
//!
//! A sample ordering is a lattice path from (0, 0) to (n, m); an x-step
//! adds m to the running value and a y-step subtracts n.
//!
//! `None` means the exact computation is not available for these sizes.
//!
//! References:
//! - Hodges (1957), "The significance probability of the Smirnov
//!   two-sample test", *Arkiv för Matematik* 3(5).
//! - Viehmann (2021), "Numerically more stable computation of the
//!   p-values for the two-sample Kolmogorov-Smirnov test",
//!   arXiv:2102.08037.

use crate::special::binomial_coefficient;

/// Fixed cap on lcm(n, m) for the stabilized inner recursion.
pub(crate) const MAX_LCM: u64 = i32::MAX as u64;

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

fn lcm(a: u64, b: u64) -> Option<u64> {
    (a / gcd(a, b)).checked_mul(b)
}

/// P(n·m·D⁺ ≥ d) for D⁺ = sup(Fx − Fy), x of size n and y of size m.
pub(crate) fn sf_one_sided(d: i64, n: usize, m: usize) -> Option<f64> {
    if d <= 0 {
        return Some(1.0);
    }
    let total = (n as i64).checked_mul(m as i64)?;
    if d > total {
        return Some(0.0);
    }
    if n == m {
        return Some(hodges_one_sided(ceil_div(d, n as i64), n));
    }
    outer_one_sided(d, n, m)
}

/// P(n·m·D ≥ d) for D = sup |Fx − Fy|.
pub(crate) fn sf_two_sided(d: i64, n: usize, m: usize) -> Option<f64> {
    if d <= 0 {
        return Some(1.0);
    }
    let total = (n as i64).checked_mul(m as i64)?;
    if d > total {
        return Some(0.0);
    }
    if n == m {
        return Some(hodges_two_sided(ceil_div(d, n as i64), n));
    }
    if 2 * d > total {
        // D⁺ ≥ d and D⁻ ≥ d are disjoint; summing keeps relative accuracy
        if let (Some(plus), Some(minus)) = (outer_one_sided(d, n, m), outer_one_sided(d, m, n)) {
            return Some((plus + minus).min(1.0));
        }
    }
    inner_two_sided(d, n, m)
}

fn ceil_div(a: i64, b: i64) -> i64 {
    (a + b - 1) / b
}

/// C(2n, n − h) / C(2n, n) = Π_{i<h} (n − i)/(n + 1 + i).
fn hodges_ratio(h: usize, n: usize) -> f64 {
    if h > n {
        return 0.0;
    }
    (0..h).fold(1.0, |acc, i| acc * (n - i) as f64 / (n + 1 + i) as f64)
}

/// Equal sizes, one-sided: P(n·D⁺ ≥ h).
fn hodges_one_sided(h: i64, n: usize) -> f64 {
    if h <= 0 {
        return 1.0;
    }
    hodges_ratio(h as usize, n)
}

/// Equal sizes, two-sided: P(n·D ≥ h) = 2 Σ (−1)^(i−1) C(2n, n − ih)/C(2n, n).
fn hodges_two_sided(h: i64, n: usize) -> f64 {
    if h <= 0 {
        return 1.0;
    }
    let h = h as usize;
    let mut terms = Vec::new();
    let mut ratio = 1.0;
    let mut l = 0;
    let mut i = 1;
    while i * h <= n {
        while l < i * h {
            ratio *= (n - l) as f64 / (n + 1 + l) as f64;
            l += 1;
        }
        terms.push(if i % 2 == 1 { ratio } else { -ratio });
        i += 1;
    }
    let sum: f64 = terms.iter().rev().sum();
    (2.0 * sum).clamp(0.0, 1.0)
}

/// One-sided first-passage count over the boundary points (i_j, j),
/// i_j = ⌈(d + j·n)/m⌉.
fn outer_one_sided(d: i64, n: usize, m: usize) -> Option<f64> {
    let total_paths = binomial_coefficient((n + m) as u64, n as u64);
    if !total_paths.is_finite() {
        return None;
    }
    let (ni, mi) = (n as i64, m as i64);
    let mut points: Vec<(usize, usize)> = Vec::new();
    let mut first_hits: Vec<f64> = Vec::new();
    let mut p = 0.0;
    for j in 0..=m {
        let i = ceil_div(d + j as i64 * ni, mi);
        if i > ni {
            break;
        }
        let i = i as usize;
        let mut a = binomial_coefficient((i + j) as u64, j as u64);
        for (&(il, l), &al) in points.iter().zip(first_hits.iter()) {
            a -= al * binomial_coefficient((i - il + j - l) as u64, (j - l) as u64);
        }
        if !a.is_finite() {
            return None;
        }
        let rest = binomial_coefficient((n - i + m - j) as u64, (m - j) as u64);
        p += a * rest / total_paths;
        points.push((i, j));
        first_hits.push(a);
    }
    Some(p.clamp(0.0, 1.0))
}

/// Two-sided probability via the normalized inner recursion
/// u(i,j) = [i·u(i−1,j) + j·u(i,j−1)]/(i+j), restricted to |im − jn| < d.
fn inner_two_sided(d: i64, n: usize, m: usize) -> Option<f64> {
    if lcm(n as u64, m as u64)? > MAX_LCM {
        return None;
    }
    let (ni, mi) = (n as i64, m as i64);
    let mut u = vec![0.0_f64; m + 1];
    let mut prev_lo = 0_usize;
    for i in 0..=n {
        let im = i as i64 * mi;
        // open window (im − d)/n < j < (im + d)/n
        let lo = ((im - d).div_euclid(ni) + 1).max(0);
        let hi = ((im + d - 1).div_euclid(ni)).min(mi);
        if lo > hi {
            return Some(1.0);
        }
        let (lo, hi) = (lo as usize, hi as usize);
        for v in u.iter_mut().take(lo).skip(prev_lo) {
            *v = 0.0;
        }
        for j in lo..=hi {
            if i == 0 && j == 0 {
                u[0] = 1.0;
                continue;
            }
            let from_x = if i > 0 { i as f64 * u[j] } else { 0.0 };
            let from_y = if j > lo { j as f64 * u[j - 1] } else { 0.0 };
            u[j] = (from_x + from_y) / (i + j) as f64;
        }
        prev_lo = lo;
    }
    Some((1.0 - u[m]).max(0.0))
}
