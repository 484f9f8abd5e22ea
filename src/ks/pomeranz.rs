//! Pomeranz recursion for the two-sided one-sample KS distribution.
//!
//! # Algorithm
//! Pomeranz (1974) in the formulation of Simard & L'Ecuyer (2011). The
//! boundary points 0 ≤ A₁ ≤ … ≤ A₂ₙ₊₂ = n split the line into intervals of
//! only three distinct widths (2z, 1 − 2z, z) where z is the distance from
//! n·d to the nearest integer, so the transition weights wʲ/j! come from
//! three precomputed rows. Each step convolves the previous row with one of
//! them inside the window given by the floor/ceiling limits.
//!
//! Rows whose largest entry drops below 2^-128 are multiplied by 2^128 and
//! the scale is removed at the end in log space.
//!
//! References:
//! - Pomeranz (1974), "Exact cumulative distribution of the
//!   Kolmogorov-Smirnov statistic for small samples", *CACM* 17(12).
//! - Simard & L'Ecuyer (2011), "Computing the Two-Sided
//!   Kolmogorov-Smirnov Distribution", *Journal of Statistical Software*
//!   39(11).

use crate::extended::{scalb, DD};
use crate::special::ln_factorial;

const RENORM_BITS: i64 = 128;

/// Floor and ceiling limits of the admissible column window for each
/// boundary index `1..=2n+2`.
fn limits(n: usize, ell: i64, frac: f64) -> (Vec<i64>, Vec<i64>) {
    let len = 2 * n + 3;
    let mut flo = vec![0_i64; len];
    let mut cei = vec![0_i64; len];
    for i in 1..len {
        let half = (i / 2) as i64;
        let odd = i % 2 == 1;
        if frac > 0.5 {
            flo[i] = if odd { half - 1 - ell } else { half - 2 - ell };
            cei[i] = if odd { half + 1 + ell } else { half + ell };
        } else if frac > 0.0 {
            flo[i] = half - 1 - ell;
            cei[i] = if i == 1 { 1 + ell } else { half + ell };
        } else {
            flo[i] = if odd { half - ell } else { half - 1 - ell };
            cei[i] = if odd { half + ell } else { half - 1 + ell };
        }
    }
    (flo, cei)
}

/// P(Dₙ < d).
pub(crate) fn cdf(d: f64, n: u32) -> f64 {
    let nu = n as usize;
    let nf = f64::from(n);
    let t = DD::from_product(nf, d);
    let ell_dd = t.floor();
    let ell = ell_dd.to_f64() as i64;
    let frac = (t - ell_dd).to_f64();
    let to_ceil = if frac > 0.0 {
        (ell_dd.add_f64(1.0) - t).to_f64()
    } else {
        0.0
    };
    let (flo, cei) = limits(nu, ell, frac);
    let z = frac.min(to_ceil);

    // transition rows: widths 2z, 1 − 2z, z (scaled by 1/n)
    let widths = [2.0 * z / nf, (1.0 - 2.0 * z) / nf, z / nf];
    let mut h = [vec![0.0; nu + 2], vec![0.0; nu + 2], vec![0.0; nu + 2]];
    for (row, &w) in h.iter_mut().zip(widths.iter()) {
        row[0] = 1.0;
        for j in 1..=nu + 1 {
            row[j] = row[j - 1] * w / j as f64;
        }
    }

    let mut prev = vec![0.0; nu + 2];
    let mut cur = vec![0.0; nu + 2];
    prev[1] = 1.0;
    let mut scale = 0_i64;
    let tiny = scalb(1.0, -RENORM_BITS);
    let last = 2 * nu + 2;
    let top = (nu + 1) as i64;

    for i in 2..=last {
        let jlow = (2 + flo[i]).max(1);
        let jup = cei[i].min(top);
        let klow = (2 + flo[i - 1]).max(1);
        let kup0 = cei[i - 1];
        let row = if i == 2 || i == last {
            &h[2]
        } else if i % 2 == 0 {
            &h[0]
        } else {
            &h[1]
        };

        cur.iter_mut().for_each(|v| *v = 0.0);
        let mut largest = 0.0_f64;
        for j in jlow..=jup {
            let kup = kup0.min(j);
            let mut sum = 0.0;
            let mut k = kup;
            while k >= klow {
                sum += prev[k as usize] * row[(j - k) as usize];
                k -= 1;
            }
            cur[j as usize] = sum;
            largest = largest.max(sum);
        }
        if largest > 0.0 && largest < tiny {
            for v in cur.iter_mut() {
                *v = scalb(*v, RENORM_BITS);
            }
            scale += RENORM_BITS;
        }
        std::mem::swap(&mut prev, &mut cur);
    }

    let v = prev[nu + 1];
    if v <= 0.0 {
        return 0.0;
    }
    let ln_p = ln_factorial(u64::from(n)) - scale as f64 * std::f64::consts::LN_2 + v.ln();
    ln_p.exp().clamp(0.0, 1.0)
}
