//! Durbin matrix method for the two-sided one-sample KS distribution.
//!
//! # Algorithm
//! Marsaglia, Tsang & Wang (2003): with k = ⌊nd⌋ + 1, m = 2k − 1 and
//! h = k − nd, P(Dₙ < d) = n!/nⁿ · (Hⁿ)ₖₖ for an m×m matrix H built from
//! powers of h. The matrix power is taken by repeated squaring; whenever
//! the centre element grows past 2^460 the matrix is scaled down and the
//! power-of-two exponent is tracked as an integer.
//!
//! Reference: Marsaglia, Tsang & Wang (2003), "Evaluating Kolmogorov's
//! Distribution", *Journal of Statistical Software* 8(18).

use crate::extended::{scalb, DD};

const SCALE_BITS: i64 = 460;

/// P(Dₙ < d).
pub(crate) fn cdf(d: f64, n: u32) -> f64 {
    let t = DD::from_product(f64::from(n), d);
    let k = t.floor().to_f64() as usize + 1;
    let m = 2 * k - 1;
    let h = (DD::from_f64(k as f64) - t).to_f64();

    let mut hm = vec![0.0; m * m];
    for i in 0..m {
        for j in 0..m {
            if i + 1 >= j {
                hm[i * m + j] = 1.0;
            }
        }
    }
    let mut hp = h;
    for i in 0..m {
        hm[i * m] -= hp;
        hp *= h;
    }
    // last row: subtract h^(m−i)
    let mut hp = h;
    for i in (0..m).rev() {
        hm[(m - 1) * m + i] -= hp;
        hp *= h;
    }
    if 2.0 * h - 1.0 > 0.0 {
        hm[(m - 1) * m] += (2.0 * h - 1.0).powi(m as i32);
    }
    for i in 0..m {
        for j in 0..m {
            if i + 1 > j {
                let mut g = 1.0;
                for f in 1..=(i + 1 - j) {
                    g *= f as f64;
                }
                hm[i * m + j] /= g;
            }
        }
    }

    let (q, mut e) = matrix_power(&hm, m, n);
    let mut s = q[(k - 1) * m + k - 1];
    let nf = f64::from(n);
    let low = scalb(1.0, -SCALE_BITS);
    for i in 1..=n {
        s = s * f64::from(i) / nf;
        if s < low {
            s = scalb(s, SCALE_BITS);
            e -= SCALE_BITS;
        }
    }
    scalb(s, e).clamp(0.0, 1.0)
}

fn mat_mul(a: &[f64], b: &[f64], m: usize) -> Vec<f64> {
    let mut c = vec![0.0; m * m];
    for i in 0..m {
        for l in 0..m {
            let a_il = a[i * m + l];
            if a_il == 0.0 {
                continue;
            }
            for j in 0..m {
                c[i * m + j] += a_il * b[l * m + j];
            }
        }
    }
    c
}

/// `a^n` with its power-of-two scale: the true power is `v · 2^e`.
fn matrix_power(a: &[f64], m: usize, n: u32) -> (Vec<f64>, i64) {
    let mut v = a.to_vec();
    let mut e = 0_i64;
    let top_bit = 31 - n.leading_zeros();
    let high = scalb(1.0, SCALE_BITS);
    let centre = (m / 2) * m + m / 2;
    for bit in (0..top_bit).rev() {
        v = mat_mul(&v, &v, m);
        e *= 2;
        if (n >> bit) & 1 == 1 {
            v = mat_mul(a, &v, m);
        }
        if v[centre] > high {
            for x in v.iter_mut() {
                *x = scalb(*x, -SCALE_BITS);
            }
            e += SCALE_BITS;
        }
    }
    (v, e)
}
