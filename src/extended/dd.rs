//! Double-double arithmetic.
//!
//! A [`DD`] is the unevaluated sum `hi + lo` of two `f64` values with
//! `|lo| <= ulp(hi)/2`, giving roughly 106 bits of significand. Values are
//! immutable; every operation returns a new value.
//!
//! Extreme dynamic range (`n^n` for `n` in the millions) is handled by
//! [`DD::frexp`] and [`DD::pow_scaled`], which return a fraction in
//! `[0.5, 1)` together with a separate `i64` power-of-two exponent.
//!
//! References:
//! - Dekker (1971), "A floating-point technique for extending the
//!   available precision", *Numerische Mathematik* 18(3).
//! - Hida, Li & Bailey (2001), "Algorithms for quad-double precision
//!   floating point arithmetic", ARITH-15.

use std::ops::{Add, Div, Mul, Neg, Sub};

/// Accuracy tier for [`DD::pow_scaled`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accuracy {
    /// Products keep only the first-order error term and skip
    /// renormalization. Enough for sums of positive terms that need
    /// 53 + guard bits.
    Fast,
    /// Full double-double products (about 106 bits). Required when
    /// terms cancel.
    High,
}

/// Double-double number `hi + lo`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DD {
    hi: f64,
    lo: f64,
}

impl DD {
    pub const ZERO: DD = DD { hi: 0.0, lo: 0.0 };
    pub const ONE: DD = DD { hi: 1.0, lo: 0.0 };

    /// Exact conversion from a single `f64`.
    pub const fn from_f64(x: f64) -> Self {
        Self { hi: x, lo: 0.0 }
    }

    /// Exact sum `a + b` (Knuth's two-sum).
    pub fn from_sum(a: f64, b: f64) -> Self {
        let s = a + b;
        let z = s - a;
        let e = (a - (s - z)) + (b - z);
        Self { hi: s, lo: e }
    }

    /// Exact product `a * b` (fused multiply-add error term).
    ///
    /// # Examples
    /// ```
    /// use u_nonparam::extended::DD;
    /// let p = DD::from_product(0.1, 3.0);
    /// // 0.1 * 3 is not representable; the low word holds the error.
    /// assert!(p.lo() != 0.0);
    /// assert_eq!(p.hi() + p.lo(), p.to_f64());
    /// ```
    pub fn from_product(a: f64, b: f64) -> Self {
        let p = a * b;
        let e = a.mul_add(b, -p);
        Self { hi: p, lo: e }
    }

    /// Sum of `a + b` assuming `|a| >= |b|`.
    fn fast_two_sum(a: f64, b: f64) -> Self {
        let s = a + b;
        let e = b - (s - a);
        Self { hi: s, lo: e }
    }

    pub fn hi(&self) -> f64 {
        self.hi
    }

    pub fn lo(&self) -> f64 {
        self.lo
    }

    /// Nearest `f64` to the value.
    pub fn to_f64(self) -> f64 {
        self.hi + self.lo
    }

    pub fn is_finite(&self) -> bool {
        self.hi.is_finite() && self.lo.is_finite()
    }

    pub fn add_f64(self, b: f64) -> Self {
        let s = Self::from_sum(self.hi, b);
        Self::fast_two_sum(s.hi, s.lo + self.lo)
    }

    pub fn mul_f64(self, b: f64) -> Self {
        let p = Self::from_product(self.hi, b);
        Self::fast_two_sum(p.hi, p.lo + self.lo * b)
    }

    pub fn div_f64(self, b: f64) -> Self {
        self / Self::from_f64(b)
    }

    /// Largest integer not greater than the value.
    pub fn floor(self) -> Self {
        let h = self.hi.floor();
        if h == self.hi {
            Self::fast_two_sum(h, self.lo.floor())
        } else {
            Self { hi: h, lo: 0.0 }
        }
    }

    /// Splits into a fraction with magnitude in `[0.5, 1)` and a
    /// power-of-two exponent: `self = fraction * 2^exponent`.
    ///
    /// Zero and non-finite values are returned unchanged with exponent 0.
    pub fn frexp(self) -> (Self, i64) {
        if self.hi == 0.0 || !self.hi.is_finite() {
            return (self, 0);
        }
        let e = exponent(self.hi);
        (self.ldexp(-e), e)
    }

    /// Multiplies by `2^k` exactly (barring overflow or underflow).
    pub fn ldexp(self, k: i64) -> Self {
        Self {
            hi: scalb(self.hi, k),
            lo: scalb(self.lo, k),
        }
    }

    /// Computes `self^n` as a normalized `(fraction, exponent)` pair so the
    /// result never overflows or underflows.
    ///
    /// `self` must be positive. `x^0` is returned as `(0.5, 1)`.
    ///
    /// # Examples
    /// ```
    /// use u_nonparam::extended::{Accuracy, DD};
    /// let (f, e) = DD::from_f64(3.0).pow_scaled(4, Accuracy::High);
    /// assert_eq!(f.to_f64() * 2f64.powi(e as i32), 81.0);
    /// ```
    pub fn pow_scaled(self, n: u64, accuracy: Accuracy) -> (Self, i64) {
        let mul = match accuracy {
            Accuracy::Fast => Self::mul_fast,
            Accuracy::High => Self::mul,
        };
        let (mut base, mut base_exp) = self.frexp();
        let mut result = Self::ONE;
        let mut result_exp = 0i64;
        let mut k = n;
        while k != 0 {
            if k & 1 == 1 {
                let (f, e) = mul(result, base).frexp();
                result = f;
                result_exp += base_exp + e;
            }
            k >>= 1;
            if k != 0 {
                let (f, e) = mul(base, base).frexp();
                base = f;
                base_exp = 2 * base_exp + e;
            }
        }
        let (f, e) = result.frexp();
        (f, result_exp + e)
    }

    /// Product keeping the cross terms but without the final
    /// renormalization.
    fn mul_fast(self, b: Self) -> Self {
        let p = Self::from_product(self.hi, b.hi);
        Self {
            hi: p.hi,
            lo: p.lo + (self.hi * b.lo + self.lo * b.hi),
        }
    }
}

impl From<f64> for DD {
    fn from(x: f64) -> Self {
        Self::from_f64(x)
    }
}

impl Add for DD {
    type Output = DD;

    fn add(self, b: DD) -> DD {
        let s = DD::from_sum(self.hi, b.hi);
        let t = DD::from_sum(self.lo, b.lo);
        let u = DD::fast_two_sum(s.hi, s.lo + t.hi);
        DD::fast_two_sum(u.hi, u.lo + t.lo)
    }
}

impl Neg for DD {
    type Output = DD;

    fn neg(self) -> DD {
        DD {
            hi: -self.hi,
            lo: -self.lo,
        }
    }
}

impl Sub for DD {
    type Output = DD;

    fn sub(self, b: DD) -> DD {
        self + (-b)
    }
}

impl Mul for DD {
    type Output = DD;

    fn mul(self, b: DD) -> DD {
        let p = DD::from_product(self.hi, b.hi);
        DD::fast_two_sum(p.hi, p.lo + (self.hi * b.lo + self.lo * b.hi))
    }
}

impl Div for DD {
    type Output = DD;

    /// Long division with three quotient digits.
    fn div(self, b: DD) -> DD {
        let q1 = self.hi / b.hi;
        let r = self - b.mul_f64(q1);
        let q2 = r.hi / b.hi;
        let r = r - b.mul_f64(q2);
        let q3 = r.hi / b.hi;
        DD::fast_two_sum(q1, q2).add_f64(q3)
    }
}

// ============================================================================
// Power-of-two helpers
// ============================================================================

/// `2^k` for `k` in the normal exponent range `[-1022, 1023]`.
fn pow2(k: i64) -> f64 {
    f64::from_bits(((k + 1023) as u64) << 52)
}

/// Exponent `e` such that `x = f * 2^e` with `|f|` in `[0.5, 1)`.
///
/// `x` must be finite and non-zero.
pub(crate) fn exponent(x: f64) -> i64 {
    let biased = ((x.to_bits() >> 52) & 0x7ff) as i64;
    if biased == 0 {
        // subnormal
        exponent(x * pow2(64)) - 64
    } else {
        biased - 1022
    }
}

/// Computes `x * 2^k` with a single rounding, for any `k`.
///
/// Intermediate scaling follows the classic `scalbn` construction so that
/// only the last multiplication can round into the subnormal range.
///
/// # Examples
/// ```
/// use u_nonparam::extended::scalb;
/// assert_eq!(scalb(0.75, 3), 6.0);
/// assert_eq!(scalb(1.0, -1074), f64::from_bits(1));
/// assert_eq!(scalb(1.0, 2000), f64::INFINITY);
/// ```
pub fn scalb(x: f64, k: i64) -> f64 {
    if x == 0.0 || !x.is_finite() {
        return x;
    }
    let mut y = x;
    let mut k = k;
    if k > 1023 {
        y *= pow2(1023);
        k -= 1023;
        if k > 1023 {
            y *= pow2(1023);
            k -= 1023;
            k = k.min(1023);
        }
    } else if k < -1022 {
        // 2^-969 = 2^-1022 * 2^53 keeps y normal until the last step
        y *= pow2(-969);
        k += 969;
        if k < -1022 {
            y *= pow2(-969);
            k += 969;
            k = k.max(-1022);
        }
    }
    y * pow2(k)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(500))]

        #[test]
        fn two_sum_error_free(a in -1e10_f64..1e10, b in -1e10_f64..1e10) {
            let s = DD::from_sum(a, b);
            // hi is the rounded sum and the pair is normalized
            prop_assert_eq!(s.hi(), a + b);
            prop_assert!(s.lo().abs() <= s.hi().abs() * f64::EPSILON || s.hi() == 0.0);
        }

        #[test]
        fn mul_div_roundtrip(a in 0.001_f64..1e6, b in 0.001_f64..1e6) {
            let q = DD::from_f64(a) / DD::from_f64(b);
            let back = (q * DD::from_f64(b) - DD::from_f64(a)).to_f64();
            prop_assert!(back.abs() <= a * 1e-30, "residual {} for {} / {}", back, a, b);
        }

        #[test]
        fn pow_tiers_agree(x in 0.1_f64..10.0, n in 0_u64..2000) {
            let (f1, e1) = DD::from_f64(x).pow_scaled(n, Accuracy::High);
            let (f2, e2) = DD::from_f64(x).pow_scaled(n, Accuracy::Fast);
            let a = f1.ldexp(e1 - e1.max(e2));
            let b = f2.ldexp(e2 - e1.max(e2));
            let rel = ((a - b).to_f64() / a.to_f64()).abs();
            prop_assert!(rel < 1e-25, "relative difference {} for {}^{}", rel, x, n);
        }
    }
}
