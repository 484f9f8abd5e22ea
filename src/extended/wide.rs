//! Fixed-width integer helpers: full 64×64 products and a 192-bit unsigned
//! accumulator.
//!
//! All `UInt192` arithmetic wraps modulo 2^192. Sums of squares and cubes
//! of sample counts (tie corrections) stay far below that bound.

use super::dd::{scalb, DD};

/// Full 128-bit product of two `u64` values as `(high, low)` words.
///
/// # Examples
/// ```
/// use u_nonparam::extended::mul_wide;
/// assert_eq!(mul_wide(u64::MAX, 2), (1, u64::MAX - 1));
/// ```
pub fn mul_wide(a: u64, b: u64) -> (u64, u64) {
    let p = u128::from(a) * u128::from(b);
    ((p >> 64) as u64, p as u64)
}

/// High 64 bits of the product `a * b`.
pub fn mul_high(a: u64, b: u64) -> u64 {
    mul_wide(a, b).0
}

/// Unsigned 192-bit integer `hi * 2^128 + lo`.
///
/// Field order makes the derived ordering numeric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct UInt192 {
    hi: u64,
    lo: u128,
}

impl UInt192 {
    pub const ZERO: UInt192 = UInt192 { hi: 0, lo: 0 };

    pub const fn from_u128(v: u128) -> Self {
        Self { hi: 0, lo: v }
    }

    /// Builds a value from three 64-bit words, most significant first.
    pub const fn from_words(w2: u64, w1: u64, w0: u64) -> Self {
        Self {
            hi: w2,
            lo: ((w1 as u128) << 64) | w0 as u128,
        }
    }

    /// The three 64-bit words, most significant first.
    pub fn words(&self) -> [u64; 3] {
        [self.hi, (self.lo >> 64) as u64, self.lo as u64]
    }

    pub fn is_zero(&self) -> bool {
        self.hi == 0 && self.lo == 0
    }

    pub fn add_u64(self, v: u64) -> Self {
        self.add_u128(u128::from(v))
    }

    pub fn add_u128(self, v: u128) -> Self {
        let (lo, carry) = self.lo.overflowing_add(v);
        Self {
            hi: self.hi.wrapping_add(u64::from(carry)),
            lo,
        }
    }

    pub fn wrapping_add(self, other: Self) -> Self {
        let (lo, carry) = self.lo.overflowing_add(other.lo);
        Self {
            hi: self
                .hi
                .wrapping_add(other.hi)
                .wrapping_add(u64::from(carry)),
            lo,
        }
    }

    pub fn wrapping_sub(self, other: Self) -> Self {
        let (lo, borrow) = self.lo.overflowing_sub(other.lo);
        Self {
            hi: self
                .hi
                .wrapping_sub(other.hi)
                .wrapping_sub(u64::from(borrow)),
            lo,
        }
    }

    /// Adds `v^2`.
    pub fn add_square(self, v: u64) -> Self {
        self.add_u128(u128::from(v) * u128::from(v))
    }

    /// Multiplies by a 32-bit scalar.
    pub fn mul_u32(self, s: u32) -> Self {
        self.mul_u64(u64::from(s))
    }

    /// Multiplies by a 64-bit scalar.
    pub fn mul_u64(self, s: u64) -> Self {
        let s = u128::from(s);
        let p0 = (self.lo as u64 as u128) * s;
        let p1 = ((self.lo >> 64) as u64 as u128) * s + (p0 >> 64);
        let p2 = u128::from(self.hi) * s + (p1 >> 64);
        Self {
            hi: p2 as u64,
            lo: ((p1 as u64 as u128) << 64) | (p0 as u64 as u128),
        }
    }

    fn shl(self, s: u32) -> Self {
        match s {
            0 => self,
            1..=127 => Self {
                hi: ((u128::from(self.hi) << s) | (self.lo >> (128 - s))) as u64,
                lo: self.lo << s,
            },
            128..=191 => Self {
                hi: (self.lo << (s - 128)) as u64,
                lo: 0,
            },
            _ => Self::ZERO,
        }
    }

    fn bit_length(&self) -> u32 {
        if self.hi != 0 {
            192 - self.hi.leading_zeros()
        } else {
            128 - self.lo.leading_zeros()
        }
    }

    /// Nearest `f64`, ties to even.
    ///
    /// # Algorithm
    /// Extracts the leading 54 bits; the 54th is the rounding bit and every
    /// discarded bit below it folds into a sticky flag.
    ///
    /// # Examples
    /// ```
    /// use u_nonparam::extended::UInt192;
    /// // 2^53 + 1 is a tie between 2^53 and 2^53 + 2; even wins.
    /// let v = UInt192::from_u128((1u128 << 53) + 1);
    /// assert_eq!(v.to_f64(), 9007199254740992.0);
    /// ```
    pub fn to_f64(&self) -> f64 {
        let bits = self.bit_length();
        if bits <= 53 {
            return self.lo as u64 as f64;
        }
        let shift = bits - 54;
        let (top, sticky) = if shift == 0 {
            (self.lo as u64, false)
        } else if shift >= 128 {
            let s = shift - 128;
            let mask = (1u64 << s) - 1;
            (self.hi >> s, self.lo != 0 || self.hi & mask != 0)
        } else {
            let top = ((u128::from(self.hi) << (128 - shift)) | (self.lo >> shift)) as u64;
            let mask = (1u128 << shift) - 1;
            (top, self.lo & mask != 0)
        };
        let mut mantissa = top >> 1;
        if top & 1 == 1 && (sticky || mantissa & 1 == 1) {
            mantissa += 1;
        }
        scalb(mantissa as f64, i64::from(shift) + 1)
    }

    /// Exact value of an integral, non-negative `f64` below 2^192.
    fn from_integral_f64(x: f64) -> Self {
        if x < 1.0 {
            return Self::ZERO;
        }
        let bits = x.to_bits();
        let biased = ((bits >> 52) & 0x7ff) as i64;
        let mantissa = (bits & ((1u64 << 52) - 1)) | (1u64 << 52);
        let e = biased - 1075;
        if e <= 0 {
            Self::from_u128(u128::from(mantissa >> (-e)))
        } else {
            Self::from_u128(u128::from(mantissa)).shl(e as u32)
        }
    }

    /// Value as a double-double: the rounded value plus the rounded
    /// remainder.
    pub fn to_dd(&self) -> DD {
        let hi = self.to_f64();
        if hi.is_infinite() {
            return DD::from_f64(hi);
        }
        let back = Self::from_integral_f64(hi);
        let lo = if *self >= back {
            self.wrapping_sub(back).to_f64()
        } else {
            -back.wrapping_sub(*self).to_f64()
        };
        DD::from_sum(hi, lo)
    }
}

impl From<u64> for UInt192 {
    fn from(v: u64) -> Self {
        Self::from_u128(u128::from(v))
    }
}
