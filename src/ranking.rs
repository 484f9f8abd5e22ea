//! Average ranks and tie statistics.
//!
//! Tied values share the mean of the ranks they would occupy. The tie
//! correction Σ(t³ − t) over tie groups of size `t` is accumulated exactly
//! in a [`UInt192`] before a single rounding to `f64`.

use crate::extended::UInt192;

/// Ranks of a sample together with its tie statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct Ranking {
    /// Average rank (1-based) of each value, in input order.
    pub ranks: Vec<f64>,
    /// Σ(t³ − t) over all tie groups.
    pub tie_correction: UInt192,
    /// Whether any two values are equal.
    pub has_ties: bool,
}

/// Ranks `values` with average ranks for ties.
///
/// Values are compared exactly; the caller rejects NaN beforehand.
///
/// # Complexity
/// Time: O(n log n), Space: O(n)
///
/// # Examples
/// ```
/// use u_nonparam::ranking::rank;
/// let r = rank(&[3.0, 1.0, 3.0, 2.0]);
/// assert_eq!(r.ranks, vec![3.5, 1.0, 3.5, 2.0]);
/// assert!(r.has_ties);
/// // one pair: 2³ − 2 = 6
/// assert_eq!(r.tie_correction.to_f64(), 6.0);
/// ```
pub fn rank(values: &[f64]) -> Ranking {
    let n = values.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; n];
    let mut tie_correction = UInt192::ZERO;
    let mut has_ties = false;
    let mut i = 0;
    while i < n {
        let mut j = i + 1;
        while j < n && values[order[j]] == values[order[i]] {
            j += 1;
        }
        // positions i..j are tied; average rank = (i+1 + j) / 2
        let avg_rank = (i + 1 + j) as f64 / 2.0;
        for &idx in &order[i..j] {
            ranks[idx] = avg_rank;
        }
        let t = (j - i) as u64;
        if t > 1 {
            has_ties = true;
            tie_correction = add_tie_group(tie_correction, t);
        }
        i = j;
    }

    Ranking {
        ranks,
        tie_correction,
        has_ties,
    }
}

/// Σ(t³ − t) over the tie groups of `values`.
///
/// # Examples
/// ```
/// use u_nonparam::ranking::tie_correction;
/// // groups of 3 and 2: (27 − 3) + (8 − 2)
/// assert_eq!(tie_correction(&[1.0, 1.0, 1.0, 2.0, 2.0, 5.0]).to_f64(), 30.0);
/// ```
pub fn tie_correction(values: &[f64]) -> UInt192 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mut acc = UInt192::ZERO;
    let mut i = 0;
    while i < sorted.len() {
        let mut j = i + 1;
        while j < sorted.len() && sorted[j] == sorted[i] {
            j += 1;
        }
        let t = (j - i) as u64;
        if t > 1 {
            acc = add_tie_group(acc, t);
        }
        i = j;
    }
    acc
}

/// Adds t³ − t = (t − 1)·t·(t + 1).
fn add_tie_group(acc: UInt192, t: u64) -> UInt192 {
    let term = UInt192::from_u128(u128::from(t - 1) * u128::from(t)).mul_u64(t + 1);
    acc.wrapping_add(term)
}
