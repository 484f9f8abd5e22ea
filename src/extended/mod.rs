//! Extended-precision arithmetic.
//!
//! - [`dd`]: double-double values with scaled powers for extreme ranges
//! - [`wide`]: full-width integer products and a 192-bit accumulator

pub mod dd;
pub mod wide;

pub use dd::{scalb, Accuracy, DD};
pub use wide::{mul_high, mul_wide, UInt192};
