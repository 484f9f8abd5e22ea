//! Data structures.
//!
//! - [`ReclaimableCache`]: shared extend-only memo table with reclaim

pub mod reclaimable;

pub use reclaimable::{ExtendOnly, ReclaimableCache};
