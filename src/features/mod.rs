//! Multi-resolution feature construction
//!
//! Builds the (min, max) envelope pyramid the loop search runs on:
//! - Block-wise min/max reduction
//! - Pyramid level assembly

pub mod pyramid;
pub mod requantize;

pub use pyramid::{Pyramid, PyramidLevel};
