//! Alignment search engine
//!
//! Finds the offsets whose windows are closest to a reference window:
//! - Exact distance accumulation
//! - Top-K candidate queue
//! - Branch-and-bound window comparison
//! - Parallel, wave-based search driver

pub mod accumulator;
pub mod aligns;
pub mod compare;
pub mod pool;
pub mod queue;

pub use accumulator::Accumulator;
pub use aligns::{find_best_aligns, AlignSearch};
pub use compare::{compare_channels, compare_windows, Comparison};
pub use queue::{Align, AlignQueue};
