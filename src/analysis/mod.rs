//! Loop analysis
//!
//! - Coarse-to-fine loop detection
//! - Declared loop metadata (tags and file name options)
//! - Result types

pub mod detector;
pub mod metadata;
pub mod result;

pub use detector::LoopDetector;
pub use metadata::{parse_file_name, parse_loop_length_tag, DeclaredLoop, FileName};
pub use result::{LoopPoint, LoopReport};
