//! # Seamless Loop
//!
//! Finds loop points in music tracks: the loop length and loop start at which
//! playback can jump back without an audible seam.
//!
//! ## Features
//!
//! - **Coarse-to-fine search**: min/max envelope pyramid reduced 16× per level
//! - **Exact scoring**: squared differences summed in an arbitrary-precision accumulator
//! - **Branch-and-bound**: comparisons stop once they exceed the K-th best score
//! - **Parallel**: offset ranges searched in waves on a rayon pool
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::path::Path;
//! use seamless_loop::{decode_file, LoopConfig, LoopDetector};
//!
//! let track = decode_file(Path::new("theme.ogg"))?;
//! let detector = LoopDetector::new(LoopConfig::default())?;
//!
//! let point = detector.find_loop(&track, None)?;
//! println!("start={} length={}", point.loop_start, point.loop_length);
//! # Ok::<(), seamless_loop::AnalysisError>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Decode → Reverse channels → Envelope pyramid → Coarse search → Refinement → Loop start
//! ```
//!
//! Sample buffers are stored last sample first, so the reference window (the
//! last second of the track) always sits at offset 0.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analysis;
pub mod batch;
pub mod config;
pub mod error;
pub mod features;
pub mod io;
pub mod search;

// Re-export main types
pub use analysis::detector::LoopDetector;
pub use analysis::result::{LoopPoint, LoopReport};
pub use batch::TrackOutcome;
pub use config::LoopConfig;
pub use error::{AnalysisError, AnalysisResult};
pub use io::{decode_file, DecodedTrack, PcmChannels, Sample, SampleBuffer};

/// Find the loop point of playback-ordered mono or multi-channel `f32` samples
///
/// Convenience wrapper that builds a [`LoopDetector`] for a single call; keep
/// a detector around when analyzing many tracks.
///
/// # Arguments
///
/// * `channels` - One sample vector per channel, in playback order, equal lengths
/// * `sample_rate` - Sample rate in Hz; also the compared window length
/// * `hint` - Approximate loop length in samples, if known
/// * `config` - Search configuration
///
/// # Errors
///
/// Returns `AnalysisError` if the input is invalid, the track is too short
/// for the search range, or no candidate survives refinement.
///
/// # Example
///
/// ```no_run
/// use seamless_loop::{find_loop_points, LoopConfig};
///
/// let left = vec![0.0f32; 44100 * 30];
/// let right = left.clone();
/// let point = find_loop_points(vec![left, right], 44100, None, LoopConfig::default())?;
/// # Ok::<(), seamless_loop::AnalysisError>(())
/// ```
pub fn find_loop_points(
    channels: Vec<Vec<f32>>,
    sample_rate: u32,
    hint: Option<u64>,
    config: LoopConfig,
) -> AnalysisResult<LoopPoint> {
    log::debug!(
        "Starting loop analysis: {} channels at {} Hz",
        channels.len(),
        sample_rate
    );

    if sample_rate == 0 {
        return Err(AnalysisError::InvalidInput("Invalid sample rate".to_string()));
    }

    let buffers: Vec<SampleBuffer<f32>> = channels
        .into_iter()
        .map(SampleBuffer::from_playback_order)
        .collect();

    LoopDetector::new(config)?.find_loop_in(&buffers, sample_rate, hint)
}
