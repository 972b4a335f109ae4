//! Audio I/O modules
//!
//! Audio decoding using Symphonia and the reverse-ordered sample buffers the
//! search engine reads.

pub mod decoder;
pub mod sample_buffer;

pub use decoder::{decode_file, decode_stream, DecodedTrack};
pub use sample_buffer::{PcmChannels, Sample, SampleBuffer, SampleWindow, SampleWindowMut};
