//! Error types for the loop analysis engine

use symphonia::core::errors::Error as SymphoniaError;
use thiserror::Error;

/// Convenience alias for results produced by this crate
pub type AnalysisResult<T> = Result<T, AnalysisError>;

/// Errors that can occur while decoding or analyzing a track
///
/// Every variant is terminal for the file being processed; the batch layer
/// reports it and moves on to the next file.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Invalid input parameters
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Input file does not exist
    #[error("File does not exist: {0}")]
    FileNotFound(String),

    /// Input file exists but could not be opened or read
    #[error("Could not open file: {name}")]
    Io {
        /// File name as reported to the user
        name: String,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// File extension is not handled by the decoder
    #[error("Extension {extension} not supported: {name}")]
    UnsupportedFormat {
        /// File name as reported to the user
        name: String,
        /// Extension including the leading dot, or empty
        extension: String,
    },

    /// File name could not be split into name, options and extension
    #[error("Could not parse filename: {0}")]
    MalformedFilename(String),

    /// Channel count missing from both the stream header and the decoded data
    #[error("could not determine channel count")]
    UnknownChannels,

    /// Track length missing from the stream header and no frames decoded
    #[error("could not determine length")]
    UnknownLength,

    /// Audio decoding error reported by this crate
    #[error("Decoding error: {0}")]
    DecodingError(String),

    /// Error raised by the symphonia demuxer or codec
    #[error(transparent)]
    Symphonia(#[from] SymphoniaError),

    /// The search range collapsed to nothing
    #[error("file is too short: {length} samples, at least {minimum} required")]
    TrackTooShort {
        /// Track length in samples per channel
        length: usize,
        /// Minimum length required for the configured window
        minimum: usize,
    },

    /// Processing error during analysis
    #[error("Processing error: {0}")]
    ProcessingError(String),
}
