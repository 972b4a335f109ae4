//! Audio decoding using Symphonia
//!
//! Produces one reverse-ordered `f32` buffer per channel, the sample rate and
//! the stream's tags.

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use symphonia::core::audio::SampleBuffer as InterleavedBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::{MediaSource, MediaSourceStream};
use symphonia::core::meta::{MetadataOptions, MetadataRevision};
use symphonia::core::probe::Hint;
use symphonia::default::{get_codecs, get_probe};

use super::sample_buffer::{PcmChannels, SampleBuffer};
use crate::error::{AnalysisError, AnalysisResult};

/// File extensions the decoder accepts
pub const SUPPORTED_EXTENSIONS: &[&str] = &["ogg", "oga", "flac", "wav"];

/// Whether `extension` (without the dot) is accepted by the decoder
pub fn is_supported_extension(extension: &str) -> bool {
    SUPPORTED_EXTENSIONS
        .iter()
        .any(|e| e.eq_ignore_ascii_case(extension))
}

/// A fully decoded track
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedTrack {
    /// Channels in reverse sample order
    pub channels: PcmChannels,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Tags keyed by upper-cased name
    pub tags: HashMap<String, String>,
}

impl DecodedTrack {
    /// Tag value by name (case-insensitive)
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(&key.to_ascii_uppercase()).map(String::as_str)
    }

    /// Samples per channel
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Whether the track holds no samples
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Track duration in seconds
    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.len() as f64 / self.sample_rate as f64
    }
}

/// Decode an audio file
///
/// # Errors
///
/// `FileNotFound` / `Io` if the file cannot be opened, otherwise any error of
/// [`decode_stream`].
pub fn decode_file(path: &Path) -> AnalysisResult<DecodedTrack> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let file = File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => AnalysisError::FileNotFound(name.clone()),
        _ => AnalysisError::Io {
            name: name.clone(),
            source: e,
        },
    })?;

    log::debug!("Decoding audio file: {}", path.display());

    let extension = path.extension().and_then(|e| e.to_str());
    decode_stream(Box::new(file), extension)
}

/// Decode a seekable compressed stream
///
/// # Errors
///
/// - `UnknownChannels` / `UnknownLength` if the stream does not say how many
///   channels or frames it has and none could be decoded
/// - `DecodingError` if there is no audio track or no sample rate
/// - `Symphonia` for any stream error other than a clean end of stream
pub fn decode_stream(
    source: Box<dyn MediaSource>,
    extension: Option<&str>,
) -> AnalysisResult<DecodedTrack> {
    let mss = MediaSourceStream::new(source, Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = extension {
        hint.with_extension(ext);
    }

    let mut probed = get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;

    let mut tags = HashMap::new();
    if let Some(metadata) = probed.metadata.get() {
        if let Some(revision) = metadata.current() {
            merge_tags(revision, &mut tags);
        }
    }

    let mut format = probed.format;
    merge_container_tags(format.as_mut(), &mut tags);

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| {
            AnalysisError::DecodingError("No supported audio tracks found".to_string())
        })?;

    let track_id = track.id;
    let codec_params = track.codec_params.clone();
    let mut decoder = get_codecs().make(&codec_params, &DecoderOptions::default())?;

    let mut sample_rate = codec_params.sample_rate;
    let mut channel_count = codec_params.channels.map(|c| c.count());
    let declared_frames = codec_params.n_frames;

    let mut interleaved: Vec<f32> = Vec::new();
    let mut scratch: Option<InterleavedBuffer<f32>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(e) => return Err(e.into()),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                channel_count.get_or_insert(spec.channels.count());
                sample_rate.get_or_insert(spec.rate);

                let needed = decoded.capacity() * spec.channels.count();
                if scratch.as_ref().map_or(true, |b| b.capacity() < needed) {
                    scratch = Some(InterleavedBuffer::new(decoded.capacity() as u64, spec));
                }

                if let Some(buf) = scratch.as_mut() {
                    buf.copy_interleaved_ref(decoded);
                    interleaved.extend_from_slice(buf.samples());
                }
            }
            Err(SymphoniaError::DecodeError(msg)) => {
                log::warn!("Skipping undecodable packet: {}", msg);
            }
            Err(e) => return Err(e.into()),
        }
    }

    merge_container_tags(format.as_mut(), &mut tags);

    let channel_count = match channel_count {
        Some(n) if n > 0 => n,
        _ => return Err(AnalysisError::UnknownChannels),
    };

    let sample_rate = sample_rate
        .filter(|&r| r > 0)
        .ok_or_else(|| AnalysisError::DecodingError("Unknown sample rate".to_string()))?;

    let decoded_frames = interleaved.len() / channel_count;
    let length = declared_frames
        .map(|n| n as usize)
        .unwrap_or(decoded_frames);

    if length == 0 {
        return Err(AnalysisError::UnknownLength);
    }

    if decoded_frames != length {
        log::debug!(
            "Decoded {} frames, stream declares {}; adjusting",
            decoded_frames,
            length
        );
    }

    let mut per_channel: Vec<Vec<f32>> = (0..channel_count)
        .map(|_| Vec::with_capacity(length))
        .collect();

    for frame in interleaved.chunks_exact(channel_count).take(length) {
        for (channel, &sample) in per_channel.iter_mut().zip(frame) {
            channel.push(sample);
        }
    }

    // Missing trailing frames are silence; after reversal they sit at the buffer start.
    let buffers = per_channel
        .into_iter()
        .map(|mut samples| {
            samples.resize(length, 0.0);
            SampleBuffer::from_playback_order(samples)
        })
        .collect();

    log::debug!(
        "Decoded {} channels x {} samples at {} Hz, {} tags",
        channel_count,
        length,
        sample_rate,
        tags.len()
    );

    Ok(DecodedTrack {
        channels: PcmChannels::F32(buffers),
        sample_rate,
        tags,
    })
}

fn merge_container_tags(format: &mut dyn FormatReader, tags: &mut HashMap<String, String>) {
    let mut metadata = format.metadata();
    if let Some(revision) = metadata.skip_to_latest() {
        merge_tags(revision, tags);
    }
}

fn merge_tags(revision: &MetadataRevision, tags: &mut HashMap<String, String>) {
    for tag in revision.tags() {
        tags.insert(tag.key.to_ascii_uppercase(), tag.value.to_string());
    }
}
