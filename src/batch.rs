//! Per-file loop analysis
//!
//! Resolves the loop hint for a file from the caller, the file name options
//! and the `LOOPLENGTH` tag, in that order, and skips files declared to loop
//! end-to-end. File name options are only read when the caller gives no hint.

use std::path::{Path, PathBuf};

use crate::analysis::metadata::{
    parse_file_name, parse_loop_length_tag, DeclaredLoop, LOOP_LENGTH_TAG,
};
use crate::analysis::{LoopDetector, LoopReport};
use crate::error::{AnalysisError, AnalysisResult};
use crate::io::decoder::{decode_file, is_supported_extension, DecodedTrack};

/// What happened to one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackOutcome {
    /// A loop point was found
    Analyzed(LoopReport),
    /// The file declares an end-to-end loop and was not analyzed
    Skipped {
        /// Path of the file as given
        file: String,
        /// Why it was skipped
        reason: String,
    },
}

/// Decode and analyze one file
///
/// `hint` takes priority over a loop length in the file name, which takes
/// priority over the `LOOPLENGTH` tag. With a `hint`, file name options are
/// ignored, so an `l0` option does not skip the file.
///
/// # Errors
///
/// `FileNotFound` if the path does not exist, `UnsupportedFormat` for an
/// extension the decoder does not handle, and any decoding or analysis error.
pub fn analyze_file(
    path: &Path,
    hint: Option<u64>,
    detector: &LoopDetector,
) -> AnalysisResult<TrackOutcome> {
    let display = path.display().to_string();

    if !path.exists() {
        return Err(AnalysisError::FileNotFound(display));
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| AnalysisError::MalformedFilename(display.clone()))?;
    let parsed = parse_file_name(&file_name);

    let from_name = match hint {
        Some(_) => DeclaredLoop::Absent,
        None => parsed.declared_loop(),
    };
    if from_name == DeclaredLoop::EndToEnd {
        log::info!("Skipping {}: file name declares an end-to-end loop", display);
        return Ok(TrackOutcome::Skipped {
            file: display,
            reason: "file name declares an end-to-end loop".to_string(),
        });
    }

    if !is_supported_extension(parsed.extension_bare()) {
        return Err(AnalysisError::UnsupportedFormat {
            name: file_name,
            extension: parsed.extension,
        });
    }

    let track = decode_file(path)?;
    analyze_track(&display, &parsed.name, &track, hint.or(from_name.hint()), detector)
}

/// Analyze an already decoded track
///
/// A `LOOPLENGTH` tag of zero skips the track; a positive one is used as the
/// hint when `hint` is `None` and is reported as the previous loop length.
pub fn analyze_track(
    file: &str,
    name: &str,
    track: &DecodedTrack,
    hint: Option<u64>,
    detector: &LoopDetector,
) -> AnalysisResult<TrackOutcome> {
    let declared = parse_loop_length_tag(track.tag(LOOP_LENGTH_TAG));

    if declared == DeclaredLoop::EndToEnd {
        log::info!("Skipping {}: {} is 0 (end-to-end loop)", file, LOOP_LENGTH_TAG);
        return Ok(TrackOutcome::Skipped {
            file: file.to_string(),
            reason: format!("{} is 0", LOOP_LENGTH_TAG),
        });
    }

    let previous_loop_length = declared.hint();
    let hint = hint.or(previous_loop_length);

    log::info!(
        "Analyzing {}: {:.1} s, {} channels at {} Hz, hint={:?}",
        file,
        track.duration_seconds(),
        track.channels.channel_count(),
        track.sample_rate,
        hint
    );

    let loop_point = detector.find_loop(track, hint)?;

    Ok(TrackOutcome::Analyzed(LoopReport {
        file: file.to_string(),
        name: name.to_string(),
        loop_point,
        previous_loop_length,
    }))
}

/// One line of interactive input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteractiveCommand {
    /// Empty line or `q`
    Quit,
    /// Analyze a file with an optional hint
    Analyze {
        /// File to analyze, joined onto the base directory
        path: PathBuf,
        /// Loop length hint; `0` counts as none
        hint: Option<u64>,
    },
    /// The hint after the comma is not a number
    BadHint,
}

/// Parse an interactive line of the form `path[,hint]`
pub fn parse_interactive_line(line: &str, base_dir: Option<&Path>) -> InteractiveCommand {
    let line = line.trim();
    if line.is_empty() || line == "q" {
        return InteractiveCommand::Quit;
    }

    let mut tokens = line.split(',');
    let file = tokens.next().unwrap_or_default().trim();
    let hint = match tokens.next().map(|h| h.trim().parse::<u64>()) {
        None => None,
        Some(Ok(0)) => None,
        Some(Ok(h)) => Some(h),
        Some(Err(_)) => return InteractiveCommand::BadHint,
    };

    let path = match base_dir {
        Some(base) => base.join(file),
        None => PathBuf::from(file),
    };

    InteractiveCommand::Analyze { path, hint }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LoopConfig;
    use crate::io::sample_buffer::{PcmChannels, SampleBuffer};
    use std::collections::HashMap;

    fn detector() -> LoopDetector {
        LoopDetector::new(LoopConfig::default().with_max_workers(2)).unwrap()
    }

    fn silent_track(len: usize, tags: &[(&str, &str)]) -> DecodedTrack {
        DecodedTrack {
            channels: PcmChannels::F32(vec![SampleBuffer::silent(len)]),
            sample_rate: 256,
            tags: tags
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<HashMap<_, _>>(),
        }
    }

    #[test]
    fn test_zero_tag_skips() {
        let track = silent_track(10, &[("LOOPLENGTH", "0")]);
        let outcome = analyze_track("a.ogg", "a", &track, None, &detector()).unwrap();
        assert!(matches!(outcome, TrackOutcome::Skipped { file, .. } if file == "a.ogg"));
    }

    #[test]
    fn test_zero_tag_skips_even_with_hint() {
        let track = silent_track(10, &[("LOOPLENGTH", "0")]);
        let outcome = analyze_track("a.ogg", "a", &track, Some(5), &detector()).unwrap();
        assert!(matches!(outcome, TrackOutcome::Skipped { .. }));
    }

    #[test]
    fn test_too_short_track_is_an_error() {
        let track = silent_track(600, &[]);
        let r = analyze_track("a.ogg", "a", &track, None, &detector());
        assert!(matches!(r, Err(AnalysisError::TrackTooShort { length: 600, .. })));
    }

    #[test]
    fn test_tag_becomes_hint_and_previous_length() {
        // Silence matches everywhere; refinement may drift one block below the range
        let track = silent_track(256 * 10, &[("LOOPLENGTH", "1280")]);
        let outcome = analyze_track("a.ogg", "a", &track, None, &detector()).unwrap();
        let TrackOutcome::Analyzed(report) = outcome else {
            panic!("expected a report");
        };
        assert_eq!(report.previous_loop_length, Some(1280));
        assert_eq!(report.name, "a");
        assert!((512..1536).contains(&report.loop_point.loop_length));
    }

    #[test]
    fn test_unparsable_tag_is_ignored() {
        let track = silent_track(256 * 10, &[("LOOPLENGTH", "soon")]);
        let outcome = analyze_track("a.ogg", "a", &track, None, &detector()).unwrap();
        let TrackOutcome::Analyzed(report) = outcome else {
            panic!("expected a report");
        };
        assert_eq!(report.previous_loop_length, None);
    }

    #[test]
    fn test_missing_file() {
        let r = analyze_file(Path::new("/no/such/dir/theme.ogg"), None, &detector());
        assert!(matches!(r, Err(AnalysisError::FileNotFound(_))));
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("theme.mp3");
        std::fs::write(&path, b"not audio").unwrap();

        let r = analyze_file(&path, None, &detector());
        assert!(matches!(
            r,
            Err(AnalysisError::UnsupportedFormat { extension, .. }) if extension == ".mp3"
        ));
    }

    #[test]
    fn test_zero_loop_in_file_name_skips_before_decoding() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ambience__l0.ogg");
        std::fs::write(&path, b"not audio").unwrap();

        let outcome = analyze_file(&path, None, &detector()).unwrap();
        assert!(matches!(outcome, TrackOutcome::Skipped { .. }));
    }

    #[test]
    fn test_caller_hint_overrides_zero_loop_in_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ambience__l0.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 256,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for _ in 0..256 * 10 {
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();

        let outcome = analyze_file(&path, Some(1280), &detector()).unwrap();
        let TrackOutcome::Analyzed(report) = outcome else {
            panic!("expected a report");
        };
        assert_eq!(report.name, "ambience");
        assert!((512..1536).contains(&report.loop_point.loop_length));
    }

    #[test]
    fn test_interactive_lines() {
        assert_eq!(parse_interactive_line("", None), InteractiveCommand::Quit);
        assert_eq!(parse_interactive_line("q\n", None), InteractiveCommand::Quit);
        assert_eq!(
            parse_interactive_line("theme.ogg", None),
            InteractiveCommand::Analyze {
                path: PathBuf::from("theme.ogg"),
                hint: None
            }
        );
        assert_eq!(
            parse_interactive_line("theme.ogg,441000", Some(Path::new("/music"))),
            InteractiveCommand::Analyze {
                path: PathBuf::from("/music/theme.ogg"),
                hint: Some(441000)
            }
        );
        assert_eq!(
            parse_interactive_line("theme.ogg,0", None),
            InteractiveCommand::Analyze {
                path: PathBuf::from("theme.ogg"),
                hint: None
            }
        );
        assert_eq!(
            parse_interactive_line("theme.ogg,soon", None),
            InteractiveCommand::BadHint
        );
    }
}
