//! Loop detection
//!
//! Coarse-to-fine search for the loop length followed by a scan for the
//! loop start:
//!
//! 1. Build the envelope pyramid (raw, /16, /256)
//! 2. Keep the best few offsets at the coarsest level
//! 3. Refine each one level at a time within one block either side
//! 4. Pick the start inside the first second of buffer space that joins the
//!    loop most smoothly while preferring audible content over silence
//!
//! All buffers are reverse-ordered, so an offset `o` compares the last second
//! of the track with the second that ends `o` samples before it.

use std::ops::Range;

use super::result::LoopPoint;
use crate::config::LoopConfig;
use crate::error::{AnalysisError, AnalysisResult};
use crate::features::Pyramid;
use crate::io::decoder::DecodedTrack;
use crate::io::sample_buffer::{PcmChannels, Sample, SampleBuffer, SampleWindow};
use crate::search::{find_best_aligns, Align, AlignQueue, AlignSearch};

const COARSE_LEVEL: usize = 2;

/// Loop detector owning the configuration and worker pool
///
/// One detector can analyze any number of tracks; the pool is reused.
#[derive(Debug)]
pub struct LoopDetector {
    config: LoopConfig,
    pool: rayon::ThreadPool,
}

impl LoopDetector {
    /// Create a detector with a pool of `config.max_workers` threads
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidInput` for an unusable configuration and
    /// `AnalysisError::ProcessingError` if the thread pool cannot be built.
    pub fn new(config: LoopConfig) -> AnalysisResult<Self> {
        config.validate()?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.max_workers)
            .thread_name(|i| format!("loop-search-{}", i))
            .build()
            .map_err(|e| {
                AnalysisError::ProcessingError(format!("Failed to build thread pool: {}", e))
            })?;

        Ok(Self { config, pool })
    }

    /// Active configuration
    pub fn config(&self) -> &LoopConfig {
        &self.config
    }

    /// Find the loop point of a decoded track
    pub fn find_loop(&self, track: &DecodedTrack, hint: Option<u64>) -> AnalysisResult<LoopPoint> {
        self.find_loop_in_channels(&track.channels, track.sample_rate, hint)
    }

    /// Find the loop point of either sample representation
    pub fn find_loop_in_channels(
        &self,
        channels: &PcmChannels,
        sample_rate: u32,
        hint: Option<u64>,
    ) -> AnalysisResult<LoopPoint> {
        match channels {
            PcmChannels::U16(c) => self.find_loop_in(c, sample_rate, hint),
            PcmChannels::F32(c) => self.find_loop_in(c, sample_rate, hint),
        }
    }

    /// Find the loop point of reverse-ordered channels
    ///
    /// `hint` is an approximate loop length in samples; without one the loop
    /// length is searched in the last quarter of the track.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if there are no channels, their lengths differ, or the
    ///   sample rate is below the coarse reduction factor
    /// - `TrackTooShort` if the search range is empty
    /// - `ProcessingError` if no candidate survives refinement
    pub fn find_loop_in<T: Sample>(
        &self,
        channels: &[SampleBuffer<T>],
        sample_rate: u32,
        hint: Option<u64>,
    ) -> AnalysisResult<LoopPoint> {
        use std::time::Instant;
        let started = Instant::now();

        let len = validate_channels(channels)?;
        let window = sample_rate as usize;
        let block = self.config.block_length;
        let factor = self.config.coarse_factor();

        if window < factor {
            return Err(AnalysisError::InvalidInput(format!(
                "Sample rate {} Hz is below the coarse reduction factor {}",
                sample_rate, factor
            )));
        }

        let range = search_range(len, window, hint);
        log::debug!(
            "Loop search: {} channels x {} samples at {} Hz, hint={:?}, range={:?}",
            channels.len(),
            len,
            sample_rate,
            hint,
            range
        );

        if range.is_empty() {
            return Err(AnalysisError::TrackTooShort {
                length: len,
                minimum: minimum_length(window, hint.is_some()),
            });
        }

        let pyramid = Pyramid::build(
            channels,
            COARSE_LEVEL,
            block,
            self.config.offsets_per_worker,
            &self.pool,
        )?;

        let coarse_level = pyramid.level(COARSE_LEVEL);
        let coarse_search = AlignSearch::new(
            window / factor,
            range.start / factor,
            range.end.div_ceil(factor),
            0,
        )
        .with_num_aligns(self.config.coarse_candidates);
        let coarse = find_best_aligns(
            &coarse_level,
            &coarse_level,
            &self.search(coarse_search),
            &self.pool,
        )?;

        log::debug!(
            "Coarse candidates: {:?}",
            coarse.aligns().iter().map(|a| a.offset * factor).collect::<Vec<_>>()
        );

        let mut best = AlignQueue::new(1);
        for candidate in coarse.aligns() {
            let mut refined = Some(candidate.clone());
            for level in (0..COARSE_LEVEL).rev() {
                let Some(offset) = refined.as_ref().map(|a| a.offset) else {
                    break;
                };
                refined = self.refine(&pyramid, level, offset, window)?;
            }

            match refined {
                Some(align) => {
                    log::debug!(
                        "Candidate {} refined to {}",
                        candidate.offset * factor,
                        align.offset
                    );
                    best.put(align.offset, &align.score);
                }
                None => log::debug!(
                    "Candidate {} did not survive refinement",
                    candidate.offset * factor
                ),
            }
        }

        let loop_length = best
            .best()
            .map(|a| a.offset)
            .ok_or_else(|| {
                AnalysisError::ProcessingError(
                    "No loop candidate survived refinement".to_string(),
                )
            })?;

        let windows: Vec<SampleWindow<'_, T>> = channels.iter().map(SampleBuffer::window).collect();
        let buffer_start = pick_loop_start(&windows, loop_length, window);
        let loop_point = LoopPoint {
            loop_start: (len - buffer_start) as u64,
            loop_length: loop_length as u64,
        };

        log::debug!(
            "Loop found: start={}, length={} ({:.1} ms)",
            loop_point.loop_start,
            loop_point.loop_length,
            started.elapsed().as_secs_f32() * 1000.0
        );

        Ok(loop_point)
    }

    /// Search one block either side of the next-coarser result at `level`
    fn refine<T: Sample>(
        &self,
        pyramid: &Pyramid<'_, T>,
        level: usize,
        coarse_offset: usize,
        window: usize,
    ) -> AnalysisResult<Option<Align>> {
        let block = pyramid.block_length();
        let level_window = window / block.pow(level as u32);
        let start = coarse_offset.saturating_sub(1) * block;
        let end = ((coarse_offset + 1) * block).min(pyramid.level_len(level));

        let windows = pyramid.level(level);
        let search = AlignSearch::new(level_window, start, end, 0);
        let found = find_best_aligns(&windows, &windows, &self.search(search), &self.pool)?;
        Ok(found.best().cloned())
    }

    fn search(&self, search: AlignSearch) -> AlignSearch {
        search
            .with_workers(self.config.max_workers, self.config.offsets_per_worker)
            .with_accumulator_digits(self.config.accumulator_digits)
    }
}

fn validate_channels<T: Sample>(channels: &[SampleBuffer<T>]) -> AnalysisResult<usize> {
    let Some(first) = channels.first() else {
        return Err(AnalysisError::InvalidInput("No channels to analyze".to_string()));
    };

    let len = first.len();
    if channels.iter().any(|c| c.len() != len) {
        return Err(AnalysisError::InvalidInput(
            "Channels differ in length".to_string(),
        ));
    }

    Ok(len)
}

/// Loop length candidates to search, in samples
///
/// With a hint: one window either side of it, at least one window in and
/// ending one window before the track end. Without: the last quarter of the
/// track up to one window before the end.
pub fn search_range(len: usize, window: usize, hint: Option<u64>) -> Range<usize> {
    let last = len.saturating_sub(window);
    match hint {
        Some(hint) => {
            let hint = usize::try_from(hint).unwrap_or(usize::MAX);
            let start = window.max(hint.saturating_sub(window));
            let end = last.min(hint.saturating_add(window));
            start..end
        }
        None => (len - len / 4)..last,
    }
}

/// Shortest track for which [`search_range`] can be non-empty
pub fn minimum_length(window: usize, hinted: bool) -> usize {
    if hinted {
        2 * window + 1
    } else {
        4 * (window + 1)
    }
}

/// Buffer index at which the loop starts
///
/// Scans the first `window` buffer indices `i` and scores each by twice the
/// distance between `i` and `i + loop_length`, plus the distance of `i` from
/// silence, summed over channels. Returns `i + loop_length` for the lowest
/// score, earliest on ties.
pub fn pick_loop_start<T: Sample>(
    channels: &[SampleWindow<'_, T>],
    loop_length: usize,
    window: usize,
) -> usize {
    let len = channels.first().map_or(0, SampleWindow::len);
    let mut best_score = u128::MAX;
    let mut best_index = loop_length;

    for i in (0..window).take_while(|&i| i + loop_length < len) {
        let score: u128 = channels
            .iter()
            .map(|c| {
                let continuity = u128::from(c.diff(i, c, i + loop_length));
                let audible = u128::from(c.get(i).distance(T::NEUTRAL));
                2 * continuity + audible
            })
            .sum();

        if score < best_score {
            best_score = score;
            best_index = i + loop_length;
        }
    }

    best_index
}
