//! Parallel nearest-window search
//!
//! The offset range is processed in waves. Each wave hands up to
//! `max_workers` disjoint sub-ranges to the thread pool; every worker owns a
//! pooled accumulator and a pooled top-K queue, so nothing is shared while
//! comparing. Workers prune with their own queue's worst score, which only
//! tightens over time.
//!
//! Between waves the coordinator merges the worker queues into the global
//! queue and, once the global queue is full, seeds every worker queue with the
//! global worst score so the next wave starts with the shared bound.

use rayon::prelude::*;

use super::accumulator::Accumulator;
use super::compare::compare_channels;
use super::pool::ScratchPool;
use super::queue::AlignQueue;
use crate::error::{AnalysisError, AnalysisResult};
use crate::io::sample_buffer::{Sample, SampleWindow};

/// Parameters of one alignment search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlignSearch {
    /// Samples per compared window
    pub window_length: usize,
    /// First candidate offset (inclusive)
    pub start: usize,
    /// Last candidate offset (exclusive)
    pub end: usize,
    /// Offset of the reference window in the second channel list
    pub reference_offset: usize,
    /// Number of best alignments to keep
    pub num_aligns: usize,
    /// Worker tasks per wave
    pub max_workers: usize,
    /// Offsets handed to one worker per wave
    pub offsets_per_worker: usize,
    /// Initial digit capacity of the pooled accumulators
    pub accumulator_digits: usize,
}

impl AlignSearch {
    /// Search `[start, end)` against the reference window at `reference_offset`
    pub fn new(window_length: usize, start: usize, end: usize, reference_offset: usize) -> Self {
        Self {
            window_length,
            start,
            end,
            reference_offset,
            num_aligns: 1,
            max_workers: 8,
            offsets_per_worker: 2048,
            accumulator_digits: 2,
        }
    }

    /// Keep the `num_aligns` best alignments
    pub fn with_num_aligns(mut self, num_aligns: usize) -> Self {
        self.num_aligns = num_aligns;
        self
    }

    /// Set the wave shape
    pub fn with_workers(mut self, max_workers: usize, offsets_per_worker: usize) -> Self {
        self.max_workers = max_workers;
        self.offsets_per_worker = offsets_per_worker;
        self
    }

    /// Set the initial accumulator capacity
    pub fn with_accumulator_digits(mut self, digits: usize) -> Self {
        self.accumulator_digits = digits;
        self
    }
}

/// One worker's share of a wave
struct WorkerJob {
    start: usize,
    end: usize,
    counter: Accumulator,
    best: AlignQueue,
}

impl WorkerJob {
    fn run<T: Sample>(
        &mut self,
        channels: &[SampleWindow<'_, T>],
        reference: &[SampleWindow<'_, T>],
        window_length: usize,
    ) {
        let mut sliced = Vec::with_capacity(channels.len());

        for offset in self.start..self.end {
            self.counter.reset();

            sliced.clear();
            sliced.extend(channels.iter().map(|c| c.sub(offset, offset + window_length)));

            let outcome = compare_channels(
                &sliced,
                reference,
                self.best.worst_score(),
                &mut self.counter,
            );

            if !outcome.is_exceeded() {
                self.best.put(offset, &self.counter);
            }
        }
    }
}

/// Find the offsets in `channels_a` whose windows are closest to the reference
/// window in `channels_b`
///
/// Channels are compared pairwise in the order given. Candidate offsets whose
/// window would run past the end of `channels_a` are dropped from the range.
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` if the channel lists differ in
/// length, a parameter is zero, or the reference window does not fit.
pub fn find_best_aligns<T: Sample>(
    channels_a: &[SampleWindow<'_, T>],
    channels_b: &[SampleWindow<'_, T>],
    search: &AlignSearch,
    pool: &rayon::ThreadPool,
) -> AnalysisResult<AlignQueue> {
    let w = search.window_length;

    if channels_a.is_empty() || channels_a.len() != channels_b.len() {
        return Err(AnalysisError::InvalidInput(format!(
            "Mismatched channel lists: {} vs {}",
            channels_a.len(),
            channels_b.len()
        )));
    }

    if w == 0 || search.num_aligns == 0 || search.max_workers == 0 || search.offsets_per_worker == 0
    {
        return Err(AnalysisError::InvalidInput(format!(
            "Invalid search parameters: {:?}",
            search
        )));
    }

    let reference_end = search.reference_offset.saturating_add(w);
    if let Some(short) = channels_b.iter().find(|c| c.len() < reference_end) {
        return Err(AnalysisError::InvalidInput(format!(
            "Reference window [{}, {}) exceeds channel length {}",
            search.reference_offset,
            reference_end,
            short.len()
        )));
    }

    let last_start = channels_a
        .iter()
        .map(|c| (c.len() + 1).saturating_sub(w))
        .min()
        .unwrap_or(0);
    let start = search.start;
    let end = search.end.min(last_start);

    log::debug!(
        "Searching alignments: offsets [{}, {}), window={}, reference={}, k={}, workers={}x{}",
        start,
        end,
        w,
        search.reference_offset,
        search.num_aligns,
        search.max_workers,
        search.offsets_per_worker
    );

    let mut out = AlignQueue::new(search.num_aligns);
    if start >= end {
        return Ok(out);
    }

    let digits = search.accumulator_digits;
    let k = search.num_aligns;
    let counters = ScratchPool::new(move || Accumulator::with_capacity(digits));
    let queues = ScratchPool::new(move || AlignQueue::new(k));

    let reference: Vec<SampleWindow<'_, T>> = channels_b
        .iter()
        .map(|c| c.sub(search.reference_offset, reference_end))
        .collect();

    let mut jobs: Vec<WorkerJob> = Vec::with_capacity(search.max_workers);
    let mut next = start;
    let mut waves = 0usize;

    while next < end {
        while jobs.len() < search.max_workers && next < end {
            let job_end = next.saturating_add(search.offsets_per_worker).min(end);
            jobs.push(WorkerJob {
                start: next,
                end: job_end,
                counter: counters.checkout(),
                best: queues.checkout(),
            });
            next = job_end;
        }

        pool.install(|| {
            jobs.par_iter_mut()
                .for_each(|job| job.run(channels_a, &reference, w));
        });

        // Worker queues are sorted, so the first rejection ends that queue.
        for job in &jobs {
            for align in job.best.aligns() {
                if !out.put(align.offset, &align.score) {
                    break;
                }
            }
        }

        for mut job in jobs.drain(..) {
            match out.worst_score() {
                Some(bound) => job.best.fill(0, bound),
                None => job.best.clear(),
            }
            queues.give_back(job.best);

            job.counter.reset();
            counters.give_back(job.counter);
        }

        waves += 1;
    }

    log::debug!(
        "Alignment search finished after {} waves, best offset {:?}",
        waves,
        out.best().map(|a| a.offset)
    );

    Ok(out)
}
