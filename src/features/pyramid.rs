//! Resolution pyramid
//!
//! Level 0 pairs every raw channel with itself as a (min, max) envelope.
//! Each further level reduces the previous one by `block_length` with
//! [`requantize_parallel`]. Levels are fully materialized before any search
//! reads them.

use super::requantize::{reduced_len, requantize_parallel};
use crate::error::AnalysisResult;
use crate::io::sample_buffer::{Sample, SampleBuffer, SampleWindow};

/// One reduced level: a (min, max) buffer pair per channel
#[derive(Debug, Clone)]
pub struct PyramidLevel<T: Sample> {
    envelopes: Vec<(SampleBuffer<T>, SampleBuffer<T>)>,
}

impl<T: Sample> PyramidLevel<T> {
    /// Envelope windows flattened as `[min0, max0, min1, max1, ...]`
    pub fn windows(&self) -> Vec<SampleWindow<'_, T>> {
        self.envelopes
            .iter()
            .flat_map(|(min, max)| [min.window(), max.window()])
            .collect()
    }

    /// Samples per envelope channel
    pub fn len(&self) -> usize {
        self.envelopes.first().map_or(0, |(min, _)| min.len())
    }

    /// Whether the level holds no samples
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Reduce a flattened `[min, max, ...]` window list by one level
pub fn reduce_level<T: Sample>(
    windows: &[SampleWindow<'_, T>],
    block_length: usize,
    samples_per_task: usize,
    pool: &rayon::ThreadPool,
) -> AnalysisResult<PyramidLevel<T>> {
    let mut envelopes = Vec::with_capacity(windows.len() / 2);

    for pair in windows.chunks_exact(2) {
        let (min_in, max_in) = (pair[0], pair[1]);
        let len = reduced_len(min_in.len(), block_length);
        let mut min_out = SampleBuffer::silent(len);
        let mut max_out = SampleBuffer::silent(len);

        requantize_parallel(
            min_in,
            max_in,
            min_out.as_mut_slice(),
            max_out.as_mut_slice(),
            block_length,
            samples_per_task,
            pool,
        )?;

        envelopes.push((min_out, max_out));
    }

    Ok(PyramidLevel { envelopes })
}

/// Raw channels plus their reduced levels
#[derive(Debug)]
pub struct Pyramid<'a, T: Sample> {
    base: Vec<SampleWindow<'a, T>>,
    levels: Vec<PyramidLevel<T>>,
    block_length: usize,
}

impl<'a, T: Sample> Pyramid<'a, T> {
    /// Build `depth` reduced levels above the raw channels
    pub fn build(
        channels: &'a [SampleBuffer<T>],
        depth: usize,
        block_length: usize,
        samples_per_task: usize,
        pool: &rayon::ThreadPool,
    ) -> AnalysisResult<Self> {
        let base: Vec<SampleWindow<'a, T>> = channels
            .iter()
            .flat_map(|c| [c.window(), c.window()])
            .collect();

        let mut levels: Vec<PyramidLevel<T>> = Vec::with_capacity(depth);
        for depth_index in 0..depth {
            let level = match levels.last() {
                Some(previous) => {
                    reduce_level(&previous.windows(), block_length, samples_per_task, pool)?
                }
                None => reduce_level(&base, block_length, samples_per_task, pool)?,
            };
            log::debug!(
                "Built pyramid level {}: {} samples per channel",
                depth_index + 1,
                level.len()
            );
            levels.push(level);
        }

        Ok(Self {
            base,
            levels,
            block_length,
        })
    }

    /// Number of levels, including the raw level 0
    pub fn depth(&self) -> usize {
        self.levels.len() + 1
    }

    /// Reduction factor between neighbouring levels
    pub fn block_length(&self) -> usize {
        self.block_length
    }

    /// Flattened `[min, max, ...]` windows of `level`
    ///
    /// # Panics
    ///
    /// Panics if `level >= self.depth()`.
    pub fn level(&self, level: usize) -> Vec<SampleWindow<'_, T>> {
        match level {
            0 => self.base.clone(),
            n => self.levels[n - 1].windows(),
        }
    }

    /// Samples per channel at `level`
    pub fn level_len(&self, level: usize) -> usize {
        match level {
            0 => self.base.first().map_or(0, SampleWindow::len),
            n => self.levels[n - 1].len(),
        }
    }
}
