//! Min/max envelope reduction
//!
//! Collapses every `block_length` input samples into one output slot holding
//! the block's minimum (from the min channel) and maximum (from the max
//! channel). Repeating this builds coarser pyramid levels on which the
//! alignment search runs with far fewer comparisons.

use rayon::prelude::*;

use crate::error::{AnalysisError, AnalysisResult};
use crate::io::sample_buffer::{Sample, SampleWindow, SampleWindowMut};

/// Number of output slots needed for `len` input samples
pub fn reduced_len(len: usize, block_length: usize) -> usize {
    len.div_ceil(block_length)
}

/// Reduce one run of blocks
///
/// `min_out` and `max_out` must hold `reduced_len(min_in.len(), block_length)` slots.
/// A trailing partial block is reduced over the samples it has.
pub fn requantize<T: Sample>(
    min_in: SampleWindow<'_, T>,
    max_in: SampleWindow<'_, T>,
    min_out: &mut SampleWindowMut<'_, T>,
    max_out: &mut SampleWindowMut<'_, T>,
    block_length: usize,
) {
    debug_assert_eq!(min_in.len(), max_in.len());
    debug_assert_eq!(min_out.len(), reduced_len(min_in.len(), block_length));

    let end = min_in.len();
    let mut i = 0;
    let mut b = 0;

    while i < end {
        min_out.set_max_sample(b);
        max_out.set_min_sample(b);

        let block_end = (i + block_length).min(end);
        while i < block_end {
            if min_in.less_than(i, &min_out.as_window(), b) {
                min_out.set(b, min_in.get(i));
            }

            if max_in.greater_than(i, &max_out.as_window(), b) {
                max_out.set(b, max_in.get(i));
            }

            i += 1;
        }

        b += 1;
    }
}

/// Reduce a whole channel pair on the thread pool
///
/// The output is split into disjoint runs of blocks covering about
/// `samples_per_task` input samples each; every task writes only its own run.
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` if the inputs differ in length, the
/// outputs have the wrong length, or `block_length` is zero.
pub fn requantize_parallel<T: Sample>(
    min_in: SampleWindow<'_, T>,
    max_in: SampleWindow<'_, T>,
    min_out: &mut [T],
    max_out: &mut [T],
    block_length: usize,
    samples_per_task: usize,
    pool: &rayon::ThreadPool,
) -> AnalysisResult<()> {
    if block_length == 0 {
        return Err(AnalysisError::InvalidInput(
            "Invalid block length: 0".to_string(),
        ));
    }

    if min_in.len() != max_in.len() {
        return Err(AnalysisError::InvalidInput(format!(
            "Envelope channels differ in length: {} vs {}",
            min_in.len(),
            max_in.len()
        )));
    }

    let expected = reduced_len(min_in.len(), block_length);
    if min_out.len() != expected || max_out.len() != expected {
        return Err(AnalysisError::InvalidInput(format!(
            "Reduced buffers must hold {} samples, got {} and {}",
            expected,
            min_out.len(),
            max_out.len()
        )));
    }

    let blocks_per_task = samples_per_task.div_ceil(block_length).max(1);
    let samples_per_chunk = blocks_per_task * block_length;

    pool.install(|| {
        min_out
            .par_chunks_mut(blocks_per_task)
            .zip(max_out.par_chunks_mut(blocks_per_task))
            .enumerate()
            .for_each(|(task, (min_chunk, max_chunk))| {
                let from = task * samples_per_chunk;
                let to = (from + min_chunk.len() * block_length).min(min_in.len());
                requantize(
                    min_in.sub(from, to),
                    max_in.sub(from, to),
                    &mut SampleWindowMut::new(min_chunk),
                    &mut SampleWindowMut::new(max_chunk),
                    block_length,
                );
            });
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::sample_buffer::SampleBuffer;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn test_pool() -> rayon::ThreadPool {
        rayon::ThreadPoolBuilder::new()
            .num_threads(3)
            .build()
            .expect("Failed to build rayon thread pool")
    }

    #[test]
    fn test_reduced_len_rounds_up() {
        assert_eq!(reduced_len(32, 16), 2);
        assert_eq!(reduced_len(33, 16), 3);
        assert_eq!(reduced_len(0, 16), 0);
    }

    #[test]
    fn test_single_block_min_max() {
        let input = SampleBuffer::from_reversed(vec![0.2f32, -0.7, 0.9, 0.1]);
        let mut min_out = SampleBuffer::<f32>::silent(1);
        let mut max_out = SampleBuffer::<f32>::silent(1);
        requantize(
            input.window(),
            input.window(),
            &mut min_out.window_mut(),
            &mut max_out.window_mut(),
            4,
        );
        assert_eq!(min_out.window().get(0), -0.7);
        assert_eq!(max_out.window().get(0), 0.9);
    }

    #[test]
    fn test_partial_last_block() {
        let input = SampleBuffer::from_reversed(vec![5u16, 1, 9, 3, 7]);
        let mut min_out = SampleBuffer::<u16>::silent(3);
        let mut max_out = SampleBuffer::<u16>::silent(3);
        requantize(
            input.window(),
            input.window(),
            &mut min_out.window_mut(),
            &mut max_out.window_mut(),
            2,
        );
        assert_eq!(min_out.window().as_slice(), &[1, 3, 7]);
        assert_eq!(max_out.window().as_slice(), &[5, 9, 7]);
    }

    #[test]
    fn test_separate_min_and_max_sources() {
        let mins = SampleBuffer::from_reversed(vec![0.0f32, -0.5, 0.3, 0.2]);
        let maxs = SampleBuffer::from_reversed(vec![0.1f32, 0.4, 0.8, 0.3]);
        let mut min_out = SampleBuffer::<f32>::silent(2);
        let mut max_out = SampleBuffer::<f32>::silent(2);
        requantize(
            mins.window(),
            maxs.window(),
            &mut min_out.window_mut(),
            &mut max_out.window_mut(),
            2,
        );
        assert_eq!(min_out.window().as_slice(), &[-0.5, 0.2]);
        assert_eq!(max_out.window().as_slice(), &[0.4, 0.8]);
    }

    #[test]
    fn test_parallel_envelope_bounds_every_sample() {
        let mut rng = StdRng::seed_from_u64(21);
        let data: Vec<f32> = (0..10_007).map(|_| rng.gen_range(-1.0..1.0)).collect();
        let input = SampleBuffer::from_reversed(data);
        let block = 16;
        let len = reduced_len(input.len(), block);
        let mut min_out = SampleBuffer::<f32>::silent(len);
        let mut max_out = SampleBuffer::<f32>::silent(len);

        requantize_parallel(
            input.window(),
            input.window(),
            min_out.as_mut_slice(),
            max_out.as_mut_slice(),
            block,
            100,
            &test_pool(),
        )
        .unwrap();

        let samples = input.window();
        for (b, chunk) in samples.as_slice().chunks(block).enumerate() {
            let lo = min_out.window().get(b);
            let hi = max_out.window().get(b);
            assert!(chunk.iter().all(|&s| s >= lo && s <= hi), "block {}", b);
            assert!(chunk.contains(&lo) && chunk.contains(&hi), "block {}", b);
        }
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let mut rng = StdRng::seed_from_u64(5);
        let data: Vec<u16> = (0..5000).map(|_| rng.gen()).collect();
        let input = SampleBuffer::from_reversed(data);
        let len = reduced_len(input.len(), 16);

        let mut seq_min = SampleBuffer::<u16>::silent(len);
        let mut seq_max = SampleBuffer::<u16>::silent(len);
        requantize(
            input.window(),
            input.window(),
            &mut seq_min.window_mut(),
            &mut seq_max.window_mut(),
            16,
        );

        let mut par_min = SampleBuffer::<u16>::silent(len);
        let mut par_max = SampleBuffer::<u16>::silent(len);
        requantize_parallel(
            input.window(),
            input.window(),
            par_min.as_mut_slice(),
            par_max.as_mut_slice(),
            16,
            2048,
            &test_pool(),
        )
        .unwrap();

        assert_eq!(seq_min, par_min);
        assert_eq!(seq_max, par_max);
    }

    #[test]
    fn test_parallel_rejects_wrong_output_length() {
        let input = SampleBuffer::<f32>::silent(100);
        let mut min_out = vec![0.0f32; 3];
        let mut max_out = vec![0.0f32; 7];
        let r = requantize_parallel(
            input.window(),
            input.window(),
            &mut min_out,
            &mut max_out,
            16,
            2048,
            &test_pool(),
        );
        assert!(r.is_err());
    }
}
