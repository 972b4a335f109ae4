//! Branch-and-bound window comparison

use super::accumulator::Accumulator;
use crate::io::sample_buffer::{Sample, SampleWindow};

/// Whether a comparison ran to completion or was cut off by the bound
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// Every sample was accumulated and the score stayed below the bound
    Completed,
    /// The running score reached the bound and the comparison stopped early
    Exceeded,
}

impl Comparison {
    /// Whether the candidate was pruned
    pub fn is_exceeded(self) -> bool {
        self == Comparison::Exceeded
    }
}

/// Accumulate squared differences of two equal-length windows into `out`
///
/// Stops as soon as `out` is no longer below `bound`.
pub fn compare_windows<T: Sample>(
    a: &SampleWindow<'_, T>,
    b: &SampleWindow<'_, T>,
    bound: Option<&Accumulator>,
    out: &mut Accumulator,
) -> Comparison {
    debug_assert_eq!(a.len(), b.len(), "compared windows must have equal length");

    for i in 0..a.len() {
        out.add(a.diff(i, b, i));

        if let Some(bound) = bound {
            if *out >= *bound {
                return Comparison::Exceeded;
            }
        }
    }

    Comparison::Completed
}

/// Compare channel pairs in order, sharing one running score and bound
pub fn compare_channels<T: Sample>(
    a: &[SampleWindow<'_, T>],
    b: &[SampleWindow<'_, T>],
    bound: Option<&Accumulator>,
    out: &mut Accumulator,
) -> Comparison {
    debug_assert_eq!(a.len(), b.len(), "channel lists must have equal length");

    for (wa, wb) in a.iter().zip(b) {
        if compare_windows(wa, wb, bound, out).is_exceeded() {
            return Comparison::Exceeded;
        }
    }

    Comparison::Completed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::sample_buffer::SampleBuffer;

    fn bound(v: u64) -> Accumulator {
        let mut acc = Accumulator::with_capacity(1);
        acc.add(v);
        acc
    }

    #[test]
    fn test_identical_windows_score_zero() {
        let a = SampleBuffer::from_reversed(vec![1u16, 2, 3, 4]);
        let mut out = Accumulator::with_capacity(2);
        let r = compare_windows(&a.window(), &a.window(), None, &mut out);
        assert_eq!(r, Comparison::Completed);
        assert!(out.is_zero());
    }

    #[test]
    fn test_unbounded_score_is_sum_of_squares() {
        let a = SampleBuffer::from_reversed(vec![10u16, 20, 30]);
        let b = SampleBuffer::from_reversed(vec![13u16, 16, 30]);
        let mut out = Accumulator::with_capacity(2);
        compare_windows(&a.window(), &b.window(), None, &mut out);
        assert_eq!(out.to_u128(), Some(9 + 16));
    }

    #[test]
    fn test_bound_stops_early() {
        let a = SampleBuffer::from_reversed(vec![0u16, 0, 0, 0]);
        let b = SampleBuffer::from_reversed(vec![10u16, 10, 10, 10]);
        let mut out = Accumulator::with_capacity(2);
        let r = compare_windows(&a.window(), &b.window(), Some(&bound(150)), &mut out);
        assert_eq!(r, Comparison::Exceeded);
        // Stopped after the second sample reached 200
        assert_eq!(out.to_u128(), Some(200));
    }

    #[test]
    fn test_reaching_bound_exactly_is_exceeded() {
        let a = SampleBuffer::from_reversed(vec![0u16, 0]);
        let b = SampleBuffer::from_reversed(vec![10u16, 0]);
        let mut out = Accumulator::with_capacity(2);
        let r = compare_windows(&a.window(), &b.window(), Some(&bound(100)), &mut out);
        assert!(r.is_exceeded());
    }

    #[test]
    fn test_pruning_agrees_with_full_scan() {
        let a = SampleBuffer::from_reversed(vec![0.1f32, -0.4, 0.3, 0.9, -0.2]);
        let b = SampleBuffer::from_reversed(vec![0.0f32, -0.5, 0.35, 0.7, -0.1]);

        let mut full = Accumulator::with_capacity(2);
        compare_windows(&a.window(), &b.window(), None, &mut full);

        // A bound just above the full score accepts with the same score
        let mut above = full.clone();
        above.add(1);
        let mut pruned = Accumulator::with_capacity(2);
        let r = compare_windows(&a.window(), &b.window(), Some(&above), &mut pruned);
        assert_eq!(r, Comparison::Completed);
        assert_eq!(pruned, full);

        // A bound equal to the full score rejects
        let mut pruned = Accumulator::with_capacity(2);
        let r = compare_windows(&a.window(), &b.window(), Some(&full), &mut pruned);
        assert_eq!(r, Comparison::Exceeded);
    }

    #[test]
    fn test_channels_share_running_score() {
        let a0 = SampleBuffer::from_reversed(vec![0u16, 0]);
        let b0 = SampleBuffer::from_reversed(vec![3u16, 0]);
        let a1 = SampleBuffer::from_reversed(vec![0u16, 0]);
        let b1 = SampleBuffer::from_reversed(vec![0u16, 4]);
        let a = [a0.window(), a1.window()];
        let b = [b0.window(), b1.window()];

        let mut out = Accumulator::with_capacity(2);
        let r = compare_channels(&a, &b, None, &mut out);
        assert_eq!(r, Comparison::Completed);
        assert_eq!(out.to_u128(), Some(25));

        let mut out = Accumulator::with_capacity(2);
        let r = compare_channels(&a, &b, Some(&bound(20)), &mut out);
        assert_eq!(r, Comparison::Exceeded);
    }
}
