//! Sample windows and buffers
//!
//! All buffers in this crate store a channel in *reverse* temporal order:
//! index 0 holds the last sample of the track. Offsets computed by the search
//! engine are therefore distances from the end of playback and are converted
//! back to forward time only when a result is reported.

/// Scale applied to squared floating-point differences before truncation to `u64`.
///
/// `2^61` keeps the largest in-range difference (`(1.0 - -1.0)^2 = 4`) below `2^63`.
pub const F32_METRIC_SCALE: f64 = (1u64 << 61) as f64;

/// PCM sample representation usable by the search engine
pub trait Sample: Copy + PartialOrd + Send + Sync + std::fmt::Debug + 'static {
    /// Largest representable sample value
    const MAX: Self;

    /// Smallest representable sample value
    const MIN: Self;

    /// Value representing silence
    const NEUTRAL: Self;

    /// Squared difference between two samples, as a non-negative integer
    fn distance(self, other: Self) -> u64;
}

impl Sample for u16 {
    const MAX: Self = u16::MAX;
    const MIN: Self = 0;
    const NEUTRAL: Self = u16::MAX / 2 + 1;

    #[inline]
    fn distance(self, other: Self) -> u64 {
        let d = self as i64 - other as i64;
        (d * d) as u64
    }
}

impl Sample for f32 {
    const MAX: Self = f32::MAX;
    const MIN: Self = -f32::MAX;
    const NEUTRAL: Self = 0.0;

    #[inline]
    fn distance(self, other: Self) -> u64 {
        let d = self as f64 - other as f64;
        // `as` saturates, so sentinel values map to u64::MAX instead of wrapping.
        (d * d * F32_METRIC_SCALE) as u64
    }
}

/// Read-only view over one channel
#[derive(Debug, Clone, Copy)]
pub struct SampleWindow<'a, T: Sample> {
    data: &'a [T],
}

impl<'a, T: Sample> SampleWindow<'a, T> {
    /// Create a window over a slice
    pub fn new(data: &'a [T]) -> Self {
        Self { data }
    }

    /// Number of samples in the window
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the window holds no samples
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Sample at `index`
    #[inline]
    pub fn get(&self, index: usize) -> T {
        self.data[index]
    }

    /// Narrower view over `[from, to)` sharing the same storage
    #[inline]
    pub fn sub(&self, from: usize, to: usize) -> SampleWindow<'a, T> {
        SampleWindow {
            data: &self.data[from..to],
        }
    }

    /// `self[index] < other[other_index]`
    #[inline]
    pub fn less_than(&self, index: usize, other: &SampleWindow<'_, T>, other_index: usize) -> bool {
        self.data[index] < other.data[other_index]
    }

    /// `self[index] > other[other_index]`
    #[inline]
    pub fn greater_than(
        &self,
        index: usize,
        other: &SampleWindow<'_, T>,
        other_index: usize,
    ) -> bool {
        self.data[index] > other.data[other_index]
    }

    /// Squared difference between `self[index]` and `other[other_index]`
    #[inline]
    pub fn diff(&self, index: usize, other: &SampleWindow<'_, T>, other_index: usize) -> u64 {
        self.data[index].distance(other.data[other_index])
    }

    /// Underlying samples
    pub fn as_slice(&self) -> &'a [T] {
        self.data
    }
}

/// Mutable view over one channel, used when materializing pyramid levels
#[derive(Debug)]
pub struct SampleWindowMut<'a, T: Sample> {
    data: &'a mut [T],
}

impl<'a, T: Sample> SampleWindowMut<'a, T> {
    /// Create a mutable window over a slice
    pub fn new(data: &'a mut [T]) -> Self {
        Self { data }
    }

    /// Number of samples in the window
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the window holds no samples
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Sample at `index`
    #[inline]
    pub fn get(&self, index: usize) -> T {
        self.data[index]
    }

    /// Overwrite the sample at `index`
    #[inline]
    pub fn set(&mut self, index: usize, value: T) {
        self.data[index] = value;
    }

    /// Set the sample at `index` to the largest representable value
    #[inline]
    pub fn set_max_sample(&mut self, index: usize) {
        self.data[index] = T::MAX;
    }

    /// Set the sample at `index` to the smallest representable value
    #[inline]
    pub fn set_min_sample(&mut self, index: usize) {
        self.data[index] = T::MIN;
    }

    /// Set the sample at `index` to silence
    #[inline]
    pub fn set_neutral_sample(&mut self, index: usize) {
        self.data[index] = T::NEUTRAL;
    }

    /// Read-only view of the same samples
    pub fn as_window(&self) -> SampleWindow<'_, T> {
        SampleWindow::new(self.data)
    }
}

/// Owned channel storage
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer<T: Sample> {
    data: Vec<T>,
}

impl<T: Sample> SampleBuffer<T> {
    /// Buffer of `len` silent samples
    pub fn silent(len: usize) -> Self {
        Self {
            data: vec![T::NEUTRAL; len],
        }
    }

    /// Take ownership of samples that are already in reverse order
    pub fn from_reversed(data: Vec<T>) -> Self {
        Self { data }
    }

    /// Take samples in playback order and store them reversed
    pub fn from_playback_order(mut data: Vec<T>) -> Self {
        data.reverse();
        Self { data }
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the buffer holds no samples
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Read-only window over the whole buffer
    pub fn window(&self) -> SampleWindow<'_, T> {
        SampleWindow::new(&self.data)
    }

    /// Mutable window over the whole buffer
    pub fn window_mut(&mut self) -> SampleWindowMut<'_, T> {
        SampleWindowMut::new(&mut self.data)
    }

    /// Mutable access to the raw samples
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }
}

/// Decoded channels, one variant per supported sample representation
#[derive(Debug, Clone, PartialEq)]
pub enum PcmChannels {
    /// 16-bit unsigned fixed point, silence at 32768
    U16(Vec<SampleBuffer<u16>>),
    /// 32-bit float, silence at 0.0
    F32(Vec<SampleBuffer<f32>>),
}

impl PcmChannels {
    /// Number of channels
    pub fn channel_count(&self) -> usize {
        match self {
            PcmChannels::U16(c) => c.len(),
            PcmChannels::F32(c) => c.len(),
        }
    }

    /// Samples per channel (taken from the first channel)
    pub fn len(&self) -> usize {
        match self {
            PcmChannels::U16(c) => c.first().map_or(0, SampleBuffer::len),
            PcmChannels::F32(c) => c.first().map_or(0, SampleBuffer::len),
        }
    }

    /// Whether there are no samples at all
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_u16_distance_is_exact() {
        assert_eq!(0u16.distance(u16::MAX), 65535u64 * 65535);
        assert_eq!(u16::MAX.distance(0), 65535u64 * 65535);
        assert_eq!(100u16.distance(100), 0);
        assert_eq!(<u16 as Sample>::NEUTRAL, 32768);
    }

    #[test]
    fn test_f32_distance_scaling() {
        assert_eq!(0.5f32.distance(0.5), 0);
        assert_eq!(1.0f32.distance(0.0), 1u64 << 61);
        assert_eq!(1.0f32.distance(-1.0), 1u64 << 63);
        // Sentinels saturate rather than wrap
        assert_eq!(f32::MAX.distance(-f32::MAX), u64::MAX);
    }

    #[test]
    fn test_f32_distance_is_monotonic() {
        let base = 0.1f32;
        let mut last = 0;
        for step in 1..50 {
            let d = base.distance(base + step as f32 * 0.02);
            assert!(d > last, "distance should grow with the difference");
            last = d;
        }
    }

    #[test]
    fn test_sub_window_aliases_parent() {
        let buffer = SampleBuffer::from_reversed(vec![1.0f32, 2.0, 3.0, 4.0, 5.0]);
        let window = buffer.window();
        let sub = window.sub(1, 4);
        assert_eq!(sub.len(), 3);
        assert_eq!(sub.get(0), 2.0);
        assert_eq!(sub.get(2), 4.0);
        assert!(std::ptr::eq(&sub.as_slice()[0], &window.as_slice()[1]));

        let nested = sub.sub(1, 2);
        assert_eq!(nested.len(), 1);
        assert_eq!(nested.get(0), 3.0);
    }

    #[test]
    fn test_comparisons_between_windows() {
        let a = SampleBuffer::from_reversed(vec![1u16, 5, 9]);
        let b = SampleBuffer::from_reversed(vec![5u16]);
        let (wa, wb) = (a.window(), b.window());
        assert!(wa.less_than(0, &wb, 0));
        assert!(!wa.less_than(1, &wb, 0));
        assert!(!wa.greater_than(1, &wb, 0));
        assert!(wa.greater_than(2, &wb, 0));
        assert_eq!(wa.diff(2, &wb, 0), 16);
    }

    #[test]
    fn test_boundary_setters() {
        let mut buffer = SampleBuffer::<f32>::silent(3);
        {
            let mut w = buffer.window_mut();
            w.set_max_sample(0);
            w.set_min_sample(1);
            w.set(2, 0.25);
            assert_eq!(w.get(2), 0.25);
            w.set_neutral_sample(2);
        }
        let w = buffer.window();
        assert_eq!(w.get(0), f32::MAX);
        assert_eq!(w.get(1), -f32::MAX);
        assert_eq!(w.get(2), 0.0);
    }

    #[test]
    fn test_playback_order_is_reversed() {
        let buffer = SampleBuffer::from_playback_order(vec![1.0f32, 2.0, 3.0]);
        assert_eq!(buffer.window().as_slice(), &[3.0, 2.0, 1.0]);
    }

    #[test]
    fn test_pcm_channels_shape() {
        let channels = PcmChannels::F32(vec![
            SampleBuffer::silent(10),
            SampleBuffer::silent(10),
        ]);
        assert_eq!(channels.channel_count(), 2);
        assert_eq!(channels.len(), 10);
        assert!(!channels.is_empty());
        assert!(PcmChannels::U16(vec![]).is_empty());
    }
}
