//! Exact distance accumulator
//!
//! Squared sample differences over a one-second window easily exceed `u64`,
//! so scores are summed into an arbitrary-precision non-negative integer.
//!
//! Digits are stored most-significant first. `msd` is the index of the most
//! significant non-zero digit, or `digits.len()` when the value is zero, so
//! comparisons can skip leading zero digits without scanning them.

use std::cmp::Ordering;

/// Arbitrary-precision non-negative integer built from `u64` digits
#[derive(Debug, Clone)]
pub struct Accumulator {
    digits: Vec<u64>,
    msd: usize,
}

impl Accumulator {
    /// Zero-valued accumulator with room for `capacity` digits
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            digits: vec![0; capacity],
            msd: capacity,
        }
    }

    /// Add `x`, carrying into more significant digits
    ///
    /// When the carry runs past the most significant digit a new digit is
    /// prepended, so no call ever loses precision.
    pub fn add(&mut self, x: u64) {
        let mut carry = x;
        let mut p = self.digits.len();

        while p > 0 && carry != 0 {
            p -= 1;
            let (sum, overflow) = self.digits[p].overflowing_add(carry);
            self.digits[p] = sum;
            carry = u64::from(overflow);
            if sum != 0 && p < self.msd {
                self.msd = p;
            }
        }

        if carry != 0 {
            self.digits.insert(0, carry);
            self.msd = 0;
        }
    }

    /// Number of significant digits
    #[inline]
    pub fn significant_len(&self) -> usize {
        self.digits.len() - self.msd
    }

    /// Digit capacity, including leading zero digits
    pub fn capacity(&self) -> usize {
        self.digits.len()
    }

    /// Significant digits, most significant first (empty for zero)
    pub fn significant_digits(&self) -> &[u64] {
        &self.digits[self.msd..]
    }

    /// Whether the value is zero
    pub fn is_zero(&self) -> bool {
        self.msd == self.digits.len()
    }

    /// Value as `u128`, if it fits
    pub fn to_u128(&self) -> Option<u128> {
        match self.significant_digits() {
            [] => Some(0),
            [lo] => Some(u128::from(*lo)),
            [hi, lo] => Some((u128::from(*hi) << 64) | u128::from(*lo)),
            _ => None,
        }
    }

    /// Copy the value of `src`, keeping this accumulator's capacity if it is larger
    pub fn copy_from(&mut self, src: &Accumulator) {
        if self.digits.len() < src.digits.len() {
            self.digits.resize(src.digits.len(), 0);
        }

        let pad = self.digits.len() - src.digits.len();
        self.digits[..pad].fill(0);
        self.digits[pad..].copy_from_slice(&src.digits);
        self.msd = src.msd + pad;
    }

    /// Reset to zero
    pub fn reset(&mut self) {
        self.digits.fill(0);
        self.msd = self.digits.len();
    }
}

impl Default for Accumulator {
    fn default() -> Self {
        Self::with_capacity(1)
    }
}

impl Ord for Accumulator {
    fn cmp(&self, other: &Self) -> Ordering {
        self.significant_len()
            .cmp(&other.significant_len())
            .then_with(|| self.significant_digits().cmp(other.significant_digits()))
    }
}

impl PartialOrd for Accumulator {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Accumulator {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Accumulator {}
