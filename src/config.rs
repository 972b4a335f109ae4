//! Configuration parameters for loop analysis

use serde::{Deserialize, Serialize};

/// Loop analysis configuration parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopConfig {
    // Parallelism
    /// Worker tasks dispatched per search wave, and the size of the thread pool (default: 8)
    pub max_workers: usize,

    /// Candidate offsets handed to one worker per wave (default: 2048)
    /// Also the number of input samples per requantize task.
    pub offsets_per_worker: usize,

    // Search
    /// Number of coarse candidates kept at the lowest resolution (default: 5)
    pub coarse_candidates: usize,

    /// Reduction factor between two pyramid levels (default: 16)
    pub block_length: usize,

    /// Initial digit capacity of pooled distance accumulators (default: 2)
    /// Accumulators grow on demand; this only avoids early reallocation.
    pub accumulator_digits: usize,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            max_workers: 8,
            offsets_per_worker: 2048,
            coarse_candidates: 5,
            block_length: 16,
            accumulator_digits: 2,
        }
    }
}

impl LoopConfig {
    /// Set the number of workers per wave
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }

    /// Set the number of offsets per worker
    pub fn with_offsets_per_worker(mut self, offsets_per_worker: usize) -> Self {
        self.offsets_per_worker = offsets_per_worker;
        self
    }

    /// Set the number of coarse candidates
    pub fn with_coarse_candidates(mut self, coarse_candidates: usize) -> Self {
        self.coarse_candidates = coarse_candidates;
        self
    }

    /// Check that every parameter is usable
    pub fn validate(&self) -> Result<(), crate::error::AnalysisError> {
        let zero = [
            ("max_workers", self.max_workers),
            ("offsets_per_worker", self.offsets_per_worker),
            ("coarse_candidates", self.coarse_candidates),
            ("accumulator_digits", self.accumulator_digits),
        ]
        .into_iter()
        .find(|(_, v)| *v == 0);

        if let Some((name, _)) = zero {
            return Err(crate::error::AnalysisError::InvalidInput(format!(
                "{} must be at least 1",
                name
            )));
        }

        if self.block_length < 2 {
            return Err(crate::error::AnalysisError::InvalidInput(format!(
                "Invalid block length: {}",
                self.block_length
            )));
        }

        Ok(())
    }

    /// Total reduction between the raw samples and the coarsest pyramid level
    pub fn coarse_factor(&self) -> usize {
        self.block_length * self.block_length
    }
}
