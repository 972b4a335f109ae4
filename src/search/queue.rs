//! Fixed-capacity queue of the best alignments found so far

use super::accumulator::Accumulator;

/// A candidate offset and a snapshot of its score
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Align {
    /// Candidate offset in buffer-index space
    pub offset: usize,
    /// Accumulated distance at that offset (lower is better)
    pub score: Accumulator,
}

/// Top-K list of alignments, sorted ascending by score
///
/// Once full, the last entry's score is the pruning bound: a candidate must
/// score strictly lower to be accepted.
#[derive(Debug, Clone)]
pub struct AlignQueue {
    aligns: Vec<Align>,
    capacity: usize,
}

impl AlignQueue {
    /// Empty queue holding at most `capacity` alignments
    pub fn new(capacity: usize) -> Self {
        Self {
            aligns: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Offer a candidate; returns whether it was accepted
    ///
    /// The candidate goes before the first entry it strictly beats, so equal
    /// scores keep insertion order. When the queue is full the worst entry is
    /// evicted and its storage reused.
    pub fn put(&mut self, offset: usize, score: &Accumulator) -> bool {
        if let Some(i) = self.aligns.iter().position(|a| score < &a.score) {
            let slot = if self.aligns.len() == self.capacity {
                self.aligns.pop().map(|mut evicted| {
                    evicted.offset = offset;
                    evicted.score.copy_from(score);
                    evicted
                })
            } else {
                None
            };

            let align = slot.unwrap_or_else(|| Align {
                offset,
                score: score.clone(),
            });
            self.aligns.insert(i, align);
            return true;
        }

        if self.aligns.len() < self.capacity {
            self.aligns.push(Align {
                offset,
                score: score.clone(),
            });
            return true;
        }

        false
    }

    /// Score of the worst entry, or `None` while the queue is not yet full
    pub fn worst_score(&self) -> Option<&Accumulator> {
        if self.aligns.len() < self.capacity {
            None
        } else {
            self.aligns.last().map(|a| &a.score)
        }
    }

    /// Overwrite every existing entry with `(offset, score)`
    ///
    /// Used to seed a reused worker queue with the global bound.
    pub fn fill(&mut self, offset: usize, score: &Accumulator) {
        for align in &mut self.aligns {
            align.offset = offset;
            align.score.copy_from(score);
        }
    }

    /// Remove every entry
    pub fn clear(&mut self) {
        self.aligns.clear();
    }

    /// Best entry, if any
    pub fn best(&self) -> Option<&Align> {
        self.aligns.first()
    }

    /// Entries, best first
    pub fn aligns(&self) -> &[Align] {
        &self.aligns
    }

    /// Consume the queue, returning its entries best first
    pub fn into_aligns(self) -> Vec<Align> {
        self.aligns
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.aligns.len()
    }

    /// Whether the queue holds no entries
    pub fn is_empty(&self) -> bool {
        self.aligns.is_empty()
    }

    /// Maximum number of entries
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
