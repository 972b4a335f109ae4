//! Checkout/return pool for scratch objects reused across search waves

use std::sync::{Mutex, PoisonError};

/// Pool of reusable values
///
/// `checkout` moves a value out of the pool (creating one if the pool is
/// empty), giving the caller exclusive ownership until it is handed back
/// with `give_back`.
pub struct ScratchPool<T> {
    items: Mutex<Vec<T>>,
    make: Box<dyn Fn() -> T + Send + Sync>,
}

impl<T> ScratchPool<T> {
    /// Empty pool that builds new values with `make`
    pub fn new(make: impl Fn() -> T + Send + Sync + 'static) -> Self {
        Self {
            items: Mutex::new(Vec::new()),
            make: Box::new(make),
        }
    }

    /// Take a value out of the pool
    pub fn checkout(&self) -> T {
        let reused = self
            .items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop();
        reused.unwrap_or_else(|| (self.make)())
    }

    /// Return a value for later reuse
    pub fn give_back(&self, item: T) {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(item);
    }

    /// Number of idle values
    pub fn idle(&self) -> usize {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl<T> std::fmt::Debug for ScratchPool<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScratchPool")
            .field("idle", &self.idle())
            .finish()
    }
}
