use std::sync::atomic::{AtomicBool, Ordering};

/// Holds an instance's busy flag for the duration of one state-mutating call.
///
/// The flag is released when the guard drops, on every return path.
#[must_use]
pub(crate) struct ReentrancyGuard<'a> {
    busy: &'a AtomicBool,
}

impl<'a> ReentrancyGuard<'a> {
    /// Claims `busy`, or returns `None` if a mutating call is already in flight.
    pub(crate) fn enter(busy: &'a AtomicBool) -> Option<Self> {
        busy.compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| Self { busy })
    }
}

impl Drop for ReentrancyGuard<'_> {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}
