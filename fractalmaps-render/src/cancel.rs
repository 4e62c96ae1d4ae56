use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

/// Monotonic render-request stamp shared between a session and its workers.
///
/// Advancing the generation invalidates every pass issued under an older
/// stamp. The progress counters describe the pass currently merging.
#[derive(Debug, Default)]
pub struct GenerationCounter {
    generation: AtomicU64,
    progress_done: AtomicUsize,
    progress_total: AtomicUsize,
}

impl GenerationCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new generation and return its stamp.
    pub fn advance(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// The newest stamp issued.
    pub fn current(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Reset progress for a new pass with `total` tiles.
    pub fn reset_progress(&self, total: usize) {
        self.progress_total.store(total, Ordering::Relaxed);
        self.progress_done.store(0, Ordering::Relaxed);
    }

    /// Count one merged tile.
    pub fn inc_progress(&self) {
        self.progress_done.fetch_add(1, Ordering::Relaxed);
    }

    /// Progress of the current pass as `(merged, total)`.
    pub fn progress(&self) -> (usize, usize) {
        (
            self.progress_done.load(Ordering::Relaxed),
            self.progress_total.load(Ordering::Relaxed),
        )
    }
}

/// Cancellation handle for every pass of one generation.
///
/// Workers poll [`is_live`](Self::is_live) between rows; the owner flips it
/// off with [`cancel`](Self::cancel) or by advancing the counter.
#[derive(Debug, Clone)]
pub struct PassToken {
    generation: u64,
    counter: Arc<GenerationCounter>,
    cancelled: Arc<AtomicBool>,
}

impl PassToken {
    /// Advance `counter` and return a token for the new generation.
    pub fn issue(counter: &Arc<GenerationCounter>) -> Self {
        Self {
            generation: counter.advance(),
            counter: Arc::clone(counter),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Stop this generation's work. Does not wait for workers.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Not cancelled and not superseded by a newer generation.
    #[inline]
    pub fn is_live(&self) -> bool {
        !self.cancelled.load(Ordering::Acquire) && self.counter.current() == self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generations_increase() {
        let counter = Arc::new(GenerationCounter::new());
        let a = PassToken::issue(&counter);
        let b = PassToken::issue(&counter);
        assert!(b.generation() > a.generation());
        assert_eq!(counter.current(), b.generation());
    }

    #[test]
    fn newer_token_supersedes_older() {
        let counter = Arc::new(GenerationCounter::new());
        let old = PassToken::issue(&counter);
        assert!(old.is_live());
        let new = PassToken::issue(&counter);
        assert!(!old.is_live());
        assert!(new.is_live());
    }

    #[test]
    fn cancel_is_shared_by_clones() {
        let counter = Arc::new(GenerationCounter::new());
        let token = PassToken::issue(&counter);
        let worker_copy = token.clone();
        token.cancel();
        assert!(!worker_copy.is_live());
        assert_eq!(counter.current(), token.generation());
    }

    #[test]
    fn progress_tracking() {
        let counter = GenerationCounter::new();
        counter.reset_progress(3);
        counter.inc_progress();
        counter.inc_progress();
        assert_eq!(counter.progress(), (2, 3));
        counter.reset_progress(5);
        assert_eq!(counter.progress(), (0, 5));
    }
}
