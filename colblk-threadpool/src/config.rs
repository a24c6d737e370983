use std::thread;
use std::time::Duration;

/// Run-time configuration for [`FairThreadPool`](crate::FairThreadPool)
/// (no hidden constants).
#[derive(Debug, Clone)]
pub struct ThreadPoolConfig {
    /// Baseline workers per priority class.
    pub high_threads: usize,
    pub medium_threads: usize,
    pub low_threads: usize,
    /// Pause before a rescheduled job is queued again.
    pub reschedule_backoff: Duration,
    /// Worker thread name prefix.
    pub name: String,
}

impl Default for ThreadPoolConfig {
    fn default() -> Self {
        let cores = thread::available_parallelism().map_or(4, |n| n.get());
        Self {
            high_threads: cores,
            medium_threads: (cores / 2).max(1),
            low_threads: 1,
            reschedule_backoff: Duration::from_millis(1),
            name: "colblk-pool".to_string(),
        }
    }
}

impl ThreadPoolConfig {
    /// Pool with `threads` high-priority workers and no others.
    pub fn with_threads(threads: usize) -> Self {
        Self {
            high_threads: threads,
            medium_threads: 0,
            low_threads: 0,
            ..Self::default()
        }
    }

    pub fn baseline_threads(&self) -> usize {
        self.high_threads + self.medium_threads + self.low_threads
    }
}
