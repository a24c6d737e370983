//! Worker threads around the [`WeightedQueue`].
//!
//! Worker lifecycle: idle (waiting on `new_job`), dequeue under the lock, run
//! the functor outside it, then either loop or re-queue the job after a short
//! backoff when it asks to be rescheduled. The stop flag ends every worker the
//! next time it looks at the queue.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use colblk_result::Result;

use crate::config::ThreadPoolConfig;
use crate::job::{Job, JobFailure, JobStatus, Priority};
use crate::queue::WeightedQueue;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Role {
    Baseline(Priority),
    Extra,
}

/// Live worker counts.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct ThreadCounts {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub extra: usize,
}

#[derive(Debug)]
struct State {
    queue: WeightedQueue,
    /// Live baseline workers, indexed by [`Priority::index`].
    thread_counts: [usize; 3],
    extra_threads: usize,
    stop_extra: bool,
}

struct Shared {
    config: ThreadPoolConfig,
    default_counts: [usize; 3],
    state: Mutex<State>,
    new_job: Condvar,
    stop: AtomicBool,
    blocked: BlockedCounter,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

/// Locks survive a poisoned mutex: functors never run under the lock, so the
/// protected state is consistent whenever a holder panics.
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Multi-class thread pool with weighted fair scheduling across transactions.
pub struct FairThreadPool {
    shared: Arc<Shared>,
}

impl FairThreadPool {
    /// Start the baseline workers.
    pub fn new(config: ThreadPoolConfig) -> Result<Self> {
        let mut default_counts = [0; 3];
        default_counts[Priority::High.index()] = config.high_threads;
        default_counts[Priority::Medium.index()] = config.medium_threads;
        default_counts[Priority::Low.index()] = config.low_threads;
        let shared = Arc::new(Shared {
            config,
            default_counts,
            state: Mutex::new(State {
                queue: WeightedQueue::default(),
                thread_counts: [0; 3],
                extra_threads: 0,
                stop_extra: true,
            }),
            new_job: Condvar::new(),
            stop: AtomicBool::new(false),
            blocked: BlockedCounter::default(),
            handles: Mutex::new(Vec::new()),
        });

        {
            let mut st = lock(&shared.state);
            for priority in Priority::ALL {
                for _ in 0..default_counts[priority.index()] {
                    shared.spawn(Role::Baseline(priority))?;
                    st.thread_counts[priority.index()] += 1;
                }
            }
        }
        tracing::info!(
            "[POOL] started {} high, {} medium, {} low workers",
            default_counts[Priority::High.index()],
            default_counts[Priority::Medium.index()],
            default_counts[Priority::Low.index()]
        );
        Ok(Self { shared })
    }

    /// Queue a job. Also replaces baseline workers lost to failed jobs and
    /// adds an extra worker for every blocked worker not yet compensated.
    pub fn add_job(&self, job: Job) {
        self.shared.enqueue(job);
    }

    /// Cancel queued jobs with cancellation key `id`. Running jobs are not
    /// affected. Returns the number of jobs removed.
    pub fn remove_jobs(&self, id: u32) -> usize {
        let removed = lock(&self.shared.state).queue.remove(id);
        if removed > 0 {
            tracing::debug!("[POOL] removed {} queued job(s) with id {}", removed, id);
        }
        removed
    }

    /// A worker is about to block on downstream backpressure.
    pub fn inc_blocked_threads(&self) {
        self.shared.blocked.inc();
    }

    pub fn dec_blocked_threads(&self) {
        self.shared.blocked.dec();
    }

    pub fn blocked_thread_count(&self) -> usize {
        self.shared.blocked.get()
    }

    /// Count this thread as blocked until the guard drops.
    pub fn blocked_guard(&self) -> BlockedGuard {
        self.shared.blocked.guard()
    }

    /// Handle on the blocked-worker counter for functors that may block.
    ///
    /// The handle does not keep the pool alive, so a queued job may own one.
    pub fn blocked_counter(&self) -> BlockedCounter {
        self.shared.blocked.clone()
    }

    pub fn thread_counts(&self) -> ThreadCounts {
        let st = lock(&self.shared.state);
        ThreadCounts {
            high: st.thread_counts[Priority::High.index()],
            medium: st.thread_counts[Priority::Medium.index()],
            low: st.thread_counts[Priority::Low.index()],
            extra: st.extra_threads,
        }
    }

    /// Jobs queued and not yet picked up by a worker.
    pub fn pending_jobs(&self) -> usize {
        lock(&self.shared.state).queue.len()
    }

    /// Log the scheduler state.
    pub fn dump(&self) {
        let st = lock(&self.shared.state);
        tracing::info!(
            "[POOL] pending={} txns={} heap_entries={} threads={:?} extra={} stop_extra={} blocked={}",
            st.queue.len(),
            st.queue.transactions(),
            st.queue.heap_entries(),
            st.thread_counts,
            st.extra_threads,
            st.stop_extra,
            self.blocked_thread_count()
        );
    }

    /// Ask every worker to exit. Queued jobs stay queued; running jobs finish.
    pub fn stop(&self) {
        self.shared.stop.store(true, Ordering::SeqCst);
        // Taking the lock orders the store before any worker's next check.
        drop(lock(&self.shared.state));
        self.shared.new_job.notify_all();
    }

    /// Stop and wait for every worker thread to exit.
    pub fn join(&self) {
        self.stop();
        loop {
            let handles = std::mem::take(&mut *lock(&self.shared.handles));
            if handles.is_empty() {
                break;
            }
            for handle in handles {
                let _ = handle.join();
            }
        }
    }
}

impl Drop for FairThreadPool {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Shared count of workers blocked on downstream backpressure.
#[derive(Clone, Debug, Default)]
pub struct BlockedCounter(Arc<AtomicUsize>);

impl BlockedCounter {
    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn dec(&self) {
        // Saturate so an unmatched decrement cannot wrap the counter.
        let _ = self
            .0
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
    }

    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    pub fn guard(&self) -> BlockedGuard {
        self.inc();
        BlockedGuard {
            counter: self.clone(),
        }
    }
}

/// Returned by [`BlockedCounter::guard`] and [`FairThreadPool::blocked_guard`].
pub struct BlockedGuard {
    counter: BlockedCounter,
}

impl Drop for BlockedGuard {
    fn drop(&mut self) {
        self.counter.dec();
    }
}

impl Shared {
    fn spawn(self: &Arc<Self>, role: Role) -> Result<()> {
        let name = match role {
            Role::Baseline(p) => format!("{}-{:?}", self.config.name, p).to_lowercase(),
            Role::Extra => format!("{}-extra", self.config.name),
        };
        let shared = Arc::clone(self);
        let handle = thread::Builder::new()
            .name(name)
            .spawn(move || shared.worker(role))?;
        lock(&self.handles).push(handle);
        Ok(())
    }

    fn enqueue(self: &Arc<Self>, job: Job) {
        let mut st = lock(&self.state);
        for priority in Priority::ALL {
            let i = priority.index();
            while st.thread_counts[i] < self.default_counts[i] {
                if let Err(e) = self.spawn(Role::Baseline(priority)) {
                    tracing::error!("[POOL] could not replace {:?} worker: {}", priority, e);
                    break;
                }
                st.thread_counts[i] += 1;
            }
        }

        let blocked = self.blocked.get();
        if blocked > st.extra_threads {
            st.stop_extra = false;
            match self.spawn(Role::Extra) {
                Ok(()) => {
                    st.extra_threads += 1;
                    tracing::debug!(
                        "[POOL] {} blocked worker(s), {} extra",
                        blocked,
                        st.extra_threads
                    );
                }
                Err(e) => tracing::error!("[POOL] could not start extra worker: {}", e),
            }
        } else if blocked == 0 && !st.stop_extra {
            st.stop_extra = true;
            self.new_job.notify_all();
        }

        st.queue.push(job);
        drop(st);
        self.new_job.notify_one();
    }

    fn worker(self: Arc<Self>, role: Role) {
        loop {
            let job = {
                let mut st = lock(&self.state);
                loop {
                    if self.stop.load(Ordering::SeqCst) {
                        return;
                    }
                    if role == Role::Extra && st.stop_extra && st.queue.is_empty() {
                        st.extra_threads -= 1;
                        tracing::debug!("[POOL] extra worker exiting");
                        return;
                    }
                    if let Some(job) = st.queue.pop() {
                        break job;
                    }
                    st = self
                        .new_job
                        .wait(st)
                        .unwrap_or_else(PoisonError::into_inner);
                }
            };

            let outcome = catch_unwind(AssertUnwindSafe(|| job.functor.run()));
            match outcome {
                Ok(Ok(JobStatus::Complete)) => {}
                Ok(Ok(JobStatus::Reschedule)) => {
                    thread::sleep(self.config.reschedule_backoff);
                    self.enqueue(job);
                }
                Ok(Err(e)) => {
                    self.fail(role, &job, e.to_string());
                    return;
                }
                Err(panic) => {
                    self.fail(role, &job, panic_message(panic.as_ref()));
                    return;
                }
            }
        }
    }

    /// The worker exits after a failed job; the next `add_job` replaces it.
    fn fail(&self, role: Role, job: &Job, message: String) {
        {
            let mut st = lock(&self.state);
            match role {
                Role::Baseline(p) => st.thread_counts[p.index()] -= 1,
                Role::Extra => st.extra_threads -= 1,
            }
        }
        tracing::error!(
            "[POOL] job {} step {} of txn {} failed: {}",
            job.unique_id,
            job.step_id,
            job.txn,
            message
        );
        if let Some(reply) = &job.reply {
            let _ = reply.send(JobFailure {
                unique_id: job.unique_id,
                step_id: job.step_id,
                message,
            });
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "job panicked".to_string()
    }
}
