use std::fmt;
use std::sync::Arc;

use crossbeam_channel::Sender;
use num_enum::{IntoPrimitive, TryFromPrimitive};

use colblk_result::Result;

/// Transaction a job belongs to; the unit of fairness.
pub type TxnId = u32;

/// Priority class of a worker thread. Jobs of every class share one weighted
/// queue; the class sizes the baseline worker set.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum Priority {
    Low = 0,
    #[default]
    Medium = 1,
    High = 2,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

    #[inline]
    pub(crate) fn index(self) -> usize {
        u8::from(self) as usize
    }
}

/// Outcome of one functor invocation.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum JobStatus {
    Complete,
    /// The job could not make progress (e.g. its output channel is full) and
    /// must be queued again.
    Reschedule,
}

/// Work executed by a pool worker. Invoked outside the pool lock; may be
/// invoked again after returning [`JobStatus::Reschedule`].
pub trait JobFunctor: Send + Sync {
    fn run(&self) -> Result<JobStatus>;
}

impl<F> JobFunctor for F
where
    F: Fn() -> Result<JobStatus> + Send + Sync,
{
    fn run(&self) -> Result<JobStatus> {
        self()
    }
}

/// Error report sent to a job's requester when its functor fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobFailure {
    pub unique_id: u32,
    pub step_id: u32,
    pub message: String,
}

/// One schedulable unit of work.
#[derive(Clone)]
pub struct Job {
    pub unique_id: u32,
    pub step_id: u32,
    pub txn: TxnId,
    pub functor: Arc<dyn JobFunctor>,
    /// Where failures are reported.
    pub reply: Option<Sender<JobFailure>>,
    /// Scheduler cost charged to the transaction when this job is dequeued.
    pub weight: u32,
    pub priority: Priority,
    /// Cancellation key for [`FairThreadPool::remove_jobs`](crate::FairThreadPool::remove_jobs).
    pub id: u32,
}

impl Job {
    pub fn new(txn: TxnId, functor: Arc<dyn JobFunctor>) -> Self {
        Self {
            unique_id: 0,
            step_id: 0,
            txn,
            functor,
            reply: None,
            weight: 1,
            priority: Priority::default(),
            id: 0,
        }
    }

    /// Job running closure `f`.
    pub fn from_fn<F>(txn: TxnId, f: F) -> Self
    where
        F: Fn() -> Result<JobStatus> + Send + Sync + 'static,
    {
        Self::new(txn, Arc::new(f))
    }

    pub fn with_step(mut self, unique_id: u32, step_id: u32) -> Self {
        self.unique_id = unique_id;
        self.step_id = step_id;
        self
    }

    pub fn with_weight(mut self, weight: u32) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_id(mut self, id: u32) -> Self {
        self.id = id;
        self
    }

    pub fn with_reply(mut self, reply: Sender<JobFailure>) -> Self {
        self.reply = Some(reply);
        self
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("unique_id", &self.unique_id)
            .field("step_id", &self.step_id)
            .field("txn", &self.txn)
            .field("weight", &self.weight)
            .field("priority", &self.priority)
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}
