//! Driving column commands from the fair scheduler.
//!
//! A [`ScanStep`] splits a step's blocks across a few [`BlockScanJob`]s. A run
//! of a job works through its blocks until the consumer's channel pushes back.
//! Under [`Backpressure::Reschedule`] the job then yields its worker so the
//! scheduler can interleave other transactions before it resumes.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crossbeam_channel::{Sender, TrySendError};

use colblk_result::Result;
use colblk_threadpool::{
    BlockedCounter, FairThreadPool, Job, JobFailure, JobFunctor, JobStatus, Priority, TxnId,
};

use crate::command::{BlockRef, ColumnCommand, StepInput, StepOutput};
use crate::source::BlockSource;

/// What a job does when the consumer's channel is full.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum Backpressure {
    /// Block the worker on the send and count it as blocked so the pool can
    /// compensate with an extra thread.
    #[default]
    Block,
    /// Keep the result and return [`JobStatus::Reschedule`].
    Reschedule,
}

/// One logical block to process, with the step's surviving rows for it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlockTask {
    pub block: BlockRef,
    /// Ignored by scans.
    pub input: Option<StepInput>,
}

impl BlockTask {
    pub fn scan(block: BlockRef) -> Self {
        Self { block, input: None }
    }

    pub fn step(block: BlockRef, input: StepInput) -> Self {
        Self {
            block,
            input: Some(input),
        }
    }
}

#[derive(Debug, Default)]
struct Progress {
    next: usize,
    /// Result that did not fit in the channel on the previous run.
    held: Option<StepOutput>,
}

enum Delivery {
    Sent,
    Held,
    Closed,
}

/// Scheduler functor scanning a list of blocks.
pub struct BlockScanJob {
    command: Arc<ColumnCommand>,
    source: Arc<dyn BlockSource>,
    tasks: Vec<BlockTask>,
    results: Sender<StepOutput>,
    backpressure: Backpressure,
    blocked: Option<BlockedCounter>,
    progress: Mutex<Progress>,
}

impl BlockScanJob {
    pub fn new(
        command: Arc<ColumnCommand>,
        source: Arc<dyn BlockSource>,
        tasks: Vec<BlockTask>,
        results: Sender<StepOutput>,
    ) -> Self {
        Self {
            command,
            source,
            tasks,
            results,
            backpressure: Backpressure::default(),
            blocked: None,
            progress: Mutex::new(Progress::default()),
        }
    }

    /// Backpressure policy; `blocked` is the pool counter a blocking send
    /// reports to.
    pub fn with_backpressure(
        mut self,
        backpressure: Backpressure,
        blocked: Option<BlockedCounter>,
    ) -> Self {
        self.backpressure = backpressure;
        self.blocked = blocked;
        self
    }

    pub fn remaining(&self) -> usize {
        let p = self.progress();
        self.tasks.len() - p.next + p.held.is_some() as usize
    }

    fn progress(&self) -> MutexGuard<'_, Progress> {
        self.progress.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn deliver(&self, progress: &mut Progress, out: StepOutput) -> Delivery {
        match self.results.try_send(out) {
            Ok(()) => Delivery::Sent,
            Err(TrySendError::Disconnected(_)) => Delivery::Closed,
            Err(TrySendError::Full(out)) => match self.backpressure {
                Backpressure::Reschedule => {
                    progress.held = Some(out);
                    Delivery::Held
                }
                Backpressure::Block => {
                    let _guard = self.blocked.as_ref().map(BlockedCounter::guard);
                    match self.results.send(out) {
                        Ok(()) => Delivery::Sent,
                        Err(_) => Delivery::Closed,
                    }
                }
            },
        }
    }

    fn abandon(&self, progress: &mut Progress) -> JobStatus {
        let skipped = self.tasks.len() - progress.next;
        tracing::warn!(
            "[COLCMD] result channel closed, abandoning {} block(s)",
            skipped
        );
        progress.next = self.tasks.len();
        progress.held = None;
        JobStatus::Complete
    }
}

impl JobFunctor for BlockScanJob {
    fn run(&self) -> Result<JobStatus> {
        let mut progress = self.progress();

        loop {
            let out = match progress.held.take() {
                Some(held) => held,
                None => {
                    let Some(task) = self.tasks.get(progress.next) else {
                        return Ok(JobStatus::Complete);
                    };
                    progress.next += 1;
                    self.command
                        .execute(self.source.as_ref(), task.block, task.input.as_ref())?
                }
            };
            match self.deliver(&mut progress, out) {
                Delivery::Sent => {}
                Delivery::Held => {
                    tracing::trace!(
                        "[COLCMD] channel full, yielding with {} block(s) left",
                        self.tasks.len() - progress.next
                    );
                    return Ok(JobStatus::Reschedule);
                }
                Delivery::Closed => return Ok(self.abandon(&mut progress)),
            }
        }
    }
}

/// Submission of one column command over a set of blocks.
pub struct ScanStep {
    command: Arc<ColumnCommand>,
    source: Arc<dyn BlockSource>,
    txn: TxnId,
    unique_id: u32,
    step_id: u32,
    priority: Priority,
    weight: u32,
    backpressure: Backpressure,
    jobs: usize,
}

impl ScanStep {
    pub fn new(command: Arc<ColumnCommand>, source: Arc<dyn BlockSource>, txn: TxnId) -> Self {
        Self {
            command,
            source,
            txn,
            unique_id: 0,
            step_id: 0,
            priority: Priority::default(),
            weight: 1,
            backpressure: Backpressure::default(),
            jobs: 1,
        }
    }

    /// Ids reported in [`JobFailure`]s. `step_id` is also the cancellation key
    /// for [`FairThreadPool::remove_jobs`].
    pub fn with_step(mut self, unique_id: u32, step_id: u32) -> Self {
        self.unique_id = unique_id;
        self.step_id = step_id;
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_weight(mut self, weight: u32) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_backpressure(mut self, backpressure: Backpressure) -> Self {
        self.backpressure = backpressure;
        self
    }

    /// Spread the blocks over at most `jobs` jobs.
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    /// Queue the jobs. Every block's [`StepOutput`] arrives on `results`;
    /// failures arrive on `reply`. Returns the number of jobs queued.
    pub fn submit(
        &self,
        pool: &FairThreadPool,
        tasks: Vec<BlockTask>,
        results: Sender<StepOutput>,
        reply: Option<Sender<JobFailure>>,
    ) -> usize {
        let n = self.jobs.min(tasks.len());
        if n == 0 {
            return 0;
        }
        let mut split: Vec<Vec<BlockTask>> = vec![Vec::new(); n];
        for (i, task) in tasks.into_iter().enumerate() {
            split[i % n].push(task);
        }
        for tasks in split {
            let functor = BlockScanJob::new(
                Arc::clone(&self.command),
                Arc::clone(&self.source),
                tasks,
                results.clone(),
            )
            .with_backpressure(self.backpressure, Some(pool.blocked_counter()));
            let mut job = Job::new(self.txn, Arc::new(functor))
                .with_step(self.unique_id, self.step_id)
                .with_priority(self.priority)
                .with_weight(self.weight)
                .with_id(self.step_id);
            if let Some(reply) = &reply {
                job = job.with_reply(reply.clone());
            }
            pool.add_job(job);
        }
        tracing::debug!(
            "[COLCMD] step {} of txn {} queued as {} job(s)",
            self.step_id,
            self.txn,
            n
        );
        n
    }
}
