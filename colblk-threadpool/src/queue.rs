//! Per-transaction FIFO lists ordered by accumulated weight.
//!
//! Invariant: every transaction with pending jobs owns exactly one *live* heap
//! entry, the one tagged with its current generation. Entries whose
//! transaction has gone (drained or cancelled) or whose generation is older
//! are stale and are discarded when they surface at the top of the heap. The
//! heap is never scrubbed eagerly.

use std::cmp::Reverse;
use std::collections::hash_map::Entry;
use std::collections::{BinaryHeap, VecDeque};

use rustc_hash::FxHashMap;

use crate::job::{Job, TxnId};

#[derive(Debug)]
struct TxnJobs {
    generation: u64,
    jobs: VecDeque<Job>,
}

/// `(accumulated weight, txn, generation)`, smallest weight first.
type WeightedTxn = Reverse<(u64, TxnId, u64)>;

#[derive(Debug, Default)]
pub(crate) struct WeightedQueue {
    txns: FxHashMap<TxnId, TxnJobs>,
    weights: BinaryHeap<WeightedTxn>,
    next_generation: u64,
    pending: usize,
}

impl WeightedQueue {
    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.pending == 0
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.pending
    }

    pub(crate) fn transactions(&self) -> usize {
        self.txns.len()
    }

    pub(crate) fn heap_entries(&self) -> usize {
        self.weights.len()
    }

    /// Append `job` to its transaction's list. A transaction that was not
    /// scheduled enters at the weight currently at the top of the heap, so it
    /// neither jumps ahead of nor lags behind the running transactions.
    pub(crate) fn push(&mut self, job: Job) {
        self.pending += 1;
        match self.txns.entry(job.txn) {
            Entry::Occupied(e) => e.into_mut().jobs.push_back(job),
            Entry::Vacant(e) => {
                let top = self.weights.peek().map_or(0, |Reverse((w, _, _))| *w);
                let generation = self.next_generation;
                self.next_generation += 1;
                self.weights.push(Reverse((top, job.txn, generation)));
                e.insert(TxnJobs {
                    generation,
                    jobs: VecDeque::from([job]),
                });
            }
        }
    }

    /// Oldest job of the least-weighted transaction. The transaction is charged
    /// the job's weight if it still has work, or leaves the schedule if not.
    pub(crate) fn pop(&mut self) -> Option<Job> {
        while let Some(Reverse((weight, txn, generation))) = self.weights.pop() {
            let Some(entry) = self.txns.get_mut(&txn) else {
                continue;
            };
            if entry.generation != generation {
                continue;
            }
            let Some(job) = entry.jobs.pop_front() else {
                self.txns.remove(&txn);
                continue;
            };
            self.pending -= 1;
            if entry.jobs.is_empty() {
                self.txns.remove(&txn);
            } else {
                self.weights
                    .push(Reverse((weight + u64::from(job.weight), txn, generation)));
            }
            return Some(job);
        }
        None
    }

    /// Drop every queued job carrying cancellation key `id`.
    pub(crate) fn remove(&mut self, id: u32) -> usize {
        let mut removed = 0;
        self.txns.retain(|_, entry| {
            let before = entry.jobs.len();
            entry.jobs.retain(|job| job.id != id);
            removed += before - entry.jobs.len();
            !entry.jobs.is_empty()
        });
        self.pending -= removed;
        removed
    }
}
