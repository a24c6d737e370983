use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, bounded, unbounded};

use colblk_result::Error;
use colblk_test_utils::init_tracing_for_tests;
use colblk_threadpool::{
    BlockedCounter, FairThreadPool, Job, JobStatus, ThreadCounts, ThreadPoolConfig, TxnId,
};

const WAIT: Duration = Duration::from_secs(10);

fn assert_send_sync<T: Send + Sync>() {}

#[test]
fn pool_handles_are_thread_safe() {
    assert_send_sync::<FairThreadPool>();
    assert_send_sync::<BlockedCounter>();
    assert_send_sync::<Job>();
}

#[test]
fn blocked_counter_outlives_pool_borrow() {
    let pool = FairThreadPool::new(ThreadPoolConfig::with_threads(1)).unwrap();
    let counter = pool.blocked_counter();
    let guard = counter.guard();
    assert_eq!(pool.blocked_thread_count(), 1);
    counter.dec();
    counter.dec();
    assert_eq!(pool.blocked_thread_count(), 0);
    drop(guard);
    assert_eq!(counter.get(), 0);
    pool.join();
}

/// Occupy `n` workers until the returned sender is dropped.
fn occupy_workers(pool: &FairThreadPool, n: usize) -> Sender<()> {
    let (started_tx, started_rx) = unbounded::<()>();
    let (release_tx, release_rx) = bounded::<()>(0);
    for _ in 0..n {
        let started = started_tx.clone();
        let release: Receiver<()> = release_rx.clone();
        pool.add_job(Job::from_fn(
            0,
            move || {
                let _ = started.send(());
                let _ = release.recv();
                Ok(JobStatus::Complete)
            },
        ));
    }
    for _ in 0..n {
        started_rx.recv_timeout(WAIT).unwrap();
    }
    release_tx
}

/// Job that records its transaction and signals completion.
fn recorder(txn: TxnId, log: &Arc<Mutex<Vec<TxnId>>>, done: &Sender<()>) -> Job {
    let log = Arc::clone(log);
    let done = done.clone();
    Job::from_fn(txn, move || {
        log.lock().unwrap().push(txn);
        let _ = done.send(());
        Ok(JobStatus::Complete)
    })
}

fn wait_for(mut cond: impl FnMut() -> bool) {
    let deadline = Instant::now() + WAIT;
    while !cond() {
        assert!(Instant::now() < deadline, "condition not reached in time");
        thread::sleep(Duration::from_millis(2));
    }
}

#[test]
fn light_transaction_is_not_starved() {
    init_tracing_for_tests();
    for threads in [1, 2, 4] {
        let pool = FairThreadPool::new(ThreadPoolConfig::with_threads(threads)).unwrap();
        let release = occupy_workers(&pool, threads);

        let log = Arc::new(Mutex::new(Vec::new()));
        let (done_tx, done_rx) = unbounded();
        for i in 0..100 {
            pool.add_job(recorder(1, &log, &done_tx));
            if i == 50 {
                pool.add_job(recorder(2, &log, &done_tx));
            }
        }
        drop(release);
        for _ in 0..101 {
            done_rx.recv_timeout(WAIT).unwrap();
        }

        let log = log.lock().unwrap();
        let pos = log.iter().position(|&t| t == 2).unwrap();
        assert!(pos <= threads + 1, "{threads} thread(s): light txn ran at {pos}");
        pool.join();
    }
}

#[test]
fn heavy_transaction_consumption_is_bounded() {
    init_tracing_for_tests();
    let pool = FairThreadPool::new(ThreadPoolConfig::with_threads(1)).unwrap();
    let release = occupy_workers(&pool, 1);

    let log = Arc::new(Mutex::new(Vec::new()));
    let (done_tx, done_rx) = unbounded();
    for _ in 0..100 {
        pool.add_job(recorder(10, &log, &done_tx).with_weight(10));
    }
    for _ in 0..10 {
        pool.add_job(recorder(20, &log, &done_tx).with_weight(1));
    }
    drop(release);
    for _ in 0..110 {
        done_rx.recv_timeout(WAIT).unwrap();
    }

    let log = log.lock().unwrap();
    let last_light = log.iter().rposition(|&t| t == 20).unwrap();
    let heavy_weight: usize = log[..last_light].iter().filter(|&&t| t == 10).count() * 10;
    assert!(
        heavy_weight <= 100,
        "heavy txn consumed {heavy_weight} before the light one finished"
    );
    pool.join();
}

#[test]
fn jobs_run_fifo_within_a_transaction() {
    let pool = FairThreadPool::new(ThreadPoolConfig::with_threads(1)).unwrap();
    let release = occupy_workers(&pool, 1);
    let order = Arc::new(Mutex::new(Vec::new()));
    let (done_tx, done_rx) = unbounded();
    for i in 0..20u32 {
        let order = Arc::clone(&order);
        let done = done_tx.clone();
        pool.add_job(Job::from_fn(
            5,
            move || {
                order.lock().unwrap().push(i);
                let _ = done.send(());
                Ok(JobStatus::Complete)
            },
        ));
    }
    drop(release);
    for _ in 0..20 {
        done_rx.recv_timeout(WAIT).unwrap();
    }
    assert_eq!(*order.lock().unwrap(), (0..20).collect::<Vec<_>>());
    pool.join();
}

#[test]
fn rescheduled_job_runs_again() {
    let pool = FairThreadPool::new(ThreadPoolConfig::with_threads(2)).unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let (done_tx, done_rx) = unbounded();
    let counter = Arc::clone(&calls);
    pool.add_job(Job::from_fn(
        1,
        move || {
            if counter.fetch_add(1, Ordering::SeqCst) < 3 {
                return Ok(JobStatus::Reschedule);
            }
            let _ = done_tx.send(());
            Ok(JobStatus::Complete)
        },
    ));
    done_rx.recv_timeout(WAIT).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 4);
    pool.join();
}

#[test]
fn remove_jobs_cancels_only_queued_matches() {
    let pool = FairThreadPool::new(ThreadPoolConfig::with_threads(1)).unwrap();
    let release = occupy_workers(&pool, 1);
    let log = Arc::new(Mutex::new(Vec::new()));
    let (done_tx, done_rx) = unbounded();
    for i in 0..6 {
        let id = if i % 2 == 0 { 9 } else { 3 };
        pool.add_job(recorder(i, &log, &done_tx).with_id(id));
    }
    assert_eq!(pool.pending_jobs(), 6);
    assert_eq!(pool.remove_jobs(9), 3);
    assert_eq!(pool.remove_jobs(9), 0);
    assert_eq!(pool.pending_jobs(), 3);

    drop(release);
    for _ in 0..3 {
        done_rx.recv_timeout(WAIT).unwrap();
    }
    let mut ran = log.lock().unwrap().clone();
    ran.sort_unstable();
    assert_eq!(ran, vec![1, 3, 5]);
    pool.join();
}

#[test]
fn failing_job_reports_and_worker_is_replaced() {
    init_tracing_for_tests();
    let pool = FairThreadPool::new(ThreadPoolConfig::with_threads(1)).unwrap();
    let (reply_tx, reply_rx) = unbounded();

    pool.add_job(
        Job::from_fn(1, || Err(Error::Internal("disk on fire".into())))
            .with_step(77, 3)
            .with_reply(reply_tx.clone()),
    );
    let failure = reply_rx.recv_timeout(WAIT).unwrap();
    assert_eq!((failure.unique_id, failure.step_id), (77, 3));
    assert!(failure.message.contains("disk on fire"));
    assert_eq!(pool.thread_counts().high, 0);

    pool.add_job(
        Job::from_fn(1, || panic!("boom"))
            .with_step(78, 4)
            .with_reply(reply_tx),
    );
    let failure = reply_rx.recv_timeout(WAIT).unwrap();
    assert_eq!(failure.unique_id, 78);
    assert_eq!(failure.message, "boom");

    // The next submission restores the baseline worker.
    let (done_tx, done_rx) = unbounded();
    pool.add_job(Job::from_fn(
        2,
        move || {
            let _ = done_tx.send(());
            Ok(JobStatus::Complete)
        },
    ));
    done_rx.recv_timeout(WAIT).unwrap();
    assert_eq!(
        pool.thread_counts(),
        ThreadCounts {
            high: 1,
            ..ThreadCounts::default()
        }
    );
    pool.join();
}

#[test]
fn blocked_workers_are_compensated_by_extra_threads() {
    init_tracing_for_tests();
    let pool = FairThreadPool::new(ThreadPoolConfig::with_threads(1)).unwrap();
    let release = occupy_workers(&pool, 1);

    // The only baseline worker is stuck; pretend it is blocked downstream.
    let guard = pool.blocked_guard();
    assert_eq!(pool.blocked_thread_count(), 1);
    let (done_tx, done_rx) = unbounded();
    let done = done_tx.clone();
    pool.add_job(Job::from_fn(
        1,
        move || {
            let _ = done.send(());
            Ok(JobStatus::Complete)
        },
    ));
    done_rx.recv_timeout(WAIT).unwrap();
    assert_eq!(pool.thread_counts().extra, 1);

    drop(guard);
    assert_eq!(pool.blocked_thread_count(), 0);
    pool.add_job(Job::from_fn(
        1,
        move || {
            let _ = done_tx.send(());
            Ok(JobStatus::Complete)
        },
    ));
    done_rx.recv_timeout(WAIT).unwrap();
    wait_for(|| pool.thread_counts().extra == 0);

    drop(release);
    pool.join();
}

#[test]
fn stop_leaves_queued_jobs_unrun() {
    let pool = FairThreadPool::new(ThreadPoolConfig::with_threads(1)).unwrap();
    let release = occupy_workers(&pool, 1);
    let ran = Arc::new(AtomicUsize::new(0));
    for _ in 0..5 {
        let ran = Arc::clone(&ran);
        pool.add_job(Job::from_fn(
            1,
            move || {
                ran.fetch_add(1, Ordering::SeqCst);
                Ok(JobStatus::Complete)
            },
        ));
    }
    pool.stop();
    drop(release);
    pool.join();
    assert_eq!(ran.load(Ordering::SeqCst), 0);
    assert_eq!(pool.pending_jobs(), 5);
}
