//! Bounded worker pool with one-shot, id-tagged results
//!
//! Every job runs to completion on a pool thread and sends exactly one
//! `Result` back through a `tokio::sync::oneshot` channel. The consumer polls
//! the returned [`PendingJob`] from its tick handler; nothing blocks.
//!
//! ```ignore
//! let pool = WorkerPool::new(4)?;
//! let mut job = pool.spawn_job("render", move || render(&request));
//!
//! // In the tick handler:
//! if let JobPoll::Done(result) = job.poll() {
//!     apply(job.id(), result);
//! }
//! ```
//!
//! Jobs are never cancelled. A consumer that no longer wants a result
//! compares the job id with its current one and drops the stale result.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use tokio::sync::oneshot::{self, error::TryRecvError};
use waveline_core::config::WorkerConfig;
use waveline_core::{Result, VisualizationError};

/// Fixed-size pool that runs visualization jobs off the consumer thread
pub struct WorkerPool {
    pool: rayon::ThreadPool,
    threads: usize,
    next_id: AtomicU64,
}

impl WorkerPool {
    pub fn new(threads: usize) -> Result<Self> {
        let threads = threads.max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("waveline-worker-{}", i))
            .build()
            .map_err(|e| VisualizationError::ComputeFailure(format!("Failed to build worker pool: {}", e)))?;

        log::info!("WorkerPool started with {} threads", threads);
        Ok(Self {
            pool,
            threads,
            next_id: AtomicU64::new(1),
        })
    }

    /// Pool sized by the `workers` config section
    pub fn from_config(config: &WorkerConfig) -> Result<Self> {
        Self::new(config.threads)
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Queue `job` and return a handle to its eventual result
    ///
    /// A panic inside `job` is caught and delivered as `ComputeFailure`.
    pub fn spawn_job<T, F>(&self, label: &'static str, job: F) -> PendingJob<T>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();

        self.pool.spawn(move || {
            let start = Instant::now();
            let result = panic::catch_unwind(AssertUnwindSafe(job))
                .unwrap_or_else(|payload| Err(VisualizationError::from_panic(payload)));

            match &result {
                Ok(_) => log::debug!("{} job {} finished in {:?}", label, id, start.elapsed()),
                Err(e) => log::error!("{} job {} failed after {:?}: {}", label, id, start.elapsed(), e),
            }

            // Receiver gone means the consumer was dropped; nothing to do
            let _ = tx.send(result);
        });

        PendingJob { id, rx }
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("threads", &self.threads)
            .field("next_id", &self.next_id.load(Ordering::Relaxed))
            .finish()
    }
}

/// Outcome of polling a [`PendingJob`]
#[derive(Debug)]
pub enum JobPoll<T> {
    Pending,
    Done(Result<T>),
}

/// Handle to a job's one-shot result
#[derive(Debug)]
pub struct PendingJob<T> {
    id: u64,
    rx: oneshot::Receiver<Result<T>>,
}

impl<T> PendingJob<T> {
    /// Request id, unique per pool and increasing
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Non-blocking check for the result
    ///
    /// Returns `Done` at most once; later polls report a closed channel as
    /// a `ComputeFailure`.
    pub fn poll(&mut self) -> JobPoll<T> {
        match self.rx.try_recv() {
            Ok(result) => JobPoll::Done(result),
            Err(TryRecvError::Empty) => JobPoll::Pending,
            Err(TryRecvError::Closed) => JobPoll::Done(Err(VisualizationError::ComputeFailure(
                format!("job {} dropped its result", self.id),
            ))),
        }
    }

    /// Block until the result arrives (tests and shutdown paths only)
    pub fn wait(self) -> Result<T> {
        self.rx.blocking_recv().unwrap_or_else(|_| {
            Err(VisualizationError::ComputeFailure(format!("job {} dropped its result", self.id)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn poll_until_done<T>(job: &mut PendingJob<T>) -> Result<T> {
        for _ in 0..500 {
            if let JobPoll::Done(result) = job.poll() {
                return result;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
        panic!("job {} never finished", job.id());
    }

    #[test]
    fn test_job_result_delivered() {
        let _ = env_logger::builder().is_test(true).try_init();
        let pool = WorkerPool::new(2).unwrap();
        let mut job = pool.spawn_job("sum", || Ok((1..=10).sum::<u32>()));
        assert_eq!(poll_until_done(&mut job), Ok(55));
    }

    #[test]
    fn test_ids_increase() {
        let pool = WorkerPool::new(1).unwrap();
        let a = pool.spawn_job("a", || Ok(()));
        let b = pool.spawn_job("b", || Ok(()));
        assert!(b.id() > a.id());
        assert_eq!(a.wait(), Ok(()));
        assert_eq!(b.wait(), Ok(()));
    }

    #[test]
    fn test_panic_becomes_compute_failure() {
        let pool = WorkerPool::new(1).unwrap();
        let job = pool.spawn_job::<(), _>("explode", || panic!("kaboom"));
        assert_eq!(job.wait(), Err(VisualizationError::ComputeFailure("kaboom".into())));

        // Pool still usable afterwards
        let job = pool.spawn_job("after", || Ok(7));
        assert_eq!(job.wait(), Ok(7));
    }

    #[test]
    fn test_error_passes_through() {
        let pool = WorkerPool::new(1).unwrap();
        let job = pool.spawn_job::<(), _>("empty", || Err(VisualizationError::EmptyInput));
        assert_eq!(job.wait(), Err(VisualizationError::EmptyInput));
    }

    #[test]
    fn test_zero_threads_clamped() {
        let pool = WorkerPool::from_config(&WorkerConfig { threads: 0 }).unwrap();
        assert_eq!(pool.threads(), 1);

        let pool = WorkerPool::from_config(&WorkerConfig::default()).unwrap();
        assert_eq!(pool.threads(), 4);
    }
}
