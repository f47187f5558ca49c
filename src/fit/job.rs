//! Cancelable background optimization jobs.
//!
//! A job owns exactly one worker thread for its lifetime. The worker
//! runs one multi-start trial per loop iteration and republishes the
//! best feasible solution found so far. There is no suspension point
//! inside a trial, so cancellation takes effect only at trial
//! boundaries: `stop()` raises a flag the worker samples between
//! trials, then waits a grace period for voluntary exit. If the worker
//! is stuck inside a trial past the grace period it is abandoned
//! (detached) and reported — safe Rust has no way to kill a thread, and
//! the worker still exits at its next trial boundary.
//!
//! Progress counters use relaxed atomics and are safe to poll while the
//! job runs. The best (coefficients, cost) pair is published as one
//! snapshot behind a mutex, with the `found` flag released only after
//! the store, so a reader can never observe a half-updated pair.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, warn};

use crate::domain::{BestSolution, Bounds, Coefficients};
use crate::error::Error;
use crate::fit::global::run_trial;
use crate::fit::simplex::SimplexOptions;

/// Scalar cost over a coefficient vector.
pub type CostFn = dyn Fn(&[f64]) -> f64 + Send + Sync;
/// Feasibility predicate over a coefficient vector.
pub type ConstraintFn = dyn Fn(&[f64]) -> bool + Send + Sync;

/// How long `stop()` waits for the worker to exit voluntarily.
const STOP_GRACE: Duration = Duration::from_secs(10);

/// Configuration for a background job.
#[derive(Debug, Clone)]
pub struct JobConfig {
    /// Search box the random starts are drawn from.
    pub bounds: Bounds,
    /// Maximum processed-sample budget (see note on the worker loop).
    pub max_samples: usize,
    /// RNG seed; `None` draws one from entropy.
    pub seed: Option<u64>,
    /// Options forwarded to the local minimizer.
    pub simplex: SimplexOptions,
}

/// State shared between the worker thread and the owning job handle.
struct Shared {
    processed: AtomicUsize,
    max_samples: usize,
    stop_requested: AtomicBool,
    found: AtomicBool,
    best: Mutex<Option<BestSolution>>,
    finished: Mutex<bool>,
    finished_cv: Condvar,
}

impl Shared {
    fn new(max_samples: usize, finished: bool, best: Option<BestSolution>) -> Self {
        let found = best.is_some();
        Self {
            processed: AtomicUsize::new(0),
            max_samples,
            stop_requested: AtomicBool::new(false),
            found: AtomicBool::new(found),
            best: Mutex::new(best),
            finished: Mutex::new(finished),
            finished_cv: Condvar::new(),
        }
    }
}

/// Everything the worker needs to run trials; cloned into the thread.
#[derive(Clone)]
struct WorkerSpec {
    cost: Arc<CostFn>,
    constraint: Option<Arc<ConstraintFn>>,
    bounds: Bounds,
    seed: u64,
    simplex: SimplexOptions,
}

/// A cancelable, pollable background optimization job.
pub struct OptimizationJob {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
    spec: Option<WorkerSpec>,
    started: bool,
    /// Set when a `stop` grace period expired and the worker was
    /// detached; the job is treated as terminal from then on.
    abandoned: bool,
}

impl OptimizationJob {
    /// Create a job that will search `config.bounds` for the cheapest
    /// feasible coefficient vector. The job does no work until
    /// [`start`](Self::start) is called.
    pub fn new(
        cost: Arc<CostFn>,
        constraint: Option<Arc<ConstraintFn>>,
        config: JobConfig,
    ) -> Self {
        let seed = config.seed.unwrap_or_else(rand::random);
        Self {
            shared: Arc::new(Shared::new(config.max_samples, false, None)),
            worker: None,
            abandoned: false,
            spec: Some(WorkerSpec {
                cost,
                constraint,
                bounds: config.bounds,
                seed,
                simplex: config.simplex,
            }),
            started: false,
        }
    }

    /// Create a job representing a pre-known solution.
    ///
    /// The job is born terminal and solved: `start`/`stop` are
    /// bookkeeping no-ops, `is_running` is always false, and
    /// [`solution`](Self::solution) returns immediately.
    pub fn from_solution(coefficients: Coefficients) -> Self {
        let best = BestSolution {
            coefficients,
            cost: 0.0,
        };
        Self {
            shared: Arc::new(Shared::new(0, true, Some(best))),
            worker: None,
            spec: None,
            started: false,
            abandoned: false,
        }
    }

    /// Spawn the worker. Idempotent: calling `start` on a job that was
    /// already started (or on a static job) does nothing.
    pub fn start(&mut self) {
        if self.started {
            return;
        }
        let Some(spec) = self.spec.clone() else {
            // Static job: nothing to run.
            return;
        };
        let shared = Arc::clone(&self.shared);
        self.worker = Some(thread::spawn(move || worker_loop(&shared, &spec)));
        self.started = true;
    }

    /// Ask the job to quit after its current trial and wait up to the
    /// grace period for it to do so.
    ///
    /// Fails with [`Error::InvalidThread`] when the job was never
    /// started. On a static job this is a bookkeeping no-op.
    pub fn stop(&mut self) -> Result<(), Error> {
        if self.spec.is_none() {
            return Ok(());
        }
        if !self.started {
            return Err(Error::InvalidThread);
        }
        self.shared.stop_requested.store(true, Ordering::Relaxed);

        let finished = self.shared.finished.lock().unwrap();
        let (guard, timeout) = self
            .shared
            .finished_cv
            .wait_timeout_while(finished, STOP_GRACE, |done| !*done)
            .unwrap();
        drop(guard);

        if timeout.timed_out() {
            // Degraded fallback: the worker is stuck inside a trial.
            // Detach it; it will observe the stop flag at its next
            // trial boundary and exit on its own.
            warn!(
                grace_secs = STOP_GRACE.as_secs(),
                "optimization worker did not exit within the grace period; abandoning it"
            );
            self.worker = None;
            self.abandoned = true;
        } else if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
        Ok(())
    }

    /// Whether the worker is currently running.
    pub fn is_running(&self) -> bool {
        self.started && !self.abandoned && !*self.shared.finished.lock().unwrap()
    }

    /// Number of trials executed so far. Monotonically non-decreasing;
    /// safe to poll while the job runs.
    pub fn processed_samples(&self) -> usize {
        self.shared.processed.load(Ordering::Relaxed)
    }

    /// The configured sample budget.
    pub fn max_samples(&self) -> usize {
        self.shared.max_samples
    }

    /// True once at least one feasible trial has produced a result.
    pub fn has_solution(&self) -> bool {
        self.shared.found.load(Ordering::Acquire)
    }

    /// The current best (coefficients, cost) snapshot, if any.
    pub fn best(&self) -> Option<BestSolution> {
        if !self.has_solution() {
            return None;
        }
        self.shared.best.lock().unwrap().clone()
    }

    /// Wait for the job to finish (natural exhaustion or a prior
    /// `stop`), then return the best coefficients right-padded with
    /// zeros to `pad_len`.
    ///
    /// Fails with [`Error::NoSolutionFound`] when no feasible trial
    /// ever succeeded.
    pub fn solution(&mut self, pad_len: usize) -> Result<Vec<f64>, Error> {
        if self.started && !self.abandoned {
            let finished = self.shared.finished.lock().unwrap();
            let guard = self
                .shared
                .finished_cv
                .wait_while(finished, |done| !*done)
                .unwrap();
            drop(guard);
            if let Some(handle) = self.worker.take() {
                let _ = handle.join();
            }
        }

        let best = self.shared.best.lock().unwrap();
        match best.as_ref() {
            Some(solution) => Ok(solution.coefficients.padded(pad_len)),
            None => Err(Error::NoSolutionFound),
        }
    }
}

/// Marks the job finished and wakes waiters when the worker exits, on
/// any path out of the loop, including an unwind from a caller-supplied
/// closure. Without this a panicking cost function would leave
/// `solution()` blocked on the condvar forever.
struct FinishGuard<'a>(&'a Shared);

impl Drop for FinishGuard<'_> {
    fn drop(&mut self) {
        let mut finished = match self.0.finished.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *finished = true;
        self.0.finished_cv.notify_all();
    }
}

fn worker_loop(shared: &Shared, spec: &WorkerSpec) {
    let _finish = FinishGuard(shared);
    debug!(
        max_samples = shared.max_samples,
        seed = spec.seed,
        "optimization job started"
    );
    let mut rng = StdRng::seed_from_u64(spec.seed);

    // The loop runs one more trial at processed == max_samples, so a
    // budget of N executes N + 1 trials.
    while !shared.stop_requested.load(Ordering::Relaxed)
        && shared.processed.load(Ordering::Relaxed) <= shared.max_samples
    {
        // A cost or constraint closure that panics must not take the
        // worker down with it; the trial is skipped like any other
        // failed trial.
        let trial = panic::catch_unwind(AssertUnwindSafe(|| {
            run_trial(
                &mut rng,
                spec.cost.as_ref(),
                spec.constraint.as_deref(),
                &spec.bounds,
                &spec.simplex,
            )
        }))
        .unwrap_or_else(|_| {
            warn!("trial panicked; skipping it");
            None
        });
        if let Some(candidate) = trial {
            let mut best = shared.best.lock().unwrap();
            let improved = best.as_ref().is_none_or(|b| candidate.cost < b.cost);
            if improved {
                *best = Some(candidate);
            }
            drop(best);
            // Published after the snapshot store so a reader that sees
            // the flag also sees a complete pair.
            shared.found.store(true, Ordering::Release);
        }
        shared.processed.fetch_add(1, Ordering::Relaxed);
    }

    debug!(
        processed = shared.processed.load(Ordering::Relaxed),
        solved = shared.found.load(Ordering::Acquire),
        "optimization job finished"
    );
}
