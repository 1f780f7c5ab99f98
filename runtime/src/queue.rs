//! Compile/launch pipeline.
//!
//! Two pools: a fixed-size parallel compile pool (rayon) and a single
//! dedicated launch thread. The launch thread is serial on purpose: it is
//! what guarantees a total order of side effects on shared data
//! structures, so launches run in exact enqueue order no matter in which
//! order their compiles finish.
//!
//! The compiled-artifact cache and the in-flight set live under one mutex:
//! the check-and-insert on enqueue and the store on compile completion use
//! the same lock, so a fingerprint is compiled at most once even with
//! concurrent producers. Launch jobs wait on a condvar that is notified
//! once per finished compile, and a failed compile fills its cache slot
//! with the error so waiting launches fail fast instead of hanging.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::thread::JoinHandle;

use parking_lot::{Condvar, Mutex};
use tracing::{debug, trace};

use sango_ir::Fingerprint;

use crate::backend::{CodeGen, EntryPoint, Lowering};
use crate::config::EngineConfig;
use crate::error::{Error, Result, WorkerPoolSnafu};
use crate::stats::{Statistics, record_launch};
use crate::task::Task;

type Job = Box<dyn FnOnce() + Send + 'static>;

#[derive(Default)]
struct WorkerState {
    jobs: VecDeque<Job>,
    /// Jobs submitted but not yet finished (includes the one running).
    pending: usize,
    shutdown: bool,
}

#[derive(Default)]
struct WorkerShared {
    state: Mutex<WorkerState>,
    cond: Condvar,
}

/// One dedicated thread draining a FIFO job queue.
struct SerialWorker {
    shared: Arc<WorkerShared>,
    handle: Option<JoinHandle<()>>,
}

impl SerialWorker {
    fn spawn(name: &str) -> std::io::Result<Self> {
        let shared = Arc::new(WorkerShared::default());
        let worker = Arc::clone(&shared);
        let handle = std::thread::Builder::new().name(name.to_string()).spawn(move || Self::run(&worker))?;
        Ok(Self { shared, handle: Some(handle) })
    }

    fn run(shared: &WorkerShared) {
        loop {
            let job = {
                let mut state = shared.state.lock();
                loop {
                    if let Some(job) = state.jobs.pop_front() {
                        break job;
                    }
                    if state.shutdown {
                        return;
                    }
                    shared.cond.wait(&mut state);
                }
            };
            job();
            let mut state = shared.state.lock();
            state.pending -= 1;
            shared.cond.notify_all();
        }
    }

    fn submit(&self, job: Job) {
        let mut state = self.shared.state.lock();
        state.pending += 1;
        state.jobs.push_back(job);
        self.shared.cond.notify_all();
    }

    /// Block until every submitted job has finished.
    fn flush(&self) {
        let mut state = self.shared.state.lock();
        while state.pending > 0 {
            self.shared.cond.wait(&mut state);
        }
    }
}

impl Drop for SerialWorker {
    fn drop(&mut self) {
        self.shared.state.lock().shutdown = true;
        self.shared.cond.notify_all();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Outcome of a compile job, stored in the artifact cache slot.
#[derive(Clone)]
enum CompileOutcome {
    Ready(EntryPoint),
    Failed(Arc<Error>),
}

#[derive(Default)]
struct PipelineState {
    /// fingerprint -> compiled entry point (or failure). Monotonically
    /// growing, never evicted for the lifetime of the queue.
    artifacts: HashMap<Fingerprint, CompileOutcome>,
    /// Fingerprints with a compile job submitted but not yet stored.
    in_flight: HashSet<Fingerprint>,
    /// First failure observed by a launch; surfaced at synchronize().
    failure: Option<Arc<Error>>,
}

struct PipelineShared {
    state: Mutex<PipelineState>,
    compiled: Condvar,
    stats: Statistics,
}

/// The compile+launch pipeline.
pub struct ExecutionQueue {
    compile_pool: rayon::ThreadPool,
    launch_worker: SerialWorker,
    shared: Arc<PipelineShared>,
    lowering: Arc<dyn Lowering>,
    backend: Arc<dyn CodeGen>,
    /// Keeps every enqueued task alive for the lifetime of its compile and
    /// launch closures; drained on synchronize().
    retired: Vec<Arc<Task>>,
}

impl ExecutionQueue {
    pub fn new(config: &EngineConfig) -> Result<Self> {
        let compile_pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.compile_workers)
            .thread_name(|i| format!("sango-compile-{i}"))
            .build()
            .map_err(|e| WorkerPoolSnafu { reason: e.to_string() }.build())?;

        let launch_worker = SerialWorker::spawn("sango-launch")
            .map_err(|e| WorkerPoolSnafu { reason: format!("launch worker: {e}") }.build())?;

        Ok(Self {
            compile_pool,
            launch_worker,
            shared: Arc::new(PipelineShared {
                state: Mutex::new(PipelineState::default()),
                compiled: Condvar::new(),
                stats: Statistics::new(),
            }),
            lowering: Arc::clone(&config.lowering),
            backend: Arc::clone(&config.backend),
            retired: Vec::new(),
        })
    }

    pub fn statistics(&self) -> &Statistics {
        &self.shared.stats
    }

    /// Submit one task: a compile job if its fingerprint is new, and
    /// unconditionally a launch job. Launches execute in enqueue order.
    pub fn enqueue(&mut self, task: Task) {
        let task = Arc::new(task);
        let fp = task.fingerprint();

        let submit_compile = {
            let mut state = self.shared.state.lock();
            if state.artifacts.contains_key(&fp) || state.in_flight.contains(&fp) {
                false
            } else {
                state.in_flight.insert(fp);
                true
            }
        };

        if submit_compile {
            let shared = Arc::clone(&self.shared);
            let lowering = Arc::clone(&self.lowering);
            let backend = Arc::clone(&self.backend);
            let task = Arc::clone(&task);
            self.compile_pool.spawn(move || {
                trace!(fingerprint = %fp, kernel = task.kernel().name(), "compile start");
                let mut fragment = task.fragment().clone();
                lowering.lower(&mut fragment);
                let outcome = match backend.compile(task.kernel(), &fragment) {
                    Ok(entry) => CompileOutcome::Ready(entry),
                    Err(source) => {
                        CompileOutcome::Failed(Arc::new(Error::Compilation { fingerprint: fp, source }))
                    }
                };
                let mut state = shared.state.lock();
                state.in_flight.remove(&fp);
                state.artifacts.insert(fp, outcome);
                drop(state);
                shared.compiled.notify_all();
                debug!(fingerprint = %fp, "compile finished");
            });
        } else {
            trace!(fingerprint = %fp, "compile skipped, artifact cached or in flight");
        }

        let shared = Arc::clone(&self.shared);
        let launch_task = Arc::clone(&task);
        self.launch_worker.submit(Box::new(move || {
            let outcome = {
                let mut state = shared.state.lock();
                loop {
                    if let Some(outcome) = state.artifacts.get(&fp) {
                        break outcome.clone();
                    }
                    shared.compiled.wait(&mut state);
                }
            };
            match outcome {
                CompileOutcome::Ready(entry) => {
                    let kind = launch_task.kind();
                    trace!(fingerprint = %fp, kind = kind.name(), "launch");
                    entry(launch_task.context());
                    record_launch(&shared.stats, &kind);
                }
                CompileOutcome::Failed(error) => {
                    debug!(fingerprint = %fp, %error, "launch skipped, compile failed");
                    let mut state = shared.state.lock();
                    state.failure.get_or_insert(error);
                }
            }
        }));

        self.retired.push(task);
    }

    /// Block until the launch worker drains. Every drained launch has
    /// already waited for its own compile, so no separate compile barrier
    /// is needed. Surfaces the first compilation failure, if any.
    pub fn synchronize(&mut self) -> Result<()> {
        self.launch_worker.flush();
        self.retired.clear();
        let failure = self.shared.state.lock().failure.take();
        match failure {
            Some(error) => Err((*error).clone()),
            None => Ok(()),
        }
    }
}
