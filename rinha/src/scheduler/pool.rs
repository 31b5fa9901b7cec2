use crate::scenarios::ScenarioBody;
use crate::scheduler::Shutdown;
use crate::{RunContext, Worker};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
#[allow(unused)]
use tracing::{debug, error, info, trace, warn, Instrument};

/// Live workers of one scenario.
///
/// Shrinking never aborts a worker: it is flagged to retire and exits once its
/// current iteration finishes. Growing reclaims retiring workers that are still
/// running before spawning new ones, so the live population never exceeds the
/// latest target.
pub(crate) struct WorkerPool {
    scenario: Arc<str>,
    body: ScenarioBody,
    ctx: Arc<RunContext>,
    shutdown: Shutdown,
    tasks: Vec<WorkerTask>,
    retiring: Vec<WorkerTask>,
    next_id: usize,
    peak: usize,
    atomics: Arc<PoolAtomics>,
}

struct WorkerTask {
    retire: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct PoolAtomics {
    iterations: AtomicU64,
    transport_failures: AtomicU64,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PoolStatistics {
    pub iterations: u64,
    pub transport_failures: u64,
    pub peak_workers: usize,
    pub abandoned: usize,
}

impl WorkerPool {
    pub fn new(
        scenario: &str,
        body: ScenarioBody,
        ctx: Arc<RunContext>,
        shutdown: Shutdown,
    ) -> Self {
        Self {
            scenario: scenario.into(),
            body,
            ctx,
            shutdown,
            tasks: vec![],
            retiring: vec![],
            next_id: 1,
            peak: 0,
            atomics: Arc::new(PoolAtomics::default()),
        }
    }

    pub fn concurrency(&self) -> usize {
        self.tasks.len()
    }

    /// Workers still running, including retiring ones finishing an iteration.
    pub fn live(&self) -> usize {
        self.tasks.len() + self.retiring.len()
    }

    /// Grow or shrink toward `concurrency` workers which loop until retired.
    pub fn set_concurrency(&mut self, concurrency: usize) {
        self.tasks.retain(|task| !task.handle.is_finished());
        self.retiring.retain(|task| !task.handle.is_finished());

        if self.tasks.len() > concurrency {
            trace!("Retiring {} workers", self.tasks.len() - concurrency);
            for task in self.tasks.drain(concurrency..) {
                task.retire.store(true, Ordering::Release);
                self.retiring.push(task);
            }
        } else {
            while self.tasks.len() < concurrency {
                match self.retiring.pop() {
                    Some(task) => {
                        task.retire.store(false, Ordering::Release);
                        self.tasks.push(task);
                    }
                    None => self.spawn(None),
                }
            }
        }

        self.peak = self.peak.max(self.live());
    }

    /// Spawn `workers` workers which stop by themselves after `iterations`.
    pub fn spawn_fixed(&mut self, workers: usize, iterations: u64) {
        for _ in 0..workers {
            self.spawn(Some(iterations));
        }
    }

    fn spawn(&mut self, iterations: Option<u64>) {
        let worker = Worker::new(self.scenario.clone(), self.next_id, self.ctx.clone());
        self.next_id += 1;

        let retire = Arc::new(AtomicBool::new(false));
        let handle = tokio::spawn(
            worker_loop(
                worker,
                self.body.clone(),
                iterations,
                retire.clone(),
                self.shutdown.clone(),
                self.atomics.clone(),
            )
            .in_current_span(),
        );

        self.tasks.push(WorkerTask { retire, handle });
        self.peak = self.peak.max(self.live());
    }

    /// Wait for every worker to exit by itself.
    pub async fn join(self) -> PoolStatistics {
        self.stop(None).await
    }

    /// Retire every worker, then wait up to `grace` before abandoning stragglers.
    pub async fn retire_all(mut self, grace: Duration) -> PoolStatistics {
        self.set_concurrency(0);
        self.stop(Some(grace)).await
    }

    async fn stop(mut self, grace: Option<Duration>) -> PoolStatistics {
        let deadline = grace.map(|grace| Instant::now() + grace);
        let handles = self
            .tasks
            .drain(..)
            .chain(self.retiring.drain(..))
            .map(|task| task.handle);

        let mut abandoned = 0;
        for mut handle in handles {
            let res = match deadline {
                Some(deadline) => match tokio::time::timeout_at(deadline, &mut handle).await {
                    Ok(res) => res,
                    Err(_) => {
                        handle.abort();
                        abandoned += 1;
                        continue;
                    }
                },
                None => handle.await,
            };

            if let Err(err) = res {
                error!("Worker of {} ended abnormally: {err}", self.scenario);
            }
        }

        if abandoned > 0 {
            warn!("Abandoned {abandoned} in-flight workers of {}", self.scenario);
        }

        PoolStatistics {
            iterations: self.atomics.iterations.load(Ordering::Relaxed),
            transport_failures: self.atomics.transport_failures.load(Ordering::Relaxed),
            peak_workers: self.peak,
            abandoned,
        }
    }
}

async fn worker_loop(
    mut worker: Worker,
    body: ScenarioBody,
    iterations: Option<u64>,
    retire: Arc<AtomicBool>,
    shutdown: Shutdown,
    atomics: Arc<PoolAtomics>,
) {
    loop {
        if retire.load(Ordering::Acquire) || shutdown.is_triggered() {
            break;
        }
        if iterations.is_some_and(|limit| worker.iteration() >= limit) {
            break;
        }

        if let Err(err) = body(worker.clone()).await {
            if err.is_transport() {
                atomics.transport_failures.fetch_add(1, Ordering::Relaxed);
            }
            warn!(
                worker = worker.id(),
                iteration = worker.iteration(),
                "Iteration aborted: {err}"
            );
            worker.check("request completed", false);
        }

        atomics.iterations.fetch_add(1, Ordering::Relaxed);
        worker.next_iteration();
    }
}
