//! Runs every configured scenario concurrently, each following its own profile.
mod pool;
mod ramp;
mod timer;

use crate::scenarios::{ScenarioBody, ScenarioRegistry};
use crate::{Error, Executor, RunContext};
use pool::{PoolStatistics, WorkerPool};
use ramp::Ramp;
use rinha_core::{
    ConcurrencyPlan, HarnessConfig, RunStatistics, ScenarioConfig, ScenarioStatistics, Stage,
    GRACEFUL_STOP, RAMP_TICK,
};
use std::sync::Arc;
use timer::Timer;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
#[allow(unused_imports)]
use tracing::{debug, error, info, instrument, trace, warn, Instrument};

/// Lifecycle of one scenario within a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum ScenarioState {
    /// Waiting for its start offset.
    Pending,
    Running,
    Completed,
}

/// Run-level cancellation.
///
/// Once triggered no new iteration starts anywhere in the run. In-flight
/// iterations finish normally.
#[derive(Clone, Debug)]
pub struct Shutdown {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn trigger(&self) {
        if !self.tx.send_replace(true) {
            info!("Shutdown requested");
        }
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once [`Shutdown::trigger`] has been called.
    pub async fn triggered(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = rx.wait_for(|halted| *halted).await;
    }
}

pub struct Scheduler {
    ctx: Arc<RunContext>,
    scenarios: Vec<(ScenarioConfig, ScenarioBody)>,
    shutdown: Shutdown,
}

impl Scheduler {
    /// Validate `config` and resolve every scenario body before anything runs.
    pub fn new(
        config: &HarnessConfig,
        registry: &ScenarioRegistry,
        executor: Executor,
    ) -> Result<Self, Error> {
        config.validate()?;

        let scenarios = config
            .scenarios
            .iter()
            .map(|scenario| -> Result<_, Error> {
                Ok((scenario.clone(), registry.get(&scenario.name)?))
            })
            .collect::<Result<Vec<_>, Error>>()?;

        Ok(Self {
            ctx: Arc::new(RunContext::new(executor, config)),
            scenarios,
            shutdown: Shutdown::new(),
        })
    }

    pub fn context(&self) -> Arc<RunContext> {
        self.ctx.clone()
    }

    pub fn shutdown_handle(&self) -> Shutdown {
        self.shutdown.clone()
    }

    /// Start every scenario's clock. Offsets are relative to this call.
    pub fn start(self) -> Run {
        let longest = self
            .scenarios
            .iter()
            .filter_map(|(config, _)| Some(config.start_offset + config.plan.duration()?))
            .max()
            .unwrap_or_default();
        info!(
            "Starting {} scenarios, ramps end after {}",
            self.scenarios.len(),
            humantime::format_duration(longest)
        );

        let scenarios = self
            .scenarios
            .into_iter()
            .map(|(config, body)| {
                ScenarioHandle::spawn(config, body, self.ctx.clone(), self.shutdown.clone())
            })
            .collect();

        Run {
            ctx: self.ctx,
            scenarios,
            shutdown: self.shutdown,
        }
    }

    pub async fn run(self) -> RunStatistics {
        self.start().wait().await
    }
}

/// A run in progress.
pub struct Run {
    ctx: Arc<RunContext>,
    scenarios: Vec<ScenarioHandle>,
    shutdown: Shutdown,
}

impl Run {
    pub fn scenarios(&self) -> &[ScenarioHandle] {
        &self.scenarios
    }

    pub fn shutdown_handle(&self) -> Shutdown {
        self.shutdown.clone()
    }

    /// Wait for every scenario to complete and collect the results.
    pub async fn wait(self) -> RunStatistics {
        let mut scenarios = Vec::with_capacity(self.scenarios.len());
        for handle in self.scenarios {
            scenarios.push(handle.join().await);
        }

        info!("Run complete");

        RunStatistics {
            scenarios,
            summary: self.ctx.aggregator.summary(),
            checks: self.ctx.aggregator.checks(),
        }
    }
}

pub struct ScenarioHandle {
    name: String,
    state: watch::Receiver<ScenarioState>,
    task: JoinHandle<ScenarioStatistics>,
}

impl ScenarioHandle {
    fn spawn(
        config: ScenarioConfig,
        body: ScenarioBody,
        ctx: Arc<RunContext>,
        shutdown: Shutdown,
    ) -> Self {
        let (tx, state) = watch::channel(ScenarioState::Pending);
        let name = config.name.clone();
        let task = tokio::spawn(run_scenario(config, body, ctx, shutdown, tx).in_current_span());
        Self { name, state, task }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> ScenarioState {
        *self.state.borrow()
    }

    /// A receiver observing every state transition of this scenario.
    pub fn subscribe(&self) -> watch::Receiver<ScenarioState> {
        self.state.clone()
    }

    async fn join(self) -> ScenarioStatistics {
        match self.task.await {
            Ok(stats) => stats,
            Err(err) => {
                error!("Scenario {} ended abnormally: {err}", self.name);
                ScenarioStatistics {
                    name: self.name,
                    ..Default::default()
                }
            }
        }
    }
}

#[instrument(name = "scenario", skip_all, fields(name = %config.name))]
async fn run_scenario(
    config: ScenarioConfig,
    body: ScenarioBody,
    ctx: Arc<RunContext>,
    shutdown: Shutdown,
    state: watch::Sender<ScenarioState>,
) -> ScenarioStatistics {
    let mut stats = ScenarioStatistics {
        name: config.name.clone(),
        ..Default::default()
    };

    tokio::select! {
        _ = tokio::time::sleep(config.start_offset) => {}
        _ = shutdown.triggered() => {
            info!("Cancelled before start");
            state.send_replace(ScenarioState::Completed);
            return stats;
        }
    }

    state.send_replace(ScenarioState::Running);
    info!(max_workers = config.plan.max_workers(), "Running {config}");

    let start = Instant::now();
    let mut pool = WorkerPool::new(&config.name, body, ctx, shutdown.clone());

    let pool_stats = match &config.plan {
        ConcurrencyPlan::Fixed {
            workers,
            iterations,
        } => {
            pool.spawn_fixed(*workers, *iterations);
            pool.join().await
        }
        ConcurrencyPlan::Ramping { start, stages } => {
            ramp(&mut pool, *start, stages, &shutdown).await;
            pool.retire_all(GRACEFUL_STOP).await
        }
    };

    let PoolStatistics {
        iterations,
        transport_failures,
        peak_workers,
        ..
    } = pool_stats;

    stats.iterations = iterations;
    stats.transport_failures = transport_failures;
    stats.peak_workers = peak_workers;
    stats.elapsed = start.elapsed();

    state.send_replace(ScenarioState::Completed);
    info!("Scenario complete: {stats}");

    stats
}

async fn ramp(pool: &mut WorkerPool, start: usize, stages: &[Stage], shutdown: &Shutdown) {
    let ramp = Ramp::new(start, stages);
    pool.set_concurrency(start);

    let mut timer = Timer::new(RAMP_TICK).await;
    debug!("Adjusting workers every {timer}");

    loop {
        let elapsed = tokio::select! {
            elapsed = timer.tick() => elapsed,
            _ = shutdown.triggered() => break,
        };

        match ramp.target_at(elapsed) {
            Some(target) => {
                if target != pool.concurrency() {
                    trace!("Workers {} -> {target}", pool.concurrency());
                }
                pool.set_concurrency(target);
            }
            None => break,
        }
    }
}
