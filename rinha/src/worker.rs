use crate::{Aggregator, Error, Executor, Response};
use rinha_core::{ClientSeed, HarnessConfig};
use serde::Serialize;
use std::sync::Arc;
#[allow(unused)]
use tracing::{debug, error, info, trace, warn};

/// Read-only collaborators shared by every worker of a run, plus the aggregator.
pub struct RunContext {
    pub executor: Executor,
    pub aggregator: Arc<Aggregator>,
    pub clients: Arc<[ClientSeed]>,
    pub unknown_client_id: i64,
}

impl RunContext {
    pub fn new(executor: Executor, config: &HarnessConfig) -> Self {
        Self {
            executor,
            aggregator: Arc::new(Aggregator::new()),
            clients: config.clients.clone().into(),
            unknown_client_id: config.unknown_client_id(),
        }
    }
}

/// One simulated actor, handed to a scenario body for each iteration.
#[derive(Clone)]
pub struct Worker {
    scenario: Arc<str>,
    /// 1-based, unique within its scenario.
    id: usize,
    iteration: u64,
    ctx: Arc<RunContext>,
}

impl Worker {
    pub fn new(scenario: Arc<str>, id: usize, ctx: Arc<RunContext>) -> Self {
        Self {
            scenario,
            id,
            iteration: 0,
            ctx,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    pub(crate) fn next_iteration(&mut self) {
        self.iteration += 1;
    }

    pub fn scenario(&self) -> &str {
        &self.scenario
    }

    pub fn clients(&self) -> &[ClientSeed] {
        &self.ctx.clients
    }

    /// The client this worker owns when a scenario pins one client per worker.
    pub fn assigned_client(&self) -> Option<&ClientSeed> {
        let clients = self.clients();
        if clients.is_empty() {
            None
        } else {
            clients.get(self.id.saturating_sub(1) % clients.len())
        }
    }

    pub fn unknown_client_id(&self) -> i64 {
        self.ctx.unknown_client_id
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.ctx.aggregator
    }

    pub async fn statement(&self, client_id: i64) -> Result<Response, Error> {
        let response = self.ctx.executor.statement(client_id).await?;
        self.ctx.aggregator.record(response.endpoint, response.duration);
        Ok(response)
    }

    pub async fn transaction<B>(&self, client_id: i64, body: &B) -> Result<Response, Error>
    where
        B: Serialize + ?Sized,
    {
        let response = self.ctx.executor.transaction(client_id, body).await?;
        self.ctx.aggregator.record(response.endpoint, response.duration);
        Ok(response)
    }

    pub fn check(&self, name: &str, passed: bool) -> bool {
        if !passed {
            debug!(
                scenario = %self.scenario,
                worker = self.id,
                iteration = self.iteration,
                "Check failed: {name}"
            );
        }
        self.ctx.aggregator.check(name, passed)
    }
}
