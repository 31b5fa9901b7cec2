use std::collections::HashSet;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("No clients are seeded")]
    NoClients,

    #[error("Scenario `{0}` is configured more than once")]
    DuplicateScenario(String),

    #[error("Scenario `{0}` must run at least one worker")]
    NoWorkers(String),

    #[error("Scenario `{0}` must run at least one iteration per worker")]
    NoIterations(String),

    #[error("Scenario `{0}` has a ramping profile without stages")]
    NoStages(String),
}

/// A client known to exist in the target ledger before the run starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClientSeed {
    pub id: i64,
    /// Allowed negative balance, in minor units.
    pub limit: i64,
}

impl ClientSeed {
    pub const fn new(id: i64, limit: i64) -> Self {
        Self { id, limit }
    }
}

/// One step of a ramping profile: move toward `target` workers over `duration`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Stage {
    pub duration: Duration,
    pub target: usize,
}

impl Stage {
    pub const fn new(duration: Duration, target: usize) -> Self {
        Self { duration, target }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConcurrencyPlan {
    /// `workers` workers, each running exactly `iterations` iterations.
    Fixed { workers: usize, iterations: u64 },
    /// Workers loop continuously while the live population follows `stages`.
    Ramping { start: usize, stages: Vec<Stage> },
}

impl ConcurrencyPlan {
    /// Highest worker count the plan can ever ask for.
    pub fn max_workers(&self) -> usize {
        match self {
            ConcurrencyPlan::Fixed { workers, .. } => *workers,
            ConcurrencyPlan::Ramping { start, stages } => stages
                .iter()
                .map(|s| s.target)
                .chain(std::iter::once(*start))
                .max()
                .unwrap_or(*start),
        }
    }

    /// Total time spent in stages. `None` for fixed plans, which end with their workers.
    pub fn duration(&self) -> Option<Duration> {
        match self {
            ConcurrencyPlan::Fixed { .. } => None,
            ConcurrencyPlan::Ramping { stages, .. } => {
                Some(stages.iter().map(|s| s.duration).sum())
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScenarioConfig {
    pub name: String,
    pub plan: ConcurrencyPlan,
    pub start_offset: Duration,
}

impl ScenarioConfig {
    pub fn fixed(name: &str, workers: usize, iterations: u64) -> Self {
        Self {
            name: name.to_string(),
            plan: ConcurrencyPlan::Fixed {
                workers,
                iterations,
            },
            start_offset: Duration::ZERO,
        }
    }

    pub fn ramping(name: &str, start: usize, stages: &[Stage]) -> Self {
        Self {
            name: name.to_string(),
            plan: ConcurrencyPlan::Ramping {
                start,
                stages: stages.to_vec(),
            },
            start_offset: Duration::ZERO,
        }
    }

    pub fn start_offset(mut self, offset: Duration) -> Self {
        self.start_offset = offset;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match &self.plan {
            ConcurrencyPlan::Fixed { workers: 0, .. } => {
                Err(ConfigError::NoWorkers(self.name.clone()))
            }
            ConcurrencyPlan::Fixed { iterations: 0, .. } => {
                Err(ConfigError::NoIterations(self.name.clone()))
            }
            ConcurrencyPlan::Ramping { stages, .. } if stages.is_empty() => {
                Err(ConfigError::NoStages(self.name.clone()))
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for ScenarioConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (", self.name)?;
        match &self.plan {
            ConcurrencyPlan::Fixed {
                workers,
                iterations,
            } => write!(f, "{workers} workers x {iterations} iterations")?,
            ConcurrencyPlan::Ramping { start, stages } => {
                write!(f, "ramping from {start}")?;
                for stage in stages {
                    write!(
                        f,
                        " -> {} over {}",
                        stage.target,
                        humantime::format_duration(stage.duration)
                    )?;
                }
            }
        }
        write!(
            f,
            ", starts at +{})",
            humantime::format_duration(self.start_offset)
        )
    }
}

/// Everything a run needs besides the target's base URL.
#[derive(Clone, Debug)]
pub struct HarnessConfig {
    pub clients: Vec<ClientSeed>,
    pub scenarios: Vec<ScenarioConfig>,
}

impl HarnessConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.clients.is_empty() {
            return Err(ConfigError::NoClients);
        }

        let mut seen = HashSet::new();
        for scenario in &self.scenarios {
            if !seen.insert(scenario.name.as_str()) {
                return Err(ConfigError::DuplicateScenario(scenario.name.clone()));
            }
            scenario.validate()?;
        }

        Ok(())
    }

    /// Id guaranteed to be outside the seeded range.
    pub fn unknown_client_id(&self) -> i64 {
        self.clients.iter().map(|c| c.id).max().unwrap_or(0) + 1
    }
}

impl Default for HarnessConfig {
    fn default() -> Self {
        let clients = vec![
            ClientSeed::new(1, 1_000 * 100),
            ClientSeed::new(2, 800 * 100),
            ClientSeed::new(3, 10_000 * 100),
            ClientSeed::new(4, 100_000 * 100),
            ClientSeed::new(5, 5_000 * 100),
        ];

        let two_minutes = Duration::from_secs(120);
        let ten_seconds = Duration::from_secs(10);

        let scenarios = vec![
            ScenarioConfig::fixed("validacoes", clients.len(), 1),
            ScenarioConfig::fixed("cliente_nao_encontrado", 1, 1),
            ScenarioConfig::ramping(
                "debitos",
                1,
                &[Stage::new(two_minutes, 220), Stage::new(two_minutes, 220)],
            )
            .start_offset(ten_seconds),
            ScenarioConfig::ramping(
                "creditos",
                1,
                &[Stage::new(two_minutes, 110), Stage::new(two_minutes, 110)],
            )
            .start_offset(ten_seconds),
            ScenarioConfig::fixed("extratos", 10, 1).start_offset(ten_seconds),
        ];

        Self { clients, scenarios }
    }
}
