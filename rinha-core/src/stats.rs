use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Logical endpoint a latency sample belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Endpoint {
    Transactions,
    Statement,
}

impl Endpoint {
    pub const ALL: [Endpoint; 2] = [Endpoint::Transactions, Endpoint::Statement];

    /// Route template as it appears in reports.
    pub fn route(&self) -> &'static str {
        match self {
            Endpoint::Transactions => "/clientes/:id/transacoes",
            Endpoint::Statement => "/clientes/:id/extrato",
        }
    }

    pub fn metric_name(&self) -> &'static str {
        match self {
            Endpoint::Transactions => "rinha.transacoes.duration",
            Endpoint::Statement => "rinha.extrato.duration",
        }
    }

    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.route())
    }
}

/// Latency statistics for one endpoint, in milliseconds.
///
/// All fields are zero when no sample was recorded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct EndpointSummary {
    pub avg: f64,
    pub min: f64,
    pub max: f64,
    pub p95: f64,
    pub count: usize,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Summary {
    #[serde(rename = "/clientes/:id/transacoes")]
    pub transactions: EndpointSummary,
    #[serde(rename = "/clientes/:id/extrato")]
    pub statement: EndpointSummary,
}

impl Summary {
    pub fn get(&self, endpoint: Endpoint) -> &EndpointSummary {
        match endpoint {
            Endpoint::Transactions => &self.transactions,
            Endpoint::Statement => &self.statement,
        }
    }

    pub fn get_mut(&mut self, endpoint: Endpoint) -> &mut EndpointSummary {
        match endpoint {
            Endpoint::Transactions => &mut self.transactions,
            Endpoint::Statement => &mut self.statement,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CheckCount {
    pub passed: u64,
    pub failed: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CheckSummary {
    pub passed: u64,
    pub failed: u64,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub by_name: BTreeMap<String, CheckCount>,
}

impl CheckSummary {
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

/// Outcome of one scheduled scenario.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScenarioStatistics {
    pub name: String,
    pub iterations: u64,
    pub transport_failures: u64,
    pub peak_workers: usize,
    pub elapsed: Duration,
}

impl fmt::Display for ScenarioStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: iterations={}, transport_failures={}, peak_workers={}, elapsed={}",
            self.name,
            self.iterations,
            self.transport_failures,
            self.peak_workers,
            humantime::format_duration(Duration::from_millis(self.elapsed.as_millis() as u64)),
        )
    }
}

/// Everything a finished run produced.
#[derive(Clone, Debug, Default)]
pub struct RunStatistics {
    pub scenarios: Vec<ScenarioStatistics>,
    pub summary: Summary,
    pub checks: CheckSummary,
}

impl RunStatistics {
    pub fn scenario(&self, name: &str) -> Option<&ScenarioStatistics> {
        self.scenarios.iter().find(|s| s.name == name)
    }
}
