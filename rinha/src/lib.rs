#![doc = include_str!("../README.md")]

pub mod aggregator;
pub mod executor;
pub mod payload;
pub mod scenarios;
pub mod scheduler;
pub mod validator;
pub mod worker;

mod error;

pub use aggregator::Aggregator;
pub use error::Error;
pub use executor::{Executor, Response};
pub use scenarios::{ScenarioBody, ScenarioRegistry};
pub use scheduler::{ScenarioHandle, ScenarioState, Scheduler, Shutdown};
pub use worker::{RunContext, Worker};

pub use rinha_core as core;

pub mod prelude {
    pub use crate::scenarios::{ScenarioBody, ScenarioRegistry};
    pub use crate::scheduler::{Scheduler, Shutdown};
    pub use crate::worker::{RunContext, Worker};
    pub use crate::{Aggregator, Error, Executor};
    pub use rinha_core::{
        ClientSeed, ConcurrencyPlan, HarnessConfig, RunStatistics, ScenarioConfig, Stage,
    };
}
