use rinha_core::ConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid base URL `{url}`: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("No scenario body registered under `{0}`")]
    UnknownScenario(String),

    #[error("Transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Target {url} is unreachable: {source}")]
    Unreachable {
        url: String,
        source: reqwest::Error,
    },
}

impl Error {
    /// Errors which end an iteration rather than the run.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_))
    }
}
