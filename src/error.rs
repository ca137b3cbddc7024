use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A navigation that kept failing until the attempt budget ran out.
#[derive(Debug, Error)]
#[error("navigation to {target} failed after {attempts} attempt(s): {source}")]
pub struct NavigationError {
    pub target: String,
    pub attempts: u32,
    #[source]
    pub source: BoxError,
}

/// The extractor handed back a timestamp the validator cannot order.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("item {position} has an unparseable timestamp {raw:?}")]
pub struct MalformedTimestampError {
    pub position: usize,
    pub raw: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("malformed settings payload: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Anything that stops the lifecycle before it can reach the report phase.
#[derive(Debug, Error)]
pub enum LifecycleFatalError {
    #[error(transparent)]
    Navigation(#[from] NavigationError),

    #[error("front-end failure: {0:#}")]
    Frontend(anyhow::Error),

    #[error("automation session failure: {0:#}")]
    Session(anyhow::Error),
}
