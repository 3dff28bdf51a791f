use crate::collector::FormError;
use crate::config::ConfigError;
use crate::pipeline::PipelineError;

/// Errors surfaced to the front end.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The process is misconfigured.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// A form was filled in wrongly.
    #[error(transparent)]
    Form(#[from] FormError),
    /// The builders team failed.
    #[error(transparent)]
    Team(#[from] quote_crew_core::Error),
    /// The road pipeline failed.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    /// Reading input failed.
    #[error("cannot read input: {0}")]
    Io(#[from] std::io::Error),
}
