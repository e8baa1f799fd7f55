use thiserror::Error;

/// Lifecycle orchestration errors.
///
/// Driver errors pass through transparently so the message a caller
/// sees is the originating service error, not a wrapper around it.
#[derive(Error, Debug)]
pub enum DeployError {
    #[error(transparent)]
    Cloud(#[from] stackflow_cloud::CloudError),

    #[error(transparent)]
    Config(#[from] stackflow_core::ConfigError),

    #[error("solution_stack_name is required when a web or worker tier is configured")]
    MissingSolutionStack,

    #[error("the worker tier requires a receive_path")]
    MissingReceivePath,
}

pub type Result<T> = std::result::Result<T, DeployError>;
