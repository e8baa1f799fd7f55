use thiserror::Error;

#[derive(Error, Debug)]
pub enum TaskError {
    /// The process is not configured as a task receiver.
    #[error("this process is not a task receiver")]
    NotReceiver,

    /// The envelope signature does not match the message bytes.
    #[error("task message signature mismatch")]
    SignatureMismatch,

    #[error("no worker registered for key '{0}'")]
    UnregisteredWorker(String),

    #[error("worker '{worker_key}' failed: {source}")]
    WorkerFailed {
        worker_key: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("malformed task envelope: {0}")]
    Decode(String),

    #[error("invalid signing secret")]
    InvalidSecret,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Cloud(#[from] stackflow_cloud::CloudError),
}

pub type Result<T> = std::result::Result<T, TaskError>;
