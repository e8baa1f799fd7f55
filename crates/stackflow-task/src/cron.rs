//! Scheduled tasks
//!
//! A scheduled task wraps a zero-argument worker behind an HTTP
//! trigger. Schedulers fire against every tier, so on a process that is
//! not a receiver the trigger resolves to a not-found outcome instead
//! of an error; only the worker tier actually runs the job.

use crate::error::{Result, TaskError};
use crate::registry::Worker;
use serde_json::Map;
use stackflow_cloud::Notifier;
use std::sync::Arc;
use uuid::Uuid;

/// What a scheduled trigger resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CronOutcome {
    /// Not a receiver tier; respond as if the route does not exist.
    NotFound,

    /// The job ran to completion.
    Complete,
}

pub struct ScheduledTask {
    name: String,
    worker: Arc<dyn Worker>,
}

impl ScheduledTask {
    pub fn new(name: impl Into<String>, worker: Arc<dyn Worker>) -> Self {
        Self {
            name: name.into(),
            worker,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn run(&self, receiver: bool, notifier: &dyn Notifier) -> Result<CronOutcome> {
        if !receiver {
            return Ok(CronOutcome::NotFound);
        }

        let run_id = Uuid::new_v4();
        notifier.notify(&format!("Launch Cron: {} {run_id}", self.name));

        self.worker
            .call(&[], &Map::new())
            .await
            .map_err(|source| TaskError::WorkerFailed {
                worker_key: self.name.clone(),
                source,
            })?;

        notifier.notify(&format!("Complete Cron: {} {run_id}", self.name));
        Ok(CronOutcome::Complete)
    }
}
