//! Worker registry
//!
//! Workers are registered under string keys at process start; a task
//! message names its worker by key. Resolution is a plain lookup that
//! fails with an unregistered-worker error, never a dynamic load.

use crate::error::{Result, TaskError};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// A callable task worker.
#[async_trait]
pub trait Worker: Send + Sync {
    async fn call(
        &self,
        args: &[Value],
        kwargs: &Map<String, Value>,
    ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Key-to-worker mapping, populated once at startup.
#[derive(Default)]
pub struct WorkerRegistry {
    workers: HashMap<String, Arc<dyn Worker>>,
}

impl WorkerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, key: impl Into<String>, worker: Arc<dyn Worker>) {
        let key = key.into();
        tracing::debug!(worker_key = %key, "worker registered");
        self.workers.insert(key, worker);
    }

    pub fn get(&self, key: &str) -> Result<Arc<dyn Worker>> {
        self.workers
            .get(key)
            .cloned()
            .ok_or_else(|| TaskError::UnregisteredWorker(key.to_string()))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.workers.contains_key(key)
    }
}
