//! Resource driver traits
//!
//! One trait per resource kind. Every operation is idempotent: "ensure"
//! treats an already-existing resource as success and "destroy" treats
//! an already-absent one as success, so the orchestrator can re-run a
//! failed lifecycle without tracking partial state.

use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

/// Object-storage buckets.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Create the bucket if absent; apply the policy and CORS rules when given.
    async fn ensure_bucket(
        &self,
        name: &str,
        region: &str,
        policy: Option<&Value>,
        cors: bool,
    ) -> Result<()>;

    /// Drain and delete the bucket; absent buckets are not an error.
    async fn destroy_bucket(&self, name: &str) -> Result<()>;

    /// Region the bucket lives in, or None when it does not exist.
    async fn bucket_region(&self, name: &str) -> Result<Option<String>>;

    /// Upload a local file under the given key.
    async fn upload_file(&self, path: &Path, bucket: &str, key: &str) -> Result<()>;
}

/// Message queues.
#[async_trait]
pub trait MessageQueue: Send + Sync {
    /// Create the queue if absent, with optional access and redrive policies
    /// (both serialized policy documents).
    async fn ensure_queue(
        &self,
        name: &str,
        region: &str,
        queue_policy: Option<&Value>,
        redrive_policy: Option<&Value>,
    ) -> Result<()>;

    /// Delete the queue; absent queues are not an error.
    async fn destroy_queue(&self, name: &str, region: &str) -> Result<()>;

    /// Send one message body, optionally delayed.
    async fn send_message(&self, queue_url: &str, body: &str, delay_seconds: u32) -> Result<()>;
}

/// Pub/sub topics and subscriptions.
#[async_trait]
pub trait PubSub: Send + Sync {
    /// Create the topic if absent; returns its address (ARN).
    async fn ensure_topic(&self, name: &str, region: &str) -> Result<String>;

    /// Remove every subscription, then the topic; absent topics are not an error.
    async fn destroy_topic(&self, name: &str, region: &str, account_id: &str) -> Result<()>;

    /// Subscribe an endpoint to the topic.
    async fn subscribe(&self, topic_arn: &str, protocol: &str, endpoint: &str) -> Result<()>;

    /// Publish a message with a subject line.
    async fn publish(&self, topic_arn: &str, subject: &str, message: &str) -> Result<()>;
}

/// Relational database instances.
#[async_trait]
pub trait Database: Send + Sync {
    async fn restore_from_snapshot(
        &self,
        region: &str,
        instance_id: &str,
        snapshot_id: &str,
        instance_class: &str,
    ) -> Result<()>;

    async fn delete_instance(&self, region: &str, instance_id: &str) -> Result<()>;

    /// Current lifecycle status string, e.g. "creating" or "available".
    async fn instance_status(&self, region: &str, instance_id: &str) -> Result<String>;

    async fn modify_security_groups(
        &self,
        region: &str,
        instance_id: &str,
        group_ids: &[String],
    ) -> Result<()>;
}

/// IAM roles and instance profiles.
#[async_trait]
pub trait Identity: Send + Sync {
    /// Create the role if absent and (re)attach the inline policy.
    async fn ensure_role(
        &self,
        role_name: &str,
        policy_name: &str,
        policy_document: &Value,
        trust_policy: &Value,
    ) -> Result<()>;

    /// Delete inline policies then the role; absent roles are not an error.
    async fn destroy_role(&self, role_name: &str) -> Result<()>;

    /// Create the profile if absent and attach the role to a fresh profile.
    /// Attaching to an already-existing profile is success, not failure.
    async fn ensure_instance_profile(&self, profile_name: &str, role_name: &str) -> Result<()>;

    /// Detach roles then delete the profile; absent profiles are not an error.
    async fn destroy_instance_profile(&self, profile_name: &str) -> Result<()>;

    /// Account id of the active credentials.
    async fn account_id(&self) -> Result<String>;
}

/// Option setting for an application-tier environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionSetting {
    pub namespace: String,
    pub option_name: String,
    pub value: String,
}

/// Managed application-server environments.
#[async_trait]
pub trait AppPlatform: Send + Sync {
    /// Package the current source checkout, upload it, and register it
    /// as an application version. Returns nothing; the version label is
    /// chosen by the caller.
    async fn upload_source_bundle(
        &self,
        region: &str,
        app_id: &str,
        source_bucket: &str,
        version_label: &str,
    ) -> Result<()>;

    async fn create_environment(
        &self,
        region: &str,
        app_id: &str,
        env_name: &str,
        version_label: &str,
        stack_name: &str,
        option_settings: &[OptionSetting],
        worker_tier: bool,
    ) -> Result<()>;

    /// Terminate the environment; absent environments are not an error.
    async fn destroy_environment(&self, env_name: &str, region: &str) -> Result<()>;
}

/// The full driver set a lifecycle run needs, one per resource kind.
#[derive(Clone)]
pub struct Drivers {
    pub storage: Arc<dyn ObjectStore>,
    pub queues: Arc<dyn MessageQueue>,
    pub topics: Arc<dyn PubSub>,
    pub database: Arc<dyn Database>,
    pub identity: Arc<dyn Identity>,
    pub platform: Arc<dyn AppPlatform>,
}
