//! Declarative deployment stack model
//!
//! A stack file describes one deployment target: the application id,
//! the delta (environment slot) and tag (version label), and the cloud
//! resources the deployment owns. Every field a resource can infer is
//! optional here; `resolve` fills the gaps deterministically.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Sparse deployment configuration, as loaded from a stack file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StackConfig {
    /// Application identifier (also the application-platform app name)
    pub app_id: Option<String>,

    /// Deployment slot, e.g. "staging" or "prod"
    pub deployment_delta: Option<String>,

    /// Version label for this deployment
    pub deployment_tag: Option<String>,

    /// Target region, or "local" for a no-op deployment
    pub deployment_region: Option<String>,

    /// Bucket holding per-deployment secrets files
    pub secrets_bucket: Option<String>,

    /// Application-platform solution stack name
    pub solution_stack_name: Option<String>,

    /// Relational database restored from a snapshot
    pub rds: Option<DatabaseSpec>,

    #[serde(default)]
    pub buckets: Vec<BucketSpec>,

    #[serde(default)]
    pub queues: Vec<QueueSpec>,

    #[serde(default)]
    pub topics: Vec<TopicSpec>,

    /// Settings shared by both application tiers
    pub tier_defaults: Option<TierSettings>,

    /// Web application tier
    pub web: Option<TierSpec>,

    /// Worker application tier (receives async task messages)
    pub worker: Option<TierSpec>,

    /// Free-form environment-variable overrides
    #[serde(default)]
    pub environment: BTreeMap<String, String>,
}

/// Database restored from an existing snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSpec {
    pub snapshot_name: String,
    pub db_instance_type: String,
    #[serde(default)]
    pub security_groups: Vec<String>,
}

/// Object-storage bucket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BucketSpec {
    /// Short suffix combined with the deployment name to form the full name
    pub nametip: String,

    /// Environment variable that will carry the resolved name
    pub setting_name: String,

    /// Full name override; defaults to `{deployment_name}-{nametip}`
    pub name: Option<String>,

    /// Region override; defaults to the deployment region
    pub region: Option<String>,

    /// Permanent resources survive `down`
    #[serde(default)]
    pub permanent: bool,

    /// Attach the default CORS rules
    #[serde(default)]
    pub cors: bool,
}

/// Message queue, optionally with a dead-letter queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueSpec {
    pub nametip: String,
    pub setting_name: String,
    pub name: Option<String>,
    pub region: Option<String>,
    #[serde(default)]
    pub permanent: bool,

    /// Delivery attempts before a message is redriven to the DLQ
    pub max_receive_count: Option<i32>,

    /// Nested queue spec; provisioned before this queue, destroyed after
    pub dead_letter_queue: Option<Box<QueueSpec>>,
}

/// Pub/sub topic with its subscriptions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicSpec {
    pub nametip: String,
    pub setting_name: String,
    pub name: Option<String>,
    pub region: Option<String>,
    #[serde(default)]
    pub permanent: bool,

    #[serde(default)]
    pub subscriptions: Vec<SubscriptionSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionSpec {
    /// Delivery protocol, e.g. "email" or "https"
    pub protocol: String,
    pub endpoint: String,
}

/// An application tier: tier-wide defaults merged with these overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierSpec {
    pub nametip: String,

    #[serde(flatten)]
    pub settings: TierSettings,
}

/// Application-tier settings. Every field is optional so the same shape
/// serves as tier-wide defaults and as per-tier overrides; the merge of
/// the two must leave nothing unset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TierSettings {
    pub service_role: Option<String>,
    pub ssh_key_name: Option<String>,
    pub instance_type: Option<String>,
    pub security_groups: Option<Vec<String>>,
    pub healthcheck_url: Option<String>,
    pub num_processes: Option<u32>,
    pub num_threads: Option<u32>,
    pub wsgi_path: Option<String>,
    pub minimum_instance_count: Option<u32>,
    pub maximum_instance_count: Option<u32>,

    /// HTTP path the worker tier receives task messages on
    pub receive_path: Option<String>,
}

impl TierSettings {
    /// Merge tier-specific settings over tier-wide defaults.
    /// A value set on the tier wins.
    pub fn merged_over(&self, defaults: &TierSettings) -> TierSettings {
        TierSettings {
            service_role: self.service_role.clone().or_else(|| defaults.service_role.clone()),
            ssh_key_name: self.ssh_key_name.clone().or_else(|| defaults.ssh_key_name.clone()),
            instance_type: self.instance_type.clone().or_else(|| defaults.instance_type.clone()),
            security_groups: self
                .security_groups
                .clone()
                .or_else(|| defaults.security_groups.clone()),
            healthcheck_url: self
                .healthcheck_url
                .clone()
                .or_else(|| defaults.healthcheck_url.clone()),
            num_processes: self.num_processes.or(defaults.num_processes),
            num_threads: self.num_threads.or(defaults.num_threads),
            wsgi_path: self.wsgi_path.clone().or_else(|| defaults.wsgi_path.clone()),
            minimum_instance_count: self.minimum_instance_count.or(defaults.minimum_instance_count),
            maximum_instance_count: self.maximum_instance_count.or(defaults.maximum_instance_count),
            receive_path: self.receive_path.clone().or_else(|| defaults.receive_path.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stack_file_yaml_round_trips() {
        let yaml = r#"
app_id: acme
deployment_delta: staging
deployment_tag: v12
deployment_region: us-west-2
queues:
  - nametip: task-mq
    setting_name: TASK_QUEUE_NAME
    dead_letter_queue:
      nametip: task-dlq
      setting_name: TASK_DLQ_NAME
      max_receive_count: 5
topics:
  - nametip: audit
    setting_name: AUDIT_TOPIC_NAME
    subscriptions:
      - protocol: email
        endpoint: ops@example.com
environment:
  FEATURE_FLAG: "on"
"#;
        let config: StackConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.app_id.as_deref(), Some("acme"));
        assert_eq!(config.queues.len(), 1);
        let dlq = config.queues[0].dead_letter_queue.as_ref().unwrap();
        assert_eq!(dlq.nametip, "task-dlq");
        assert_eq!(dlq.max_receive_count, Some(5));
        assert_eq!(config.topics[0].subscriptions[0].protocol, "email");
        assert_eq!(config.environment.get("FEATURE_FLAG").unwrap(), "on");
    }

    #[test]
    fn unset_tier_fields_fall_back_to_defaults() {
        let defaults = TierSettings {
            instance_type: Some("t3.micro".into()),
            num_processes: Some(2),
            ..Default::default()
        };
        let tier = TierSettings {
            num_processes: Some(4),
            ..Default::default()
        };

        let merged = tier.merged_over(&defaults);
        assert_eq!(merged.instance_type.as_deref(), Some("t3.micro"));
        assert_eq!(merged.num_processes, Some(4));
    }
}
