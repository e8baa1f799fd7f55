//! Config expander
//!
//! `resolve` turns a sparse [`StackConfig`] into a fully defaulted
//! [`ResolvedPlan`]. The transform is pure: it never mutates its input,
//! takes the account id as an explicit argument, and the same inputs
//! always produce the same plan. Resolved resource names are
//! deterministic functions of the deployment name and each nametip, so
//! provisioning can be re-run safely against the same plan.

use crate::env::{ENVIRONMENT_NAMES_VAR, RDS_INSTANCE_IDENTIFIER_VAR};
use crate::error::{ConfigError, Result};
use crate::model::{
    BucketSpec, DatabaseSpec, QueueSpec, StackConfig, SubscriptionSpec, TierSettings, TierSpec,
    TopicSpec,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Fully resolved deployment plan. Immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResolvedPlan {
    pub app_id: String,
    pub deployment_delta: String,
    pub deployment_tag: String,
    pub deployment_region: String,

    /// `{app_id}-{delta}-{tag}`
    pub deployment_name: String,
    pub account_id: String,

    pub secrets_bucket: Option<String>,
    pub solution_stack_name: Option<String>,

    pub role_name: String,
    pub instance_profile_name: String,

    pub rds: Option<DatabaseSpec>,
    pub buckets: Vec<ResolvedBucket>,
    pub queues: Vec<ResolvedQueue>,
    pub topics: Vec<ResolvedTopic>,

    pub web: Option<ResolvedTier>,
    pub worker: Option<ResolvedTier>,

    /// One entry per named resource (`setting_name -> resolved name`),
    /// free-form overrides, and the setting-name manifest.
    pub environment: BTreeMap<String, String>,
}

impl ResolvedPlan {
    /// True when the deployment targets the pseudo-region "local";
    /// lifecycle operations are no-ops there.
    pub fn is_local(&self) -> bool {
        self.deployment_region == "local"
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResolvedBucket {
    pub name: String,
    pub region: String,
    pub name_camel: String,
    pub setting_name: String,
    pub permanent: bool,
    pub cors: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResolvedQueue {
    pub name: String,
    pub region: String,
    pub name_camel: String,
    pub setting_name: String,
    pub permanent: bool,

    /// Redrive threshold applied to the parent when this is a DLQ
    pub max_receive_count: i32,

    /// Always resolved before the parent queue so the parent's redrive
    /// policy can reference the resolved DLQ name.
    pub dead_letter_queue: Option<Box<ResolvedQueue>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResolvedTopic {
    pub name: String,
    pub region: String,
    pub name_camel: String,
    pub setting_name: String,
    pub permanent: bool,
    pub subscriptions: Vec<SubscriptionSpec>,
}

/// An application tier with every setting present.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResolvedTier {
    /// `{deployment_name}-{nametip}`
    pub env_name: String,
    pub service_role: String,
    pub ssh_key_name: String,
    pub instance_type: String,
    pub security_groups: Vec<String>,
    pub healthcheck_url: String,
    pub num_processes: u32,
    pub num_threads: u32,
    pub wsgi_path: String,
    pub minimum_instance_count: u32,
    pub maximum_instance_count: u32,
    pub receive_path: Option<String>,
}

/// Expand a sparse config into a resolved plan.
///
/// Fails only when a required top-level field is absent or a requested
/// tier is missing a setting after the defaults merge; no provisioning
/// happens before this returns.
pub fn resolve(config: &StackConfig, account_id: &str) -> Result<ResolvedPlan> {
    let app_id = require(config.app_id.as_deref(), "app_id")?;
    let deployment_delta = require(config.deployment_delta.as_deref(), "deployment_delta")?;
    let deployment_tag = require(config.deployment_tag.as_deref(), "deployment_tag")?;
    let deployment_region = require(config.deployment_region.as_deref(), "deployment_region")?;

    let deployment_name = format!("{app_id}-{deployment_delta}-{deployment_tag}");
    tracing::debug!(deployment_name, "resolving stack config");

    let mut environment = config.environment.clone();

    if config.rds.is_some() {
        environment.insert(
            RDS_INSTANCE_IDENTIFIER_VAR.to_string(),
            deployment_name.clone(),
        );
    }

    let buckets = config
        .buckets
        .iter()
        .map(|b| resolve_bucket(b, &deployment_name, deployment_region, &mut environment))
        .collect();

    let queues = config
        .queues
        .iter()
        .map(|q| resolve_queue(q, &deployment_name, deployment_region, &mut environment))
        .collect();

    let topics = config
        .topics
        .iter()
        .map(|t| resolve_topic(t, &deployment_name, deployment_region, &mut environment))
        .collect();

    let defaults = config.tier_defaults.clone().unwrap_or_default();
    let web = config
        .web
        .as_ref()
        .map(|t| resolve_tier(t, &defaults, &deployment_name, "web"))
        .transpose()?;
    let worker = config
        .worker
        .as_ref()
        .map(|t| resolve_tier(t, &defaults, &deployment_name, "worker"))
        .transpose()?;

    // The manifest lists every setting name registered so far; a worker
    // process reconstructs its configuration from exactly this list.
    let manifest = environment.keys().cloned().collect::<Vec<_>>().join(",");
    environment.insert(ENVIRONMENT_NAMES_VAR.to_string(), manifest);

    Ok(ResolvedPlan {
        app_id: app_id.to_string(),
        deployment_delta: deployment_delta.to_string(),
        deployment_tag: deployment_tag.to_string(),
        deployment_region: deployment_region.to_string(),
        role_name: format!("{deployment_name}-ec2-role"),
        instance_profile_name: format!("{deployment_name}-ec2-instance-profile"),
        deployment_name,
        account_id: account_id.to_string(),
        secrets_bucket: config.secrets_bucket.clone(),
        solution_stack_name: config.solution_stack_name.clone(),
        rds: config.rds.clone(),
        buckets,
        queues,
        topics,
        web,
        worker,
        environment,
    })
}

fn require<'a>(value: Option<&'a str>, field: &'static str) -> Result<&'a str> {
    value.ok_or(ConfigError::MissingField(field))
}

/// Camel-case a resolved resource name for use as a policy statement id:
/// `x-d-t-jobs` becomes `XDTJobs`.
pub fn camel_identifier(name: &str) -> String {
    name.split('-')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect()
}

fn resolve_name(name: Option<&str>, nametip: &str, deployment_name: &str) -> String {
    match name {
        Some(n) => n.to_string(),
        None => format!("{deployment_name}-{nametip}"),
    }
}

fn resolve_region(region: Option<&str>, deployment_region: &str) -> String {
    region.unwrap_or(deployment_region).to_string()
}

fn resolve_bucket(
    spec: &BucketSpec,
    deployment_name: &str,
    deployment_region: &str,
    environment: &mut BTreeMap<String, String>,
) -> ResolvedBucket {
    let name = resolve_name(spec.name.as_deref(), &spec.nametip, deployment_name);
    environment.insert(spec.setting_name.clone(), name.clone());
    ResolvedBucket {
        name_camel: camel_identifier(&name),
        name,
        region: resolve_region(spec.region.as_deref(), deployment_region),
        setting_name: spec.setting_name.clone(),
        permanent: spec.permanent,
        cors: spec.cors,
    }
}

fn resolve_queue(
    spec: &QueueSpec,
    deployment_name: &str,
    deployment_region: &str,
    environment: &mut BTreeMap<String, String>,
) -> ResolvedQueue {
    // Depth-first: the DLQ resolves before its parent so the parent's
    // redrive policy can reference the resolved DLQ name.
    let dead_letter_queue = spec
        .dead_letter_queue
        .as_ref()
        .map(|dlq| Box::new(resolve_queue(dlq, deployment_name, deployment_region, environment)));

    let name = resolve_name(spec.name.as_deref(), &spec.nametip, deployment_name);
    environment.insert(spec.setting_name.clone(), name.clone());
    ResolvedQueue {
        name_camel: camel_identifier(&name),
        name,
        region: resolve_region(spec.region.as_deref(), deployment_region),
        setting_name: spec.setting_name.clone(),
        permanent: spec.permanent,
        max_receive_count: spec.max_receive_count.unwrap_or(1),
        dead_letter_queue,
    }
}

fn resolve_topic(
    spec: &TopicSpec,
    deployment_name: &str,
    deployment_region: &str,
    environment: &mut BTreeMap<String, String>,
) -> ResolvedTopic {
    let name = resolve_name(spec.name.as_deref(), &spec.nametip, deployment_name);
    environment.insert(spec.setting_name.clone(), name.clone());
    ResolvedTopic {
        name_camel: camel_identifier(&name),
        name,
        region: resolve_region(spec.region.as_deref(), deployment_region),
        setting_name: spec.setting_name.clone(),
        permanent: spec.permanent,
        subscriptions: spec.subscriptions.clone(),
    }
}

fn resolve_tier(
    spec: &TierSpec,
    defaults: &TierSettings,
    deployment_name: &str,
    tier: &'static str,
) -> Result<ResolvedTier> {
    let merged = spec.settings.merged_over(defaults);
    let missing = |setting: &'static str| ConfigError::MissingTierSetting { tier, setting };

    Ok(ResolvedTier {
        env_name: format!("{deployment_name}-{}", spec.nametip),
        service_role: merged.service_role.ok_or_else(|| missing("service_role"))?,
        ssh_key_name: merged.ssh_key_name.ok_or_else(|| missing("ssh_key_name"))?,
        instance_type: merged.instance_type.ok_or_else(|| missing("instance_type"))?,
        security_groups: merged
            .security_groups
            .ok_or_else(|| missing("security_groups"))?,
        healthcheck_url: merged
            .healthcheck_url
            .ok_or_else(|| missing("healthcheck_url"))?,
        num_processes: merged.num_processes.ok_or_else(|| missing("num_processes"))?,
        num_threads: merged.num_threads.ok_or_else(|| missing("num_threads"))?,
        wsgi_path: merged.wsgi_path.ok_or_else(|| missing("wsgi_path"))?,
        minimum_instance_count: merged
            .minimum_instance_count
            .ok_or_else(|| missing("minimum_instance_count"))?,
        maximum_instance_count: merged
            .maximum_instance_count
            .ok_or_else(|| missing("maximum_instance_count"))?,
        receive_path: merged.receive_path,
    })
}
