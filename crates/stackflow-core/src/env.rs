//! Environment-variable surface of a resolved plan
//!
//! A deployed process bootstraps its configuration entirely from
//! environment variables. It can only know which variables belong to it
//! by being told their names ahead of time, so the manifest variable
//! ([`ENVIRONMENT_NAMES_VAR`]) always travels with the rest.

use crate::resolve::ResolvedPlan;
use std::collections::BTreeMap;

pub const APP_ID_VAR: &str = "STACKFLOW_APP_ID";
pub const DEPLOYMENT_DELTA_VAR: &str = "STACKFLOW_DEPLOYMENT_DELTA";
pub const DEPLOYMENT_TAG_VAR: &str = "STACKFLOW_DEPLOYMENT_TAG";
pub const DEPLOYMENT_REGION_VAR: &str = "STACKFLOW_DEPLOYMENT_REGION";
pub const DEPLOYMENT_TIER_VAR: &str = "STACKFLOW_DEPLOYMENT_TIER";
pub const SECRETS_BUCKET_VAR: &str = "STACKFLOW_SECRETS_BUCKET";
pub const RDS_INSTANCE_IDENTIFIER_VAR: &str = "STACKFLOW_RDS_INSTANCE_IDENTIFIER";
pub const ENVIRONMENT_NAMES_VAR: &str = "STACKFLOW_ENVIRONMENT_NAMES";

/// Deployment tier a process runs as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentTier {
    Web,
    Worker,
}

impl DeploymentTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeploymentTier::Web => "web",
            DeploymentTier::Worker => "worker",
        }
    }
}

/// Full environment for one tier: the plan's resource variables plus
/// the bootstrap variables a process needs before it can read anything
/// else.
pub fn tier_environment(plan: &ResolvedPlan, tier: DeploymentTier) -> BTreeMap<String, String> {
    let mut env = plan.environment.clone();
    env.insert(APP_ID_VAR.to_string(), plan.app_id.clone());
    env.insert(
        DEPLOYMENT_DELTA_VAR.to_string(),
        plan.deployment_delta.clone(),
    );
    env.insert(DEPLOYMENT_TAG_VAR.to_string(), plan.deployment_tag.clone());
    env.insert(
        DEPLOYMENT_REGION_VAR.to_string(),
        plan.deployment_region.clone(),
    );
    env.insert(DEPLOYMENT_TIER_VAR.to_string(), tier.as_str().to_string());
    if let Some(bucket) = &plan.secrets_bucket {
        env.insert(SECRETS_BUCKET_VAR.to_string(), bucket.clone());
    }
    env
}
