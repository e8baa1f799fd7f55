pub mod down;
pub mod env;
pub mod up;

use crate::notify::ConsoleNotifier;
use stackflow_cloud::RetryPolicy;
use stackflow_cloud_aws::AwsContext;
use stackflow_core::{ResolvedPlan, StackConfig};
use stackflow_deploy::Orchestrator;
use std::path::Path;
use std::sync::Arc;

/// Load, select, and resolve the stack config for one delta and tag.
///
/// The account lookup is skipped for local deployments so `up`/`down`
/// against the "local" region never touch the network.
pub async fn resolve_plan(
    file: &Path,
    delta: &str,
    tag: &str,
    context: &AwsContext,
) -> anyhow::Result<ResolvedPlan> {
    let config: StackConfig = crate::stackfile::config_for(file, delta, tag)?;
    let account_id = if config.deployment_region.as_deref() == Some("local") {
        "local".to_string()
    } else {
        stackflow_cloud_aws::current_account_id(context).await?
    };
    let plan = stackflow_core::resolve(&config, &account_id)?;
    tracing::debug!(deployment_name = %plan.deployment_name, "plan resolved");
    Ok(plan)
}

pub fn orchestrator(context: &AwsContext) -> Orchestrator {
    let drivers = stackflow_cloud_aws::drivers(context, RetryPolicy::default());
    Orchestrator::new(drivers, Arc::new(ConsoleNotifier))
}
