use anyhow::bail;
use stackflow_cloud_aws::AwsContext;
use stackflow_core::{DeploymentTier, tier_environment};
use std::path::Path;

/// Print one tier's environment as shell export lines.
pub async fn handle(file: &Path, delta: &str, tag: &str, tier: &str) -> anyhow::Result<()> {
    let tier = match tier {
        "web" => DeploymentTier::Web,
        "worker" => DeploymentTier::Worker,
        other => bail!("unknown tier '{other}' (expected web or worker)"),
    };

    let context = AwsContext::load().await;
    let plan = super::resolve_plan(file, delta, tag, &context).await?;

    for (name, value) in tier_environment(&plan, tier) {
        println!("export {name}=\"{value}\"");
    }
    Ok(())
}
