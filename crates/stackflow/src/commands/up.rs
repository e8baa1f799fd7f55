use colored::Colorize;
use stackflow_cloud_aws::AwsContext;
use std::path::Path;

pub async fn handle(file: &Path, delta: &str, tag: &str) -> anyhow::Result<()> {
    let context = AwsContext::load().await;
    let plan = super::resolve_plan(file, delta, tag, &context).await?;

    println!(
        "{}",
        format!("▲ Bringing up {}", plan.deployment_name).bold()
    );

    super::orchestrator(&context).up(&plan).await?;

    println!();
    println!(
        "{}",
        format!("✓ Deployment {} is up", plan.deployment_name)
            .green()
            .bold()
    );
    Ok(())
}
