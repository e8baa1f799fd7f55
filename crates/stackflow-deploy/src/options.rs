//! Application-tier option settings
//!
//! Flattens the tier configuration into the platform's
//! namespace/option/value triples. The worker tier additionally binds
//! the task queue endpoint and the HTTP path task messages are posted
//! to.

use crate::error::{DeployError, Result};
use stackflow_cloud::OptionSetting;
use stackflow_cloud::arn::queue_url;
use stackflow_core::{DeploymentTier, ResolvedPlan, ResolvedTier, tier_environment};

/// Conventional nametip of the queue the worker tier consumes.
pub const TASK_QUEUE_NAMETIP: &str = "task-mq";

fn setting(namespace: &str, option_name: &str, value: impl Into<String>) -> OptionSetting {
    OptionSetting {
        namespace: namespace.to_string(),
        option_name: option_name.to_string(),
        value: value.into(),
    }
}

/// Build the option settings for one application tier.
pub fn tier_option_settings(
    plan: &ResolvedPlan,
    tier: DeploymentTier,
    resolved: &ResolvedTier,
) -> Result<Vec<OptionSetting>> {
    let mut settings = vec![
        setting(
            "aws:elasticbeanstalk:environment",
            "ServiceRole",
            &resolved.service_role,
        ),
        setting(
            "aws:autoscaling:launchconfiguration",
            "EC2KeyName",
            &resolved.ssh_key_name,
        ),
        setting(
            "aws:autoscaling:launchconfiguration",
            "IamInstanceProfile",
            &plan.instance_profile_name,
        ),
        setting(
            "aws:autoscaling:launchconfiguration",
            "InstanceType",
            &resolved.instance_type,
        ),
        setting(
            "aws:autoscaling:launchconfiguration",
            "SSHSourceRestriction",
            format!(
                "tcp,22,22,{}",
                resolved.security_groups.first().map(String::as_str).unwrap_or_default()
            ),
        ),
        setting(
            "aws:autoscaling:launchconfiguration",
            "SecurityGroups",
            resolved.security_groups.join(", "),
        ),
        setting(
            "aws:elasticbeanstalk:application",
            "Application Healthcheck URL",
            &resolved.healthcheck_url,
        ),
        setting(
            "aws:elasticbeanstalk:container:python",
            "NumProcesses",
            resolved.num_processes.to_string(),
        ),
        setting(
            "aws:elasticbeanstalk:container:python",
            "NumThreads",
            resolved.num_threads.to_string(),
        ),
        setting(
            "aws:elasticbeanstalk:container:python",
            "WSGIPath",
            &resolved.wsgi_path,
        ),
        setting(
            "aws:autoscaling:asg",
            "MinSize",
            resolved.minimum_instance_count.to_string(),
        ),
        setting(
            "aws:autoscaling:asg",
            "MaxSize",
            resolved.maximum_instance_count.to_string(),
        ),
    ];

    for (name, value) in tier_environment(plan, tier) {
        settings.push(setting(
            "aws:elasticbeanstalk:application:environment",
            &name,
            value,
        ));
    }

    if tier == DeploymentTier::Worker {
        let receive_path = resolved
            .receive_path
            .as_deref()
            .ok_or(DeployError::MissingReceivePath)?;
        let task_queue = format!("{}-{}", plan.deployment_name, TASK_QUEUE_NAMETIP);
        settings.push(setting(
            "aws:elasticbeanstalk:sqsd",
            "WorkerQueueURL",
            queue_url(&plan.deployment_region, &plan.account_id, &task_queue),
        ));
        settings.push(setting("aws:elasticbeanstalk:sqsd", "HttpPath", receive_path));
        settings.push(setting("aws:elasticbeanstalk:sqsd", "MimeType", "text/plain"));
    }

    Ok(settings)
}
