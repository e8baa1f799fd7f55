//! Deployment lifecycle orchestrator
//!
//! Sequences driver calls into an `up` plan and a `down` plan. Phases
//! run strictly in order; inside the parallel phase the three resource
//! groups (buckets, queues, topics) have no cross-dependencies and run
//! concurrently, while items inside a group provision sequentially in
//! declared order. Nothing is rolled back on failure; every driver
//! operation is idempotent, so re-running the lifecycle is the recovery
//! path.

use crate::error::{DeployError, Result};
use crate::options::tier_option_settings;
use crate::policy::{inline_policy_document, instance_trust_policy};
use chrono::Utc;
use serde_json::json;
use stackflow_cloud::arn::queue_arn;
use stackflow_cloud::{Drivers, Notifier};
use stackflow_core::{DeploymentTier, ResolvedPlan, ResolvedQueue};
use std::sync::Arc;
use std::time::Duration;

const DB_AVAILABLE: &str = "available";

pub struct Orchestrator {
    drivers: Drivers,
    notifier: Arc<dyn Notifier>,
    db_poll_interval: Duration,
}

impl Orchestrator {
    pub fn new(drivers: Drivers, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            drivers,
            notifier,
            db_poll_interval: Duration::from_secs(20),
        }
    }

    /// Override the database status poll interval (tests).
    pub fn with_db_poll_interval(mut self, interval: Duration) -> Self {
        self.db_poll_interval = interval;
        self
    }

    fn notify(&self, message: impl AsRef<str>) {
        self.notifier.notify(message.as_ref());
    }

    /// Provision every resource in the plan, in dependency order.
    pub async fn up(&self, plan: &ResolvedPlan) -> Result<()> {
        if plan.is_local() {
            self.notify("Running local; nothing to do.");
            return Ok(());
        }
        tracing::info!(deployment = %plan.deployment_name, "bringing deployment up");

        self.up_database(plan).await?;
        tokio::try_join!(
            self.up_buckets(plan),
            self.up_queues(plan),
            self.up_topics(plan)
        )?;
        self.up_identity(plan).await?;
        self.up_app_tiers(plan).await?;
        Ok(())
    }

    /// Tear the deployment down: consumers before producers.
    pub async fn down(&self, plan: &ResolvedPlan) -> Result<()> {
        if plan.is_local() {
            self.notify("Running local; nothing to do.");
            return Ok(());
        }
        tracing::info!(deployment = %plan.deployment_name, "tearing deployment down");

        tokio::try_join!(
            self.down_buckets(plan),
            self.down_queues(plan),
            self.down_topics(plan)
        )?;
        self.down_identity(plan).await?;
        self.down_app_tiers(plan).await?;
        self.down_database(plan).await?;
        Ok(())
    }

    async fn up_database(&self, plan: &ResolvedPlan) -> Result<()> {
        let Some(rds) = &plan.rds else {
            return Ok(());
        };

        self.notify(format!("Creating RDS instance {}", plan.deployment_name));
        self.drivers
            .database
            .restore_from_snapshot(
                &plan.deployment_region,
                &plan.deployment_name,
                &rds.snapshot_name,
                &rds.db_instance_type,
            )
            .await?;

        // Deliberate long-running wait: bounded interval, unbounded
        // total. A restore can take most of an hour.
        let started = tokio::time::Instant::now();
        loop {
            let status = self
                .drivers
                .database
                .instance_status(&plan.deployment_region, &plan.deployment_name)
                .await?;
            let elapsed = started.elapsed().as_secs();
            self.notify(format!(
                "{:02}:{:02} -- status: {status}",
                elapsed / 60,
                elapsed % 60
            ));
            if status == DB_AVAILABLE {
                break;
            }
            tokio::time::sleep(self.db_poll_interval).await;
        }

        self.drivers
            .database
            .modify_security_groups(
                &plan.deployment_region,
                &plan.deployment_name,
                &rds.security_groups,
            )
            .await?;
        self.notify(format!("RDS instance {} ready to go", plan.deployment_name));
        Ok(())
    }

    async fn up_buckets(&self, plan: &ResolvedPlan) -> Result<()> {
        for bucket in &plan.buckets {
            self.drivers
                .storage
                .ensure_bucket(&bucket.name, &bucket.region, None, bucket.cors)
                .await?;
            self.notify(format!("Bucket {} ready to go", bucket.name));
        }
        Ok(())
    }

    async fn up_queues(&self, plan: &ResolvedPlan) -> Result<()> {
        for queue in &plan.queues {
            // The DLQ exists before the parent so the parent's redrive
            // policy can point at it.
            let redrive_policy = match &queue.dead_letter_queue {
                Some(dlq) => {
                    self.drivers
                        .queues
                        .ensure_queue(&dlq.name, &queue.region, None, None)
                        .await?;
                    self.notify(format!("Queue {} ready to go", dlq.name));
                    Some(json!({
                        "deadLetterTargetArn":
                            queue_arn(&queue.region, &plan.account_id, &dlq.name),
                        "maxReceiveCount": dlq.max_receive_count,
                    }))
                }
                None => None,
            };

            self.drivers
                .queues
                .ensure_queue(&queue.name, &queue.region, None, redrive_policy.as_ref())
                .await?;
            self.notify(format!("Queue {} ready to go", queue.name));
        }
        Ok(())
    }

    async fn up_topics(&self, plan: &ResolvedPlan) -> Result<()> {
        for topic in &plan.topics {
            let topic_arn = self.drivers.topics.ensure_topic(&topic.name, &topic.region).await?;
            self.notify(format!("Topic {} ready to go", topic.name));

            for subscription in &topic.subscriptions {
                self.drivers
                    .topics
                    .subscribe(&topic_arn, &subscription.protocol, &subscription.endpoint)
                    .await?;
                self.notify(format!(
                    "Subscription {}: {} ready to go",
                    subscription.protocol, subscription.endpoint
                ));
            }
        }
        Ok(())
    }

    async fn up_identity(&self, plan: &ResolvedPlan) -> Result<()> {
        self.drivers
            .identity
            .ensure_role(
                &plan.role_name,
                &format!("{}-EC2InstanceProfilePolicy", plan.deployment_name),
                &inline_policy_document(plan),
                &instance_trust_policy(),
            )
            .await?;
        self.notify(format!("Role {} ready to go", plan.role_name));

        self.drivers
            .identity
            .ensure_instance_profile(&plan.instance_profile_name, &plan.role_name)
            .await?;
        self.notify(format!(
            "Instance Profile {} ready to go",
            plan.instance_profile_name
        ));
        Ok(())
    }

    async fn up_app_tiers(&self, plan: &ResolvedPlan) -> Result<()> {
        if plan.web.is_none() && plan.worker.is_none() {
            return Ok(());
        }
        let stack_name = plan
            .solution_stack_name
            .as_deref()
            .ok_or(DeployError::MissingSolutionStack)?;

        let version_label = format!(
            "{}-{}",
            plan.deployment_name,
            Utc::now().format("%y%m%d%H%M%S")
        );
        let source_bucket = format!(
            "elasticbeanstalk-{}-{}",
            plan.deployment_region, plan.account_id
        );
        self.drivers
            .platform
            .upload_source_bundle(
                &plan.deployment_region,
                &plan.app_id,
                &source_bucket,
                &version_label,
            )
            .await?;
        self.notify(format!("Uploaded source bundle {version_label}"));

        if let Some(web) = &plan.web {
            let settings = tier_option_settings(plan, DeploymentTier::Web, web)?;
            self.drivers
                .platform
                .create_environment(
                    &plan.deployment_region,
                    &plan.app_id,
                    &web.env_name,
                    &version_label,
                    stack_name,
                    &settings,
                    false,
                )
                .await?;
            self.notify(format!("Web environment {} is launching", web.env_name));
        }

        if let Some(worker) = &plan.worker {
            let settings = tier_option_settings(plan, DeploymentTier::Worker, worker)?;
            self.drivers
                .platform
                .create_environment(
                    &plan.deployment_region,
                    &plan.app_id,
                    &worker.env_name,
                    &version_label,
                    stack_name,
                    &settings,
                    true,
                )
                .await?;
            self.notify(format!("Worker environment {} is launching", worker.env_name));
        }
        Ok(())
    }

    async fn down_buckets(&self, plan: &ResolvedPlan) -> Result<()> {
        for bucket in &plan.buckets {
            if bucket.permanent {
                self.notify(format!("Keeping permanent bucket {}", bucket.name));
            } else {
                self.drivers.storage.destroy_bucket(&bucket.name).await?;
                self.notify(format!("Bucket {} is destroyed", bucket.name));
            }
        }
        Ok(())
    }

    async fn down_queue(&self, queue: &ResolvedQueue) -> Result<()> {
        if queue.permanent {
            self.notify(format!("Keeping permanent queue {}", queue.name));
        } else {
            self.drivers.queues.destroy_queue(&queue.name, &queue.region).await?;
            self.notify(format!("Queue {} is destroyed", queue.name));
        }
        Ok(())
    }

    async fn down_queues(&self, plan: &ResolvedPlan) -> Result<()> {
        for queue in &plan.queues {
            // Parent goes first; the DLQ outlives it so late redrives
            // have somewhere to land.
            self.down_queue(queue).await?;
            if let Some(dlq) = &queue.dead_letter_queue {
                self.down_queue(dlq).await?;
            }
        }
        Ok(())
    }

    async fn down_topics(&self, plan: &ResolvedPlan) -> Result<()> {
        for topic in &plan.topics {
            if topic.permanent {
                self.notify(format!("Keeping permanent topic {}", topic.name));
            } else {
                self.drivers
                    .topics
                    .destroy_topic(&topic.name, &topic.region, &plan.account_id)
                    .await?;
                self.notify(format!("Topic {} is destroyed", topic.name));
            }
        }
        Ok(())
    }

    async fn down_identity(&self, plan: &ResolvedPlan) -> Result<()> {
        self.drivers
            .identity
            .destroy_instance_profile(&plan.instance_profile_name)
            .await?;
        self.notify(format!(
            "Instance Profile {} is destroyed",
            plan.instance_profile_name
        ));

        self.drivers.identity.destroy_role(&plan.role_name).await?;
        self.notify(format!("Role {} is destroyed", plan.role_name));
        Ok(())
    }

    async fn down_app_tiers(&self, plan: &ResolvedPlan) -> Result<()> {
        if let Some(web) = &plan.web {
            self.drivers
                .platform
                .destroy_environment(&web.env_name, &plan.deployment_region)
                .await?;
            self.notify(format!("Web environment {} is terminating", web.env_name));
        }
        if let Some(worker) = &plan.worker {
            self.drivers
                .platform
                .destroy_environment(&worker.env_name, &plan.deployment_region)
                .await?;
            self.notify(format!("Worker environment {} is terminating", worker.env_name));
        }
        Ok(())
    }

    async fn down_database(&self, plan: &ResolvedPlan) -> Result<()> {
        if plan.rds.is_some() {
            self.drivers
                .database
                .delete_instance(&plan.deployment_region, &plan.deployment_name)
                .await?;
            self.notify(format!("RDS instance {} is destroyed", plan.deployment_name));
        }
        Ok(())
    }
}
