//! Application-tier driver (Elastic Beanstalk)

use crate::context::AwsContext;
use crate::error::{INVALID_PARAMETER_VALUE, api_error, has_code};
use crate::s3::S3Driver;
use async_trait::async_trait;
use aws_sdk_elasticbeanstalk::types::{ConfigurationOptionSetting, EnvironmentTier, S3Location, Tag};
use stackflow_cloud::{AppPlatform, CloudError, ObjectStore, OptionSetting, Result, RetryPolicy};
use tokio::process::Command;

pub struct BeanstalkDriver {
    context: AwsContext,
    retry: RetryPolicy,
}

impl BeanstalkDriver {
    pub fn new(context: AwsContext, retry: RetryPolicy) -> Self {
        Self { context, retry }
    }

    fn tier(worker: bool) -> EnvironmentTier {
        if worker {
            EnvironmentTier::builder().name("Worker").r#type("SQS/HTTP").build()
        } else {
            EnvironmentTier::builder().name("WebServer").r#type("Standard").build()
        }
    }

    /// Archive the current checkout's HEAD into a zip bundle.
    async fn archive_head(&self, bundle_path: &std::path::Path) -> Result<String> {
        let status = Command::new("git")
            .args(["archive", "-o"])
            .arg(bundle_path)
            .arg("HEAD")
            .status()
            .await?;
        if !status.success() {
            return Err(CloudError::CommandFailed(format!(
                "git archive exited with {status}"
            )));
        }

        let log = Command::new("git").args(["log", "-n", "1"]).output().await?;
        let description: String = String::from_utf8_lossy(&log.stdout)
            .chars()
            .take(200)
            .collect();
        Ok(description)
    }
}

#[async_trait]
impl AppPlatform for BeanstalkDriver {
    async fn upload_source_bundle(
        &self,
        region: &str,
        app_id: &str,
        source_bucket: &str,
        version_label: &str,
    ) -> Result<()> {
        let bundle_path = std::env::temp_dir().join(format!("{version_label}.zip"));
        let description = self.archive_head(&bundle_path).await?;

        let key = format!("{app_id}/{version_label}.zip");
        let store = S3Driver::new(self.context.clone(), self.retry.clone());
        let upload_result = store.upload_file(&bundle_path, source_bucket, &key).await;
        let _ = tokio::fs::remove_file(&bundle_path).await;
        upload_result?;

        let client = self.context.beanstalk_client(region);
        self.retry
            .run("create_application_version", || {
                let client = client.clone();
                let key = key.clone();
                let description = description.clone();
                async move {
                    client
                        .create_application_version()
                        .application_name(app_id)
                        .version_label(version_label)
                        .description(description)
                        .source_bundle(
                            S3Location::builder()
                                .s3_bucket(source_bucket)
                                .s3_key(key)
                                .build(),
                        )
                        .send()
                        .await
                        .map(|_| ())
                        .map_err(|e| api_error(e.into_service_error()))
                }
            })
            .await
    }

    async fn create_environment(
        &self,
        region: &str,
        app_id: &str,
        env_name: &str,
        version_label: &str,
        stack_name: &str,
        option_settings: &[OptionSetting],
        worker_tier: bool,
    ) -> Result<()> {
        let client = self.context.beanstalk_client(region);
        let settings: Vec<ConfigurationOptionSetting> = option_settings
            .iter()
            .map(|setting| {
                ConfigurationOptionSetting::builder()
                    .namespace(&setting.namespace)
                    .option_name(&setting.option_name)
                    .value(&setting.value)
                    .build()
            })
            .collect();

        self.retry
            .run("create_environment", || {
                let client = client.clone();
                let settings = settings.clone();
                async move {
                    client
                        .create_environment()
                        .application_name(app_id)
                        .environment_name(env_name)
                        .solution_stack_name(stack_name)
                        .version_label(version_label)
                        .set_option_settings(Some(settings))
                        .tier(Self::tier(worker_tier))
                        .tags(Tag::builder().key("stackflow").value(env_name).build())
                        .send()
                        .await
                        .map(|_| ())
                        .map_err(|e| api_error(e.into_service_error()))
                }
            })
            .await
    }

    async fn destroy_environment(&self, env_name: &str, region: &str) -> Result<()> {
        let client = self.context.beanstalk_client(region);
        match client
            .terminate_environment()
            .environment_name(env_name)
            .send()
            .await
        {
            Ok(_) => Ok(()),
            Err(err) => {
                let err = err.into_service_error();
                // Terminating an environment that is gone (or never
                // existed) reports InvalidParameterValue.
                if has_code(&err, &[INVALID_PARAMETER_VALUE]) {
                    Ok(())
                } else {
                    Err(api_error(err))
                }
            }
        }
    }
}
