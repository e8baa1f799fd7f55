//! Shared AWS configuration context
//!
//! Loads the SDK configuration once and hands out per-service clients.
//! Resources may live outside the deployment region, so every client
//! constructor takes the region the call targets.

use aws_config::{BehaviorVersion, Region, SdkConfig};
use std::sync::Arc;

/// Shared AWS configuration for creating service clients.
#[derive(Clone)]
pub struct AwsContext {
    config: Arc<SdkConfig>,
}

impl AwsContext {
    /// Load credentials and settings from the environment, config
    /// files, and instance metadata.
    pub async fn load() -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest()).load().await;
        Self {
            config: Arc::new(config),
        }
    }

    pub fn sdk_config(&self) -> &SdkConfig {
        &self.config
    }

    pub fn s3_client(&self, region: &str) -> aws_sdk_s3::Client {
        let conf = aws_sdk_s3::config::Builder::from(self.sdk_config())
            .region(Region::new(region.to_string()))
            .build();
        aws_sdk_s3::Client::from_conf(conf)
    }

    pub fn sqs_client(&self, region: &str) -> aws_sdk_sqs::Client {
        let conf = aws_sdk_sqs::config::Builder::from(self.sdk_config())
            .region(Region::new(region.to_string()))
            .build();
        aws_sdk_sqs::Client::from_conf(conf)
    }

    pub fn sns_client(&self, region: &str) -> aws_sdk_sns::Client {
        let conf = aws_sdk_sns::config::Builder::from(self.sdk_config())
            .region(Region::new(region.to_string()))
            .build();
        aws_sdk_sns::Client::from_conf(conf)
    }

    pub fn rds_client(&self, region: &str) -> aws_sdk_rds::Client {
        let conf = aws_sdk_rds::config::Builder::from(self.sdk_config())
            .region(Region::new(region.to_string()))
            .build();
        aws_sdk_rds::Client::from_conf(conf)
    }

    pub fn iam_client(&self) -> aws_sdk_iam::Client {
        aws_sdk_iam::Client::new(self.sdk_config())
    }

    pub fn beanstalk_client(&self, region: &str) -> aws_sdk_elasticbeanstalk::Client {
        let conf = aws_sdk_elasticbeanstalk::config::Builder::from(self.sdk_config())
            .region(Region::new(region.to_string()))
            .build();
        aws_sdk_elasticbeanstalk::Client::from_conf(conf)
    }

    pub fn sts_client(&self) -> aws_sdk_sts::Client {
        aws_sdk_sts::Client::new(self.sdk_config())
    }
}

impl std::fmt::Debug for AwsContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsContext").finish_non_exhaustive()
    }
}
