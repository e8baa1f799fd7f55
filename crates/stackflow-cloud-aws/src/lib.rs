//! StackFlow AWS drivers
//!
//! Implements every `stackflow-cloud` driver trait on the AWS SDK:
//! S3 buckets, SQS queues, SNS topics, RDS instances, IAM roles and
//! instance profiles, and Elastic Beanstalk environments. All drivers
//! share one loaded SDK configuration and one retry policy.

pub mod account;
pub mod beanstalk;
pub mod context;
pub mod error;
pub mod iam;
pub mod rds;
pub mod s3;
pub mod sns;
pub mod sqs;

pub use account::current_account_id;
pub use beanstalk::BeanstalkDriver;
pub use context::AwsContext;
pub use iam::IamDriver;
pub use rds::RdsDriver;
pub use s3::S3Driver;
pub use sns::{SnsDriver, TopicNotifier};
pub use sqs::SqsDriver;

use stackflow_cloud::{Drivers, RetryPolicy};
use std::sync::Arc;

/// Build the full driver set used by the orchestrator.
pub fn drivers(context: &AwsContext, retry: RetryPolicy) -> Drivers {
    Drivers {
        storage: Arc::new(S3Driver::new(context.clone(), retry.clone())),
        queues: Arc::new(SqsDriver::new(context.clone(), retry.clone())),
        topics: Arc::new(SnsDriver::new(context.clone())),
        database: Arc::new(RdsDriver::new(context.clone())),
        identity: Arc::new(IamDriver::new(context.clone(), retry.clone())),
        platform: Arc::new(BeanstalkDriver::new(context.clone(), retry)),
    }
}
