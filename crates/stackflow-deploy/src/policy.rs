//! IAM inline policy for the deployment's instance role
//!
//! The policy grants exactly the permissions implied by the resolved
//! bucket/queue/topic list, plus a fixed baseline: metric publishing,
//! the platform's own source buckets, the worker cron leader registry,
//! and read access to the deployment's secrets.

use serde_json::{Value, json};
use stackflow_cloud::arn::{bucket_arn, queue_arn, topic_arn};
use stackflow_core::ResolvedPlan;

/// Trust policy allowing compute instances to assume the role.
pub fn instance_trust_policy() -> Value {
    json!({
        "Version": "2012-10-17",
        "Statement": [
            {
                "Effect": "Allow",
                "Principal": {
                    "Service": "ec2.amazonaws.com"
                },
                "Action": "sts:AssumeRole"
            }
        ]
    })
}

/// Build the role's inline policy document from the resolved plan.
pub fn inline_policy_document(plan: &ResolvedPlan) -> Value {
    let mut statements = vec![
        json!({
            "Sid": "MetricsAccess",
            "Action": ["cloudwatch:PutMetricData"],
            "Effect": "Allow",
            "Resource": "*"
        }),
        json!({
            "Sid": "PlatformBucketAccess",
            "Action": ["s3:Get*", "s3:List*", "s3:PutObject"],
            "Effect": "Allow",
            "Resource": [
                "arn:aws:s3:::elasticbeanstalk-*",
                "arn:aws:s3:::elasticbeanstalk-*/*"
            ]
        }),
        json!({
            "Sid": "WorkerCronLeaderRegistry",
            "Action": [
                "dynamodb:BatchGetItem",
                "dynamodb:BatchWriteItem",
                "dynamodb:DeleteItem",
                "dynamodb:GetItem",
                "dynamodb:PutItem",
                "dynamodb:Query",
                "dynamodb:Scan",
                "dynamodb:UpdateItem"
            ],
            "Effect": "Allow",
            "Resource": [
                "arn:aws:dynamodb:*:*:table/*-stack-AWSEBWorkerCronLeaderRegistry*"
            ]
        }),
        json!({
            "Sid": "SecretsBucketAccess",
            "Effect": "Allow",
            "Action": "s3:GetObject",
            "Resource": format!("arn:aws:s3:::{}-secrets/*", plan.app_id)
        }),
    ];

    for bucket in &plan.buckets {
        let arn = bucket_arn(&bucket.name);
        statements.push(json!({
            "Sid": format!("BucketAccess{}", bucket.name_camel),
            "Effect": "Allow",
            "Action": "s3:*",
            "Resource": [arn.clone(), format!("{arn}/*")]
        }));
    }

    for queue in &plan.queues {
        statements.push(json!({
            "Sid": format!("QueueAccess{}", queue.name_camel),
            "Effect": "Allow",
            "Action": "sqs:*",
            "Resource": queue_arn(&queue.region, &plan.account_id, &queue.name)
        }));
        if let Some(dlq) = &queue.dead_letter_queue {
            statements.push(json!({
                "Sid": format!("QueueAccess{}", dlq.name_camel),
                "Effect": "Allow",
                "Action": "sqs:*",
                "Resource": queue_arn(&queue.region, &plan.account_id, &dlq.name)
            }));
        }
    }

    for topic in &plan.topics {
        statements.push(json!({
            "Sid": format!("TopicPublishAccess{}", topic.name_camel),
            "Effect": "Allow",
            "Action": "sns:Publish",
            "Resource": topic_arn(&topic.region, &plan.account_id, &topic.name)
        }));
    }

    json!({
        "Version": "2012-10-17",
        "Statement": statements
    })
}
