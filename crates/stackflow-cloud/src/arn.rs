//! Resource address helpers
//!
//! Resolved resource names are deterministic, so every address can be
//! derived without a describe call.

pub fn bucket_arn(bucket_name: &str) -> String {
    format!("arn:aws:s3:::{bucket_name}")
}

pub fn queue_arn(region: &str, account_id: &str, queue_name: &str) -> String {
    format!("arn:aws:sqs:{region}:{account_id}:{queue_name}")
}

pub fn queue_url(region: &str, account_id: &str, queue_name: &str) -> String {
    format!("https://sqs.{region}.amazonaws.com/{account_id}/{queue_name}")
}

pub fn topic_arn(region: &str, account_id: &str, topic_name: &str) -> String {
    format!("arn:aws:sns:{region}:{account_id}:{topic_name}")
}
