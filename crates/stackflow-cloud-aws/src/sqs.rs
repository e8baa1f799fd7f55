//! Message-queue driver (SQS)

use crate::context::AwsContext;
use crate::error::{NON_EXISTENT_QUEUE, api_error, has_code};
use async_trait::async_trait;
use aws_sdk_sqs::types::QueueAttributeName;
use serde_json::Value;
use stackflow_cloud::{MessageQueue, Result, RetryPolicy};

pub struct SqsDriver {
    context: AwsContext,
    retry: RetryPolicy,
}

impl SqsDriver {
    pub fn new(context: AwsContext, retry: RetryPolicy) -> Self {
        Self { context, retry }
    }
}

#[async_trait]
impl MessageQueue for SqsDriver {
    async fn ensure_queue(
        &self,
        name: &str,
        region: &str,
        queue_policy: Option<&Value>,
        redrive_policy: Option<&Value>,
    ) -> Result<()> {
        let client = self.context.sqs_client(region);
        let queue_policy = queue_policy.map(serde_json::to_string).transpose()?;
        let redrive_policy = redrive_policy.map(serde_json::to_string).transpose()?;

        // Recreating a queue that was just deleted fails for up to a
        // minute with QueueDeletedRecently; the retry loop rides that out.
        self.retry
            .run("create_queue", || {
                let client = client.clone();
                let queue_policy = queue_policy.clone();
                let redrive_policy = redrive_policy.clone();
                async move {
                    let mut request = client.create_queue().queue_name(name);
                    if let Some(policy) = queue_policy {
                        request = request.attributes(QueueAttributeName::Policy, policy);
                    }
                    if let Some(policy) = redrive_policy {
                        request = request.attributes(QueueAttributeName::RedrivePolicy, policy);
                    }
                    request
                        .send()
                        .await
                        .map(|_| ())
                        .map_err(|e| api_error(e.into_service_error()))
                }
            })
            .await
    }

    async fn destroy_queue(&self, name: &str, region: &str) -> Result<()> {
        let client = self.context.sqs_client(region);

        let queue_url = match client.get_queue_url().queue_name(name).send().await {
            Ok(resp) => match resp.queue_url() {
                Some(url) => url.to_string(),
                None => return Ok(()),
            },
            Err(err) => {
                let err = err.into_service_error();
                if has_code(&err, &[NON_EXISTENT_QUEUE]) {
                    return Ok(());
                }
                return Err(api_error(err));
            }
        };

        match client.delete_queue().queue_url(queue_url).send().await {
            Ok(_) => Ok(()),
            Err(err) => {
                let err = err.into_service_error();
                if has_code(&err, &[NON_EXISTENT_QUEUE]) {
                    Ok(())
                } else {
                    Err(api_error(err))
                }
            }
        }
    }

    async fn send_message(&self, queue_url: &str, body: &str, delay_seconds: u32) -> Result<()> {
        // The queue URL embeds its region; the client region only has
        // to be a valid one for request signing.
        let region = queue_url
            .strip_prefix("https://sqs.")
            .and_then(|rest| rest.split('.').next())
            .unwrap_or("us-east-1");
        let client = self.context.sqs_client(region);

        client
            .send_message()
            .queue_url(queue_url)
            .message_body(body)
            .delay_seconds(delay_seconds as i32)
            .send()
            .await
            .map(|_| ())
            .map_err(|e| api_error(e.into_service_error()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn region_is_parsed_from_the_queue_url() {
        let url = "https://sqs.eu-central-1.amazonaws.com/123456789012/x-d-t-jobs";
        let region = url
            .strip_prefix("https://sqs.")
            .and_then(|rest| rest.split('.').next())
            .unwrap();
        assert_eq!(region, "eu-central-1");
    }
}
