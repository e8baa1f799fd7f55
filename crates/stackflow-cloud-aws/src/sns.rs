//! Pub/sub driver (SNS)

use crate::context::AwsContext;
use crate::error::{TOPIC_NOT_FOUND, api_error, has_code};
use async_trait::async_trait;
use stackflow_cloud::arn::topic_arn;
use stackflow_cloud::{CloudError, Notifier, PubSub, Result};
use std::sync::Arc;

pub struct SnsDriver {
    context: AwsContext,
}

impl SnsDriver {
    pub fn new(context: AwsContext) -> Self {
        Self { context }
    }
}

#[async_trait]
impl PubSub for SnsDriver {
    async fn ensure_topic(&self, name: &str, region: &str) -> Result<String> {
        let client = self.context.sns_client(region);
        let resp = client
            .create_topic()
            .name(name)
            .send()
            .await
            .map_err(|e| api_error(e.into_service_error()))?;
        resp.topic_arn()
            .map(str::to_string)
            .ok_or_else(|| CloudError::api("create_topic returned no ARN"))
    }

    async fn destroy_topic(&self, name: &str, region: &str, account_id: &str) -> Result<()> {
        let client = self.context.sns_client(region);
        let arn = topic_arn(region, account_id, name);

        // Unsubscribe everything first; deleting the topic does not
        // remove pending subscriptions.
        let mut next_token: Option<String> = None;
        loop {
            let request = client
                .list_subscriptions_by_topic()
                .topic_arn(&arn)
                .set_next_token(next_token.clone());
            let resp = match request.send().await {
                Ok(resp) => resp,
                Err(err) => {
                    let err = err.into_service_error();
                    if has_code(&err, &[TOPIC_NOT_FOUND]) {
                        break;
                    }
                    return Err(api_error(err));
                }
            };

            for subscription in resp.subscriptions() {
                if let Some(sub_arn) = subscription.subscription_arn() {
                    // "PendingConfirmation" placeholders have no real ARN
                    if sub_arn.starts_with("arn:") {
                        client
                            .unsubscribe()
                            .subscription_arn(sub_arn)
                            .send()
                            .await
                            .map_err(|e| api_error(e.into_service_error()))?;
                    }
                }
            }

            next_token = resp.next_token().map(str::to_string);
            if next_token.is_none() {
                break;
            }
        }

        client
            .delete_topic()
            .topic_arn(&arn)
            .send()
            .await
            .map_err(|e| api_error(e.into_service_error()))?;
        Ok(())
    }

    async fn subscribe(&self, topic_arn: &str, protocol: &str, endpoint: &str) -> Result<()> {
        // ARN format: arn:aws:sns:{region}:{account}:{name}
        let region = topic_arn.split(':').nth(3).unwrap_or("us-east-1");
        let client = self.context.sns_client(region);
        client
            .subscribe()
            .topic_arn(topic_arn)
            .protocol(protocol)
            .endpoint(endpoint)
            .send()
            .await
            .map_err(|e| api_error(e.into_service_error()))?;
        Ok(())
    }

    async fn publish(&self, topic_arn: &str, subject: &str, message: &str) -> Result<()> {
        let region = topic_arn.split(':').nth(3).unwrap_or("us-east-1");
        let client = self.context.sns_client(region);
        client
            .publish()
            .topic_arn(topic_arn)
            .subject(subject)
            .message(message)
            .send()
            .await
            .map_err(|e| api_error(e.into_service_error()))?;
        Ok(())
    }
}

/// Notification sink backed by a pub/sub topic.
///
/// `notify` must not block the caller, so the publish is handed to a
/// background task; a failed publish is logged and dropped.
pub struct TopicNotifier {
    pubsub: Arc<dyn PubSub>,
    topic_arn: String,
    subject: String,
}

impl TopicNotifier {
    pub fn new(pubsub: Arc<dyn PubSub>, topic_arn: String, subject: String) -> Self {
        Self {
            pubsub,
            topic_arn,
            subject,
        }
    }
}

impl Notifier for TopicNotifier {
    fn notify(&self, message: &str) {
        let pubsub = Arc::clone(&self.pubsub);
        let topic_arn = self.topic_arn.clone();
        let subject = self.subject.clone();
        let message = message.to_string();
        tokio::spawn(async move {
            if let Err(err) = pubsub.publish(&topic_arn, &subject, &message).await {
                tracing::warn!(error = %err, "audit publish failed");
            }
        });
    }
}
