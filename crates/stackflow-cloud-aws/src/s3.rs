//! Object-storage driver (S3)

use crate::context::AwsContext;
use crate::error::{BUCKET_ALREADY_OWNED_BY_YOU, NO_SUCH_BUCKET, api_error, has_code};
use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{
    BucketLocationConstraint, CorsConfiguration, CorsRule, CreateBucketConfiguration, Delete,
    ObjectIdentifier,
};
use serde_json::Value;
use stackflow_cloud::{CloudError, ObjectStore, Result, RetryPolicy};
use std::path::Path;

pub struct S3Driver {
    context: AwsContext,
    retry: RetryPolicy,
}

impl S3Driver {
    pub fn new(context: AwsContext, retry: RetryPolicy) -> Self {
        Self { context, retry }
    }

    /// The default CORS rules attached when a bucket spec asks for CORS.
    fn default_cors() -> Result<CorsConfiguration> {
        let rule = CorsRule::builder()
            .allowed_headers("Authorization")
            .allowed_methods("GET")
            .allowed_origins("*")
            .max_age_seconds(3000)
            .build()
            .map_err(|e| CloudError::api(e.to_string()))?;
        CorsConfiguration::builder()
            .cors_rules(rule)
            .build()
            .map_err(|e| CloudError::api(e.to_string()))
    }
}

#[async_trait]
impl ObjectStore for S3Driver {
    async fn ensure_bucket(
        &self,
        name: &str,
        region: &str,
        policy: Option<&Value>,
        cors: bool,
    ) -> Result<()> {
        let client = self.context.s3_client(region);

        // us-east-1 rejects an explicit location constraint.
        let mut request = client.create_bucket().bucket(name);
        if region != "us-east-1" {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(region))
                    .build(),
            );
        }

        match request.send().await {
            Ok(_) => tracing::debug!(bucket = name, "bucket created"),
            Err(err) => {
                let err = err.into_service_error();
                if !has_code(&err, &[BUCKET_ALREADY_OWNED_BY_YOU]) {
                    return Err(api_error(err));
                }
                tracing::debug!(bucket = name, "bucket already owned");
            }
        }

        if cors {
            client
                .put_bucket_cors()
                .bucket(name)
                .cors_configuration(Self::default_cors()?)
                .send()
                .await
                .map_err(|e| api_error(e.into_service_error()))?;
        }

        if let Some(policy) = policy {
            let policy_json = serde_json::to_string(policy)?;
            self.retry
                .run("put_bucket_policy", || {
                    let client = client.clone();
                    let policy_json = policy_json.clone();
                    async move {
                        client
                            .put_bucket_policy()
                            .bucket(name)
                            .policy(policy_json)
                            .send()
                            .await
                            .map(|_| ())
                            .map_err(|e| api_error(e.into_service_error()))
                    }
                })
                .await?;
        }

        Ok(())
    }

    async fn destroy_bucket(&self, name: &str) -> Result<()> {
        let client = self.context.s3_client("us-east-1");

        // Drain the bucket first; a non-empty bucket cannot be deleted.
        loop {
            let listing = match client.list_objects_v2().bucket(name).send().await {
                Ok(listing) => listing,
                Err(err) => {
                    let err = err.into_service_error();
                    if has_code(&err, &[NO_SUCH_BUCKET]) {
                        return Ok(());
                    }
                    return Err(api_error(err));
                }
            };

            let contents = listing.contents();
            if contents.is_empty() {
                break;
            }

            let mut objects = Vec::with_capacity(contents.len());
            for object in contents {
                if let Some(key) = object.key() {
                    objects.push(
                        ObjectIdentifier::builder()
                            .key(key)
                            .build()
                            .map_err(|e| CloudError::api(e.to_string()))?,
                    );
                }
            }

            let delete = Delete::builder()
                .set_objects(Some(objects))
                .quiet(true)
                .build()
                .map_err(|e| CloudError::api(e.to_string()))?;
            client
                .delete_objects()
                .bucket(name)
                .delete(delete)
                .send()
                .await
                .map_err(|e| api_error(e.into_service_error()))?;
        }

        match client.delete_bucket().bucket(name).send().await {
            Ok(_) => Ok(()),
            Err(err) => {
                let err = err.into_service_error();
                if has_code(&err, &[NO_SUCH_BUCKET]) {
                    Ok(())
                } else {
                    Err(api_error(err))
                }
            }
        }
    }

    async fn bucket_region(&self, name: &str) -> Result<Option<String>> {
        let client = self.context.s3_client("us-east-1");
        match client.get_bucket_location().bucket(name).send().await {
            Ok(resp) => {
                // An empty location constraint means us-east-1.
                let region = resp
                    .location_constraint()
                    .map(|c| c.as_str().to_string())
                    .filter(|r| !r.is_empty())
                    .unwrap_or_else(|| "us-east-1".to_string());
                Ok(Some(region))
            }
            Err(err) => {
                let err = err.into_service_error();
                if has_code(&err, &[NO_SUCH_BUCKET]) {
                    Ok(None)
                } else {
                    Err(api_error(err))
                }
            }
        }
    }

    async fn upload_file(&self, path: &Path, bucket: &str, key: &str) -> Result<()> {
        let client = self.context.s3_client("us-east-1");
        self.retry
            .run("put_object", || {
                let client = client.clone();
                async move {
                    let body = ByteStream::from_path(path)
                        .await
                        .map_err(|e| CloudError::api(e.to_string()))?;
                    client
                        .put_object()
                        .bucket(bucket)
                        .key(key)
                        .body(body)
                        .send()
                        .await
                        .map(|_| ())
                        .map_err(|e| api_error(e.into_service_error()))
                }
            })
            .await
    }
}
