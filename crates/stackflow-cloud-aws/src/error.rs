//! AWS error classification
//!
//! Maps SDK errors to `CloudError` by service error code rather than by
//! per-operation error types, so every driver can share one absorb/retry
//! decision table.

use aws_sdk_s3::error::ProvideErrorMetadata;
use stackflow_cloud::CloudError;

// Expected-benign codes the drivers absorb.
pub const NO_SUCH_BUCKET: &str = "NoSuchBucket";
pub const BUCKET_ALREADY_OWNED_BY_YOU: &str = "BucketAlreadyOwnedByYou";
pub const NON_EXISTENT_QUEUE: &str = "AWS.SimpleQueueService.NonExistentQueue";
pub const QUEUE_DELETED_RECENTLY: &str = "AWS.SimpleQueueService.QueueDeletedRecently";
pub const TOPIC_NOT_FOUND: &str = "NotFound";
pub const ENTITY_ALREADY_EXISTS: &str = "EntityAlreadyExists";
pub const NO_SUCH_ENTITY: &str = "NoSuchEntity";
pub const INVALID_PARAMETER_VALUE: &str = "InvalidParameterValue";

/// Convert any SDK error into a `CloudError`, preserving the service
/// error code when one is present.
///
/// `ProvideErrorMetadata` is the shared smithy trait; the `aws_sdk_s3`
/// re-export is the same trait every service crate uses.
pub fn api_error<E>(err: E) -> CloudError
where
    E: ProvideErrorMetadata + std::fmt::Debug,
{
    let code = err.code().map(str::to_string);
    let message = err
        .message()
        .map(str::to_string)
        .unwrap_or_else(|| format!("{err:?}"));
    CloudError::ApiError { code, message }
}

/// True when the error carries one of the given service codes.
pub fn has_code<E>(err: &E, codes: &[&str]) -> bool
where
    E: ProvideErrorMetadata,
{
    match err.code() {
        Some(code) => codes.contains(&code),
        None => false,
    }
}
